//! Turning outcome tables into values and pictures.

use std::path::PathBuf;

use plotters::prelude::*;
use tracing::{info, warn};

use crate::counts::{Counts, Distribution};
use crate::error::{Error, Result};

pub const HISTOGRAM_FILE: &str = "bell_state_histogram.png";

/// Reads the measured register of a single-shot deterministic run.
///
/// Anything other than exactly one observed bit-string is an
/// [`Error::InconsistentResult`]; no outcome is guessed. A key that is not a
/// binary number of at most 64 bits is an [`Error::MalformedOutcome`].
pub fn single_outcome(dist: &Distribution) -> Result<u64> {
    let keys = dist.keys().collect::<Vec<_>>();
    match keys.as_slice() {
        [key] => {
            u64::from_str_radix(key, 2).map_err(|_| Error::MalformedOutcome(key.to_string()))
        }
        _ => Err(Error::InconsistentResult {
            outcomes: keys.iter().map(|k| k.to_string()).collect(),
        }),
    }
}

/// Cosmetic rendering of a count table. Has no effect on results.
pub trait HistogramRenderer {
    fn render(&self, counts: &Counts) -> anyhow::Result<()>;
}

/// Draws each renderer in turn, logging failures instead of returning them.
pub fn render_all(renderers: &[&dyn HistogramRenderer], counts: &Counts) {
    for renderer in renderers {
        if let Err(e) = renderer.render(counts) {
            warn!("Histogram rendering failed: {:#}", e);
        }
    }
}

/// Horizontal bars on stdout.
pub struct TextHistogram {
    width: usize,
}

impl TextHistogram {
    pub fn new(width: usize) -> Self {
        Self { width }
    }

    pub fn draw(&self, counts: &Counts) -> String {
        let max = counts.max_count();
        let total = counts.total();

        counts
            .iter()
            .map(|(key, count)| {
                let bar_len = if max == 0 {
                    0
                } else {
                    (count as usize * self.width) / max as usize
                };
                let percent = if total == 0 {
                    0.0
                } else {
                    count as f64 * 100.0 / total as f64
                };
                format!("{:>4} | {} {} ({:.1}%)\n", key, "█".repeat(bar_len), count, percent)
            })
            .collect()
    }
}

impl Default for TextHistogram {
    fn default() -> Self {
        Self::new(40)
    }
}

impl HistogramRenderer for TextHistogram {
    fn render(&self, counts: &Counts) -> anyhow::Result<()> {
        print!("{}", self.draw(counts));
        Ok(())
    }
}

/// Bar chart written to a bitmap file.
pub struct PngHistogram {
    path: PathBuf,
    size: (u32, u32),
}

impl PngHistogram {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: (640, 480),
        }
    }
}

impl HistogramRenderer for PngHistogram {
    fn render(&self, counts: &Counts) -> anyhow::Result<()> {
        if counts.is_empty() {
            warn!("Nothing to plot");
            return Ok(());
        }

        let keys = counts.keys().map(str::to_string).collect::<Vec<_>>();
        let y_max = counts.max_count() + counts.max_count() / 10 + 1;

        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Measurement outcomes", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(45)
            .build_cartesian_2d((0..keys.len()).into_segmented(), 0u64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc("Count")
            .x_desc("Outcome")
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => keys.get(*i).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(BLUE.filled())
                .margin(20)
                .data(counts.iter().enumerate().map(|(i, (_, count))| (i, count))),
        )?;

        root.present()?;
        info!("Histogram saved to {}", self.path.display());
        Ok(())
    }
}
