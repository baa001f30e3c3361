use anyhow::Result;
use qlogic_demos::{
    experiments::{run_bell_state, BELL_SHOTS},
    report::{render_all, HistogramRenderer, PngHistogram, TextHistogram, HISTOGRAM_FILE},
    StatevectorSimulator,
};
use tracing::Level;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let simulator = StatevectorSimulator::new();
    let report = run_bell_state(&simulator, BELL_SHOTS)?;

    println!("\nQuantum Circuit:");
    println!("{}", report.circuit);
    println!("\nSimulation Results:");
    println!("{}", report.counts);
    println!();

    let text = TextHistogram::default();
    let png = PngHistogram::new(HISTOGRAM_FILE);
    let renderers: [&dyn HistogramRenderer; 2] = [&text, &png];
    render_all(&renderers, &report.counts);

    Ok(())
}
