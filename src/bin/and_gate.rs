use anyhow::Result;
use qlogic_demos::{
    experiments::{and_gate_circuit, compare_and_gate},
    Sampler, StatevectorSimulator,
};
use tracing::Level;

const SEPARATOR: &str = "----------------------------------------";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let sampler = Sampler::new(StatevectorSimulator::new());

    println!("--- Classical vs. Quantum Simulation ---");
    println!("{}", SEPARATOR);

    for comparison in compare_and_gate(&sampler)? {
        println!("Input: ({}, {})", comparison.a, comparison.b);
        println!("  Classical Result: {}", comparison.classical);
        println!("  Quantum Result:   {}", comparison.quantum);
        println!("{}", SEPARATOR);
    }

    println!("\nExample Quantum Circuit for (1, 1):");
    println!("{}", and_gate_circuit(1, 1)?);

    Ok(())
}
