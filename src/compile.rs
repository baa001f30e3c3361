//! Backend-targeted compilation.
//!
//! Barriers are dropped and adjacent copies of the same self-inverse gate
//! cancel. Output buffer is built left to right; for each gate the last
//! instruction touching any of its qubits is its true predecessor on those
//! wires, so if that predecessor is the identical gate both can go. Passes
//! repeat until nothing changes.

use tracing::debug;

use crate::backend::Backend;
use crate::circuit::{Circuit, Instruction};
use crate::error::BackendError;

/// Rewrites `circuit` for `backend`. Measured outcomes are unchanged.
pub fn compile<B: Backend + ?Sized>(
    circuit: &Circuit,
    backend: &B,
) -> Result<Circuit, BackendError> {
    if circuit.num_qubits() > backend.max_qubits() {
        return Err(BackendError::CircuitTooLarge {
            backend: backend.name().to_string(),
            num_qubits: circuit.num_qubits(),
            max_qubits: backend.max_qubits(),
        });
    }

    let mut current = circuit
        .instructions()
        .iter()
        .filter(|inst| !matches!(inst, Instruction::Barrier))
        .cloned()
        .collect::<Vec<_>>();

    let mut passes = 0;
    loop {
        let (next, removed) = run_pass(&current);
        passes += 1;
        current = next;
        if removed == 0 {
            break;
        }
    }

    debug!(
        "Compiled for {}: {} -> {} instructions in {} passes",
        backend.name(),
        circuit.instructions().len(),
        current.len(),
        passes
    );

    let mut compiled = Circuit::new(circuit.num_qubits(), circuit.num_clbits());
    for inst in current {
        compiled.add_instruction(inst)?;
    }
    Ok(compiled)
}

fn run_pass(instructions: &[Instruction]) -> (Vec<Instruction>, usize) {
    let mut out: Vec<Instruction> = Vec::with_capacity(instructions.len());
    let mut removed = 0;

    for inst in instructions {
        if let Instruction::Gate(gate) = inst {
            let qubits = gate.qubits();
            let predecessor = out
                .iter()
                .rposition(|prev| prev.qubits().iter().any(|q| qubits.contains(q)));

            if let Some(pos) = predecessor {
                if gate.is_self_inverse() && out[pos] == *inst {
                    out.remove(pos);
                    removed += 2;
                    continue;
                }
            }
        }
        out.push(inst.clone());
    }

    (out, removed)
}
