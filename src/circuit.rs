use std::collections::BTreeMap;
use std::fmt::Display;

use nalgebra_sparse::csr::CsrMatrix;

use crate::error::CircuitError;
use crate::gates::{h_matrix, kronecker_product, one_projector, x_matrix, zero_projector};
use crate::Qbit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    H,
    X,
}

impl GateKind {
    fn matrix(&self) -> CsrMatrix<Qbit> {
        match self {
            GateKind::H => h_matrix(),
            GateKind::X => x_matrix(),
        }
    }

    fn label(&self) -> char {
        match self {
            GateKind::H => 'H',
            GateKind::X => 'X',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateIndex {
    One(usize),
    Control { controls: Vec<usize>, target: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    pub kind: GateKind,
    pub index: GateIndex,
}

impl Gate {
    /// Qubits the gate acts on, controls first and target last.
    pub fn qubits(&self) -> Vec<usize> {
        match &self.index {
            GateIndex::One(qubit) => vec![*qubit],
            GateIndex::Control { controls, target } => {
                let mut qubits = controls.clone();
                qubits.push(*target);
                qubits
            }
        }
    }

    /// Lower-case name, e.g. `x`, `cx` or `ccx`.
    pub fn name(&self) -> String {
        let num_controls = match &self.index {
            GateIndex::One(_) => 0,
            GateIndex::Control { controls, .. } => controls.len(),
        };
        format!(
            "{}{}",
            "c".repeat(num_controls),
            self.kind.label().to_ascii_lowercase()
        )
    }

    /// Every gate in this crate is its own inverse.
    pub fn is_self_inverse(&self) -> bool {
        matches!(self.kind, GateKind::H | GateKind::X)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Gate(Gate),
    /// Ordering fence, identity for every executor.
    Barrier,
    Measure { qubit: usize, clbit: usize },
}

impl Instruction {
    pub fn name(&self) -> String {
        match self {
            Instruction::Gate(gate) => gate.name(),
            Instruction::Barrier => "barrier".to_string(),
            Instruction::Measure { .. } => "measure".to_string(),
        }
    }

    /// Qubits touched by the instruction. Barriers span the whole register
    /// and report none here.
    pub fn qubits(&self) -> Vec<usize> {
        match self {
            Instruction::Gate(gate) => gate.qubits(),
            Instruction::Barrier => Vec::new(),
            Instruction::Measure { qubit, .. } => vec![*qubit],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    instructions: Vec<Instruction>,
    num_qubits: usize,
    num_clbits: usize,
}

impl Circuit {
    pub fn new(num_qubits: usize, num_clbits: usize) -> Self {
        Self {
            instructions: Vec::new(),
            num_qubits,
            num_clbits,
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn num_clbits(&self) -> usize {
        self.num_clbits
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    fn check_qubit(&self, index: usize) -> Result<(), CircuitError> {
        if index >= self.num_qubits {
            return Err(CircuitError::QubitOutOfRange {
                index,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    fn check_clbit(&self, index: usize) -> Result<(), CircuitError> {
        if index >= self.num_clbits {
            return Err(CircuitError::ClbitOutOfRange {
                index,
                num_clbits: self.num_clbits,
            });
        }
        let already_measured = self
            .instructions
            .iter()
            .any(|inst| matches!(inst, Instruction::Measure { clbit, .. } if *clbit == index));
        if already_measured {
            return Err(CircuitError::ClbitAlreadyMeasured(index));
        }
        Ok(())
    }

    /// Validates the register indices of `instruction` and appends it.
    pub fn add_instruction(&mut self, instruction: Instruction) -> Result<(), CircuitError> {
        match &instruction {
            Instruction::Gate(gate) => {
                let qubits = gate.qubits();
                for (i, &qubit) in qubits.iter().enumerate() {
                    self.check_qubit(qubit)?;
                    if qubits[..i].contains(&qubit) {
                        return Err(CircuitError::DuplicateQubit(qubit));
                    }
                }
            }
            Instruction::Barrier => {}
            Instruction::Measure { qubit, clbit } => {
                self.check_qubit(*qubit)?;
                self.check_clbit(*clbit)?;
            }
        }

        self.instructions.push(instruction);
        Ok(())
    }

    pub fn add_gate(&mut self, kind: GateKind, index: usize) -> Result<(), CircuitError> {
        self.add_instruction(Instruction::Gate(Gate {
            kind,
            index: GateIndex::One(index),
        }))
    }

    pub fn add_control(
        &mut self,
        controls: &[usize],
        target: usize,
        kind: GateKind,
    ) -> Result<(), CircuitError> {
        self.add_instruction(Instruction::Gate(Gate {
            kind,
            index: GateIndex::Control {
                controls: controls.to_vec(),
                target,
            },
        }))
    }

    pub fn add_barrier(&mut self) {
        self.instructions.push(Instruction::Barrier);
    }

    pub fn add_measure(&mut self, qubit: usize, clbit: usize) -> Result<(), CircuitError> {
        self.add_instruction(Instruction::Measure { qubit, clbit })
    }

    pub fn h(mut self, index: usize) -> Result<Self, CircuitError> {
        self.add_gate(GateKind::H, index)?;
        Ok(self)
    }

    pub fn x(mut self, index: usize) -> Result<Self, CircuitError> {
        self.add_gate(GateKind::X, index)?;
        Ok(self)
    }

    pub fn cnot(mut self, control: usize, target: usize) -> Result<Self, CircuitError> {
        self.add_control(&[control], target, GateKind::X)?;
        Ok(self)
    }

    pub fn toffoli(
        mut self,
        control1: usize,
        control2: usize,
        target: usize,
    ) -> Result<Self, CircuitError> {
        self.add_control(&[control1, control2], target, GateKind::X)?;
        Ok(self)
    }

    pub fn barrier(mut self) -> Self {
        self.add_barrier();
        self
    }

    pub fn measure(mut self, qubit: usize, clbit: usize) -> Result<Self, CircuitError> {
        self.add_measure(qubit, clbit)?;
        Ok(self)
    }

    /// Number of instructions of each kind, keyed by instruction name.
    pub fn count_ops(&self) -> BTreeMap<String, usize> {
        let mut ops = BTreeMap::new();
        for inst in &self.instructions {
            *ops.entry(inst.name()).or_insert(0) += 1;
        }
        ops
    }

    fn wire_position(&self, qubit: usize) -> usize {
        self.num_qubits - 1 - qubit
    }

    /// Full-register operator of a gate. Indices were checked when the gate
    /// was added.
    pub fn operator(&self, gate: &Gate) -> CsrMatrix<Qbit> {
        match &gate.index {
            GateIndex::One(index) => self.build_single_matrix(*index, &gate.kind.matrix()),
            GateIndex::Control { controls, target } => {
                self.build_control_matrix(controls, *target, &gate.kind.matrix())
            }
        }
    }

    fn build_single_matrix(&self, index: usize, gate: &CsrMatrix<Qbit>) -> CsrMatrix<Qbit> {
        let position = self.wire_position(index);

        let mut matrix = CsrMatrix::identity(1);
        for i in 0..self.num_qubits {
            if i == position {
                matrix = kronecker_product(&matrix, gate);
            } else {
                matrix = kronecker_product(&matrix, &CsrMatrix::identity(2));
            }
        }
        matrix
    }

    /// Sums one term per assignment of the control qubits: |p><p| on the
    /// controls, and `gate` on the target only when every control is |1>.
    fn build_control_matrix(
        &self,
        controls: &[usize],
        target: usize,
        gate: &CsrMatrix<Qbit>,
    ) -> CsrMatrix<Qbit> {
        let controls = controls
            .iter()
            .map(|&c| self.wire_position(c))
            .collect::<Vec<_>>();
        let target = self.wire_position(target);
        let all_ones = (1_usize << controls.len()) - 1;

        let zero_zero = zero_projector();
        let one_one = one_projector();
        let id = CsrMatrix::identity(2);

        let dim = 1_usize << self.num_qubits;
        let mut result = CsrMatrix::zeros(dim, dim);
        for pattern in 0..=all_ones {
            let mut term = CsrMatrix::identity(1);
            for i in 0..self.num_qubits {
                if let Some(c) = controls.iter().position(|&pos| pos == i) {
                    if (pattern >> c) & 1 == 1 {
                        term = kronecker_product(&term, &one_one);
                    } else {
                        term = kronecker_product(&term, &zero_zero);
                    }
                } else if i == target && pattern == all_ones {
                    term = kronecker_product(&term, gate);
                } else {
                    term = kronecker_product(&term, &id);
                }
            }
            result = result + term;
        }
        result
    }
}

const QUBIT_WIRE: char = '─';
const CLBIT_WIRE: char = '═';

impl Display for Circuit {
    /// Text diagram: one row per qubit then one per classical bit, one
    /// column per instruction.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut rows = (0..self.num_qubits)
            .map(|i| format!("q_{}: ", i))
            .chain((0..self.num_clbits).map(|i| format!("c_{}: ", i)))
            .collect::<Vec<_>>();
        let label_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        for row in rows.iter_mut() {
            while row.chars().count() < label_width {
                row.insert(row.len() - 2, ' ');
            }
        }

        for inst in &self.instructions {
            let mut cells = (0..self.num_qubits)
                .map(|_| QUBIT_WIRE)
                .chain((0..self.num_clbits).map(|_| CLBIT_WIRE))
                .collect::<Vec<_>>();

            match inst {
                Instruction::Gate(gate) => match &gate.index {
                    GateIndex::One(index) => cells[*index] = gate.kind.label(),
                    GateIndex::Control { controls, target } => {
                        let qubits = gate.qubits();
                        let lo = qubits.iter().copied().min().unwrap_or(*target);
                        let hi = qubits.iter().copied().max().unwrap_or(*target);
                        for cell in cells.iter_mut().take(hi).skip(lo + 1) {
                            *cell = '┼';
                        }
                        for &c in controls {
                            cells[c] = '■';
                        }
                        cells[*target] = match gate.kind {
                            GateKind::X => '⊕',
                            kind => kind.label(),
                        };
                    }
                },
                Instruction::Barrier => {
                    for cell in cells.iter_mut().take(self.num_qubits) {
                        *cell = '░';
                    }
                }
                Instruction::Measure { qubit, clbit } => {
                    for cell in cells.iter_mut().take(self.num_qubits).skip(qubit + 1) {
                        *cell = '╫';
                    }
                    for cell in cells
                        .iter_mut()
                        .skip(self.num_qubits)
                        .take(*clbit)
                    {
                        *cell = '╬';
                    }
                    cells[*qubit] = 'M';
                    cells[self.num_qubits + clbit] = '╩';
                }
            }

            for (i, (row, cell)) in rows.iter_mut().zip(cells).enumerate() {
                let wire = if i < self.num_qubits {
                    QUBIT_WIRE
                } else {
                    CLBIT_WIRE
                };
                let pad = if cell == '░' { ' ' } else { wire };
                row.push(pad);
                row.push(cell);
                row.push(pad);
            }
        }

        for row in rows {
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::assert_approx_complex_eq;
    use crate::qstate::QState;

    fn apply(circuit: &Circuit, state: &mut QState) {
        for inst in circuit.instructions() {
            if let Instruction::Gate(gate) = inst {
                state.apply_operator(&circuit.operator(gate));
            }
        }
    }

    #[test]
    fn test_bell_state() -> Result<()> {
        let circuit = Circuit::new(2, 0).h(0)?.cnot(0, 1)?;
        let mut state = QState::zero_state(2);
        apply(&circuit, &mut state);

        // Bell state |00> + |11>
        assert_approx_complex_eq!(1.0 / 2f64.sqrt(), 0.0, state.state[0]);
        assert_approx_complex_eq!(0.0, 0.0, state.state[1]);
        assert_approx_complex_eq!(0.0, 0.0, state.state[2]);
        assert_approx_complex_eq!(1.0 / 2f64.sqrt(), 0.0, state.state[3]);

        Ok(())
    }

    #[test]
    fn test_x_flips_little_endian_bit() -> Result<()> {
        let circuit = Circuit::new(3, 0).x(1)?;
        let mut state = QState::zero_state(3);
        apply(&circuit, &mut state);

        assert_approx_complex_eq!(1.0, 0.0, state.state[0b010]);

        Ok(())
    }

    #[test]
    fn test_toffoli_truth_table() -> Result<()> {
        for basis in 0..8_usize {
            let circuit = Circuit::new(3, 0).toffoli(0, 1, 2)?;
            let mut state = QState::from_str(&format!("{:03b}", basis))?;
            apply(&circuit, &mut state);

            let expected = if basis & 0b011 == 0b011 {
                basis ^ 0b100
            } else {
                basis
            };
            assert_approx_complex_eq!(1.0, 0.0, state.state[expected]);
        }

        Ok(())
    }

    #[test]
    fn test_cnot_with_control_above_target() -> Result<()> {
        // control on qubit 2, target on qubit 0: |100> -> |101>
        let circuit = Circuit::new(3, 0).cnot(2, 0)?;
        let mut state = QState::from_str("100")?;
        apply(&circuit, &mut state);

        assert_approx_complex_eq!(1.0, 0.0, state.state[0b101]);

        Ok(())
    }

    #[test]
    fn test_out_of_range_indices_are_rejected() {
        assert_eq!(
            Err(CircuitError::QubitOutOfRange {
                index: 2,
                num_qubits: 2
            }),
            Circuit::new(2, 2).h(2)
        );
        assert_eq!(
            Err(CircuitError::ClbitOutOfRange {
                index: 1,
                num_clbits: 1
            }),
            Circuit::new(2, 1).measure(0, 1)
        );
    }

    #[test]
    fn test_duplicate_qubit_is_rejected() {
        assert_eq!(
            Err(CircuitError::DuplicateQubit(1)),
            Circuit::new(3, 0).toffoli(1, 1, 2)
        );
        assert_eq!(
            Err(CircuitError::DuplicateQubit(0)),
            Circuit::new(2, 0).cnot(0, 0)
        );
    }

    #[test]
    fn test_clbit_measured_twice_is_rejected() -> Result<()> {
        let circuit = Circuit::new(2, 1).measure(0, 0)?;
        assert_eq!(
            Err(CircuitError::ClbitAlreadyMeasured(0)),
            circuit.measure(1, 0)
        );
        Ok(())
    }

    #[test]
    fn test_count_ops() -> Result<()> {
        let circuit = Circuit::new(3, 1)
            .x(0)?
            .x(1)?
            .barrier()
            .toffoli(0, 1, 2)?
            .barrier()
            .measure(2, 0)?;

        let ops = circuit.count_ops();
        assert_eq!(Some(&2), ops.get("x"));
        assert_eq!(Some(&1), ops.get("ccx"));
        assert_eq!(Some(&2), ops.get("barrier"));
        assert_eq!(Some(&1), ops.get("measure"));
        assert_eq!(4, ops.len());

        Ok(())
    }

    #[test]
    fn test_display_bell_circuit() -> Result<()> {
        let circuit = Circuit::new(2, 2)
            .h(0)?
            .cnot(0, 1)?
            .measure(0, 0)?
            .measure(1, 1)?;

        let text = circuit.to_string();
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(4, lines.len());
        assert_eq!("q_0: ─H──■──M────", lines[0]);
        assert_eq!("q_1: ────⊕──╫──M─", lines[1]);
        assert_eq!("c_0: ═══════╩══╬═", lines[2]);
        assert_eq!("c_1: ══════════╩═", lines[3]);

        Ok(())
    }
}
