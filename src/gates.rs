use nalgebra::Matrix2;
use nalgebra_sparse::convert::serial::convert_dense_coo;
use nalgebra_sparse::{coo::CooMatrix, csr::CsrMatrix};
use num_complex::Complex;

use crate::Qbit;

pub fn h_matrix() -> CsrMatrix<Qbit> {
    let root2 = 2.0_f64.sqrt();
    let one = Complex::new(1.0, 0.0);
    let hadamard_coo = convert_dense_coo(&Matrix2::from_row_slice(&[
        one / root2,
        one / root2,
        one / root2,
        -one / root2,
    ]));
    CsrMatrix::from(&hadamard_coo)
}

pub fn x_matrix() -> CsrMatrix<Qbit> {
    let mut x_coo = CooMatrix::new(2, 2);
    x_coo.push(0, 1, Complex::new(1.0, 0.0));
    x_coo.push(1, 0, Complex::new(1.0, 0.0));
    CsrMatrix::from(&x_coo)
}

/// |0><0|
pub fn zero_projector() -> CsrMatrix<Qbit> {
    let mut coo = CooMatrix::new(2, 2);
    coo.push(0, 0, Complex::new(1.0, 0.0));
    CsrMatrix::from(&coo)
}

/// |1><1|
pub fn one_projector() -> CsrMatrix<Qbit> {
    let mut coo = CooMatrix::new(2, 2);
    coo.push(1, 1, Complex::new(1.0, 0.0));
    CsrMatrix::from(&coo)
}

pub fn kronecker_product(x: &CsrMatrix<Qbit>, y: &CsrMatrix<Qbit>) -> CsrMatrix<Qbit> {
    let mut result = CooMatrix::new(x.nrows() * y.nrows(), x.ncols() * y.ncols());

    for (rx, cx, value_x) in x.triplet_iter() {
        for (ry, cy, value_y) in y.triplet_iter() {
            let new_row = rx * y.nrows() + ry;
            let new_col = cx * y.ncols() + cy;
            let new_value = value_x * value_y;
            result.push(new_row, new_col, new_value);
        }
    }

    CsrMatrix::from(&result)
}
