use ndarray::{Array1, Array2, ArrayView2};

pub struct MatrixHelper;

impl MatrixHelper {
    /// Multiply two 2D arrays.
    pub fn multiply(lhs: ArrayView2<f64>, rhs: ArrayView2<f64>) -> Array2<f64> {
        lhs.dot(&rhs)
    }

    /// Least-squares polynomial fit, coefficients lowest order first.
    /// Returns `None` when the normal equations are singular.
    pub fn polyfit(x: &[f64], y: &[f64], order: usize) -> Option<Vec<f64>> {
        let n_coeffs = order + 1;
        if x.len() != y.len() || x.len() < n_coeffs {
            return None;
        }
        let vandermonde =
            Array2::from_shape_fn((x.len(), n_coeffs), |(row, col)| x[row].powi(col as i32));
        let ata = Self::multiply(vandermonde.t(), vandermonde.view());
        let aty = vandermonde.t().dot(&Array1::from(y.to_vec()));
        Self::solve(ata, aty)
    }

    pub fn polyval(coeffs: &[f64], x: f64) -> f64 {
        coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    /// Gaussian elimination with partial pivoting.
    fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Vec<f64>> {
        let n = b.len();
        for col in 0..n {
            let pivot = (col..n).max_by(|&r1, &r2| {
                a[[r1, col]]
                    .abs()
                    .partial_cmp(&a[[r2, col]].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;
            if a[[pivot, col]].abs() < 1e-12 {
                return None;
            }
            if pivot != col {
                for k in 0..n {
                    a.swap([pivot, k], [col, k]);
                }
                b.swap(pivot, col);
            }
            for row in (col + 1)..n {
                let factor = a[[row, col]] / a[[col, col]];
                for k in col..n {
                    a[[row, k]] -= factor * a[[col, k]];
                }
                b[row] -= factor * b[col];
            }
        }
        let mut solution = vec![0.0; n];
        for row in (0..n).rev() {
            let tail: f64 = ((row + 1)..n).map(|k| a[[row, k]] * solution[k]).sum();
            solution[row] = (b[row] - tail) / a[[row, row]];
        }
        Some(solution)
    }
}
