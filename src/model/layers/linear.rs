use super::super::error::ModelError;
use ndarray::{s, Array1, Array2, ArrayView1};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::ops::Range;

/// An affine (fully-connected) layer: `y = b + x · W`
///
/// `weight` is `[input_dim, output_dim]`. Every output accumulates
/// sequentially in row order starting from its bias, so results are
/// bit-stable for a given build.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Linear {
    pub fn new<R: Rng>(input_dim: usize, output_dim: usize, std_dev: f32, rng: &mut R) -> Result<Self, ModelError> {
        let normal = Normal::new(0.0, std_dev).map_err(|e| {
            ModelError::InitializationError(e.to_string())
        })?;

        Ok(Self {
            weight: Array2::from_shape_fn((input_dim, output_dim), |_| normal.sample(&mut *rng)),
            bias: Array1::zeros(output_dim),
        })
    }

    pub fn from_parts(weight: Array2<f32>, bias: Array1<f32>) -> Result<Self, ModelError> {
        if weight.ncols() != bias.len() {
            return Err(ModelError::mismatch(
                "linear bias",
                &[weight.ncols()],
                bias.shape(),
            ));
        }
        Ok(Self { weight, bias })
    }

    pub fn input_dim(&self) -> usize {
        self.weight.nrows()
    }

    pub fn output_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn forward(&self, x: ArrayView1<f32>) -> Result<Array1<f32>, ModelError> {
        self.forward_concat(&[x])
    }

    /// Forward pass over the concatenation of `parts`, without materialising it.
    pub fn forward_concat(&self, parts: &[ArrayView1<f32>]) -> Result<Array1<f32>, ModelError> {
        self.forward_columns(parts, 0..self.output_dim())
    }

    /// Like [`Linear::forward_concat`] but only for the output columns in `cols`.
    pub fn forward_columns(
        &self,
        parts: &[ArrayView1<f32>],
        cols: Range<usize>,
    ) -> Result<Array1<f32>, ModelError> {
        let total: usize = parts.iter().map(|p| p.len()).sum();
        if total != self.input_dim() {
            return Err(ModelError::mismatch("linear input", &[self.input_dim()], &[total]));
        }
        if cols.end > self.output_dim() || cols.start > cols.end {
            return Err(ModelError::DimensionMismatch(format!(
                "column range {:?} outside output width {}",
                cols,
                self.output_dim()
            )));
        }

        let mut out = self.bias.slice(s![cols.clone()]).to_owned();
        let mut row = 0;
        for part in parts {
            for &xi in part.iter() {
                let w_row = self.weight.slice(s![row, cols.clone()]);
                for (acc, &w) in out.iter_mut().zip(w_row.iter()) {
                    *acc += xi * w;
                }
                row += 1;
            }
        }
        Ok(out)
    }

    pub fn is_finite(&self) -> bool {
        self.weight.iter().chain(self.bias.iter()).all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_linear_initialization() {
        let mut rng = StdRng::seed_from_u64(7);
        let linear = Linear::new(4, 3, 0.02, &mut rng).unwrap();

        assert_eq!(linear.weight.shape(), &[4, 3]);
        assert_eq!(linear.bias.shape(), &[3]);
        assert!(linear.bias.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_seeded_initialization_is_reproducible() {
        let a = Linear::new(5, 2, 0.1, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = Linear::new(5, 2, 0.1, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_forward_computation_known_weights() {
        let weight = array![[1.0, 2.0], [0.0, 1.0], [-1.0, 0.0]];
        let bias = array![0.5, -0.5];
        let linear = Linear::from_parts(weight, bias).unwrap();

        // y = [2, 3, 4] · [[1,2],[0,1],[-1,0]] + [0.5,-0.5] = [-1.5, 6.5]
        let output = linear.forward(array![2.0, 3.0, 4.0].view()).unwrap();

        assert_abs_diff_eq!(output[0], -1.5, epsilon = 1e-6);
        assert_abs_diff_eq!(output[1], 6.5, epsilon = 1e-6);
    }

    #[test]
    fn test_concat_matches_single_input() {
        let linear = Linear::new(5, 4, 0.5, &mut StdRng::seed_from_u64(11)).unwrap();
        let x = array![0.1, -0.2, 0.3];
        let h = array![0.7, -0.9];
        let joined = array![0.1, -0.2, 0.3, 0.7, -0.9];

        let split = linear.forward_concat(&[x.view(), h.view()]).unwrap();
        let whole = linear.forward(joined.view()).unwrap();

        assert_eq!(split, whole);
    }

    #[test]
    fn test_column_subset() {
        let linear = Linear::new(3, 6, 0.5, &mut StdRng::seed_from_u64(5)).unwrap();
        let x = array![1.0, 2.0, 3.0];

        let full = linear.forward(x.view()).unwrap();
        let tail = linear.forward_columns(&[x.view()], 4..6).unwrap();

        assert_eq!(tail, full.slice(s![4..6]).to_owned());
    }

    #[test]
    fn test_shape_errors() {
        let linear = Linear::new(3, 2, 0.1, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(matches!(
            linear.forward(array![1.0, 2.0].view()),
            Err(ModelError::DimensionMismatch(_))
        ));
        assert!(matches!(
            linear.forward_columns(&[array![1.0, 2.0, 3.0].view()], 1..3),
            Err(ModelError::DimensionMismatch(_))
        ));
        assert!(Linear::from_parts(Array2::zeros((2, 3)), Array1::zeros(2)).is_err());
    }
}
