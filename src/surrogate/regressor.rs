// src/surrogate/regressor.rs - Random-feature ridge regression
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegressorError {
    #[error("Training set is empty")]
    EmptyTrainingSet,
    #[error("Inputs have {inputs} rows but targets have {targets}")]
    RowMismatch { inputs: usize, targets: usize },
    #[error("Expected {expected} input features, got {actual}")]
    Dimension { expected: usize, actual: usize },
    #[error("Ridge system is not positive definite")]
    NotPositiveDefinite,
}

/// Hyperparameters for [`RandomFeatureRegressor::fit`].
#[derive(Debug, Clone, Copy)]
pub struct RegressorParams {
    pub hidden_units: usize,
    pub ridge: f64,
    pub seed: u64,
}

/// Per-column affine normalization to zero mean and unit variance.
#[derive(Debug, Clone)]
struct Standardizer {
    mean: DVector<f64>,
    scale: DVector<f64>,
}

impl Standardizer {
    fn fit(data: &DMatrix<f64>) -> Self {
        let n = data.nrows() as f64;
        let mean = DVector::from_fn(data.ncols(), |j, _| data.column(j).mean());
        let scale = DVector::from_fn(data.ncols(), |j, _| {
            let m = mean[j];
            let var = data.column(j).iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
            // Constant columns pass through unscaled
            if var.sqrt() > 1e-12 { var.sqrt() } else { 1.0 }
        });
        Self { mean, scale }
    }

    fn apply(&self, x: &DVector<f64>) -> DVector<f64> {
        (x - &self.mean).component_div(&self.scale)
    }

    fn invert(&self, z: &DVector<f64>) -> DVector<f64> {
        z.component_mul(&self.scale) + &self.mean
    }
}

/// Single hidden layer with fixed random weights and a trained linear read-out.
///
/// Hidden weights are Xavier-uniform and never updated; only the read-out is
/// fitted, in closed form, by solving `(ΦᵀΦ + λnI) W = ΦᵀY` with a Cholesky
/// factorization. Inputs and targets are standardized internally.
#[derive(Debug, Clone)]
pub struct RandomFeatureRegressor {
    inputs: Standardizer,
    outputs: Standardizer,
    hidden_weights: DMatrix<f64>,
    hidden_bias: DVector<f64>,
    readout: DMatrix<f64>,
}

impl RandomFeatureRegressor {
    /// Fit on `inputs` (`n × d`) and `targets` (`n × m`).
    pub fn fit(inputs: &DMatrix<f64>, targets: &DMatrix<f64>, params: RegressorParams) -> Result<Self, RegressorError> {
        let n = inputs.nrows();
        if n == 0 {
            return Err(RegressorError::EmptyTrainingSet);
        }
        if targets.nrows() != n {
            return Err(RegressorError::RowMismatch {
                inputs: n,
                targets: targets.nrows(),
            });
        }

        let d = inputs.ncols();
        let h = params.hidden_units.max(1);
        let mut rng = StdRng::seed_from_u64(params.seed);

        // Xavier initialization
        let limit = (6.0 / (d + h) as f64).sqrt();
        let hidden_weights = DMatrix::from_fn(h, d, |_, _| rng.random_range(-limit..=limit));
        let hidden_bias = DVector::from_fn(h, |_, _| rng.random_range(-1.0..=1.0));

        let mut model = Self {
            inputs: Standardizer::fit(inputs),
            outputs: Standardizer::fit(targets),
            hidden_weights,
            hidden_bias,
            readout: DMatrix::zeros(targets.ncols(), h + 1),
        };

        let mut phi = DMatrix::<f64>::zeros(n, h + 1);
        let mut y = DMatrix::<f64>::zeros(n, targets.ncols());
        for i in 0..n {
            let z = model.inputs.apply(&inputs.row(i).transpose());
            phi.set_row(i, &model.features(&z).transpose());
            y.set_row(i, &model.outputs.apply(&targets.row(i).transpose()).transpose());
        }

        let mut gram = phi.tr_mul(&phi);
        for k in 0..=h {
            gram[(k, k)] += params.ridge * n as f64;
        }
        let rhs = phi.tr_mul(&y);
        let cholesky = gram.cholesky().ok_or(RegressorError::NotPositiveDefinite)?;
        model.readout = cholesky.solve(&rhs).transpose();
        Ok(model)
    }

    pub fn input_dim(&self) -> usize {
        self.hidden_weights.ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.readout.nrows()
    }

    /// Hidden activations plus a constant bias feature.
    fn features(&self, z: &DVector<f64>) -> DVector<f64> {
        let activation = &self.hidden_weights * z + &self.hidden_bias;
        DVector::from_iterator(
            activation.len() + 1,
            activation.iter().map(|a| a.tanh()).chain(std::iter::once(1.0)),
        )
    }

    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>, RegressorError> {
        if input.len() != self.input_dim() {
            return Err(RegressorError::Dimension {
                expected: self.input_dim(),
                actual: input.len(),
            });
        }
        let z = self.inputs.apply(&DVector::from_column_slice(input));
        let standardized = &self.readout * self.features(&z);
        Ok(self.outputs.invert(&standardized).iter().copied().collect())
    }
}
