// src/motion/spline.rs
//! Scalar interpolating B-splines with analytic derivatives.
//!
//! A spline is fitted through values sampled on a uniform parameter grid over
//! `[0, 1]`. The knot vector is clamped and its interior knots are averages of
//! consecutive sites, which keeps the collocation system non-singular for any
//! degree below the number of sites. Derivatives are themselves B-splines of
//! one degree less, so every derivative order is exact rather than
//! finite-differenced.

use nalgebra::DMatrix;

use super::trajectory::ReconstructionError;

/// A scalar B-spline curve on `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BSpline {
    knots: Vec<f64>,
    coefficients: Vec<f64>,
    degree: usize,
}

impl BSpline {
    /// Uniform interpolation sites `k / (count - 1)`.
    pub fn uniform_sites(count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![0.0],
            _ => (0..count).map(|k| k as f64 / (count - 1) as f64).collect(),
        }
    }

    /// Clamped knot vector with averaged interior knots for `sites`.
    fn averaged_knots(sites: &[f64], degree: usize) -> Vec<f64> {
        let n = sites.len();
        let mut knots = Vec::with_capacity(n + degree + 1);
        knots.extend(std::iter::repeat_n(0.0, degree + 1));
        for j in 1..n - degree {
            let sum: f64 = sites[j..j + degree].iter().sum();
            knots.push(sum / degree as f64);
        }
        knots.extend(std::iter::repeat_n(1.0, degree + 1));
        knots
    }

    /// Fit one spline per column of `values` (`sites × axes`), all sharing
    /// the same knot vector and collocation factorization.
    ///
    /// `degree` is clamped to `rows - 1` so short inputs still interpolate.
    pub fn interpolate_columns(values: &DMatrix<f64>, degree: usize) -> Result<Vec<BSpline>, ReconstructionError> {
        let n = values.nrows();
        if n < 2 {
            return Err(ReconstructionError::TooFewWaypoints(n));
        }
        let degree = degree.clamp(1, n - 1);
        let sites = Self::uniform_sites(n);
        let knots = Self::averaged_knots(&sites, degree);

        let template = BSpline {
            knots: knots.clone(),
            coefficients: vec![0.0; n],
            degree,
        };
        let mut collocation = DMatrix::<f64>::zeros(n, n);
        for (row, &u) in sites.iter().enumerate() {
            let span = template.find_span(u);
            let basis = template.basis_functions(span, u);
            for (k, value) in basis.iter().enumerate() {
                collocation[(row, span - degree + k)] = *value;
            }
        }

        let solved = collocation
            .lu()
            .solve(values)
            .ok_or(ReconstructionError::SingularSystem)?;

        Ok((0..values.ncols())
            .map(|axis| BSpline {
                knots: knots.clone(),
                coefficients: solved.column(axis).iter().copied().collect(),
                degree,
            })
            .collect())
    }

    /// Fit a single spline through `values`.
    pub fn interpolate(values: &[f64], degree: usize) -> Result<BSpline, ReconstructionError> {
        let column = DMatrix::from_column_slice(values.len(), 1, values);
        let mut splines = Self::interpolate_columns(&column, degree)?;
        splines.pop().ok_or(ReconstructionError::TooFewWaypoints(values.len()))
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Find the knot span index `i` such that `knots[i] <= u < knots[i+1]`.
    fn find_span(&self, u: f64) -> usize {
        let n = self.coefficients.len();
        let p = self.degree;

        if u >= self.knots[n] {
            return n - 1;
        }
        if u <= self.knots[p] {
            return p;
        }

        let mut low = p;
        let mut high = n;
        while low < high {
            let mid = (low + high) / 2;
            if self.knots[mid] > u {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low - 1
    }

    /// Non-zero basis functions at `u` (Cox–de Boor, `degree + 1` values).
    fn basis_functions(&self, span: usize, u: f64) -> Vec<f64> {
        let p = self.degree;
        let mut n_basis = vec![0.0; p + 1];
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];

        n_basis[0] = 1.0;
        for j in 1..=p {
            left[j] = u - self.knots[span + 1 - j];
            right[j] = self.knots[span + j] - u;

            let mut saved = 0.0;
            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                if denom.abs() > 1e-15 {
                    let temp = n_basis[r] / denom;
                    n_basis[r] = saved + right[r + 1] * temp;
                    saved = left[j - r] * temp;
                } else {
                    n_basis[r] = saved;
                    saved = 0.0;
                }
            }
            n_basis[j] = saved;
        }
        n_basis
    }

    /// Value at parameter `u`, clamped to `[0, 1]`.
    pub fn evaluate(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        let span = self.find_span(u);
        let basis = self.basis_functions(span, u);
        basis
            .iter()
            .enumerate()
            .map(|(k, b)| self.coefficients[span - self.degree + k] * b)
            .sum()
    }

    /// The derivative `d/du` as a spline of one degree less.
    ///
    /// A degree-0 spline differentiates to the zero spline.
    pub fn derivative(&self) -> BSpline {
        let p = self.degree;
        if p == 0 || self.coefficients.len() < 2 {
            return BSpline {
                knots: vec![0.0, 1.0],
                coefficients: vec![0.0],
                degree: 0,
            };
        }

        let coefficients = self
            .coefficients
            .windows(2)
            .enumerate()
            .map(|(i, c)| {
                let span = self.knots[i + p + 1] - self.knots[i + 1];
                if span > 1e-15 {
                    p as f64 * (c[1] - c[0]) / span
                } else {
                    0.0
                }
            })
            .collect();

        BSpline {
            knots: self.knots[1..self.knots.len() - 1].to_vec(),
            coefficients,
            degree: p - 1,
        }
    }

    /// The `order`-th derivative.
    pub fn nth_derivative(&self, order: usize) -> BSpline {
        (0..order).fold(self.clone(), |spline, _| spline.derivative())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_interpolates_sites_exactly() {
        let values = [0.0, 0.7, -0.2, 1.5, 2.0, 1.1, 0.3];
        for degree in 1..=5 {
            let spline = BSpline::interpolate(&values, degree).unwrap();
            for (u, v) in BSpline::uniform_sites(values.len()).iter().zip(values.iter()) {
                assert_relative_eq!(spline.evaluate(*u), *v, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_degree_is_clamped_for_short_inputs() {
        let spline = BSpline::interpolate(&[1.0, 3.0], 5).unwrap();
        assert_eq!(spline.degree(), 1);
        assert_relative_eq!(spline.evaluate(0.5), 2.0, epsilon = 1e-12);
        assert_relative_eq!(spline.derivative().evaluate(0.25), 2.0, epsilon = 1e-12);
        assert_relative_eq!(spline.nth_derivative(2).evaluate(0.5), 0.0);
    }

    #[test]
    fn test_reproduces_cubic_polynomial_and_derivatives() {
        // A quintic spline reproduces any polynomial of degree <= 5 exactly.
        let f = |u: f64| 2.0 * u * u * u - u * u + 0.5 * u + 1.0;
        let df = |u: f64| 6.0 * u * u - 2.0 * u + 0.5;
        let ddf = |u: f64| 12.0 * u - 2.0;
        let values: Vec<f64> = BSpline::uniform_sites(9).into_iter().map(f).collect();
        let spline = BSpline::interpolate(&values, 5).unwrap();
        let d1 = spline.derivative();
        let d2 = spline.nth_derivative(2);
        let d3 = spline.nth_derivative(3);
        for k in 0..=20 {
            let u = k as f64 / 20.0;
            assert_relative_eq!(spline.evaluate(u), f(u), epsilon = 1e-8);
            assert_relative_eq!(d1.evaluate(u), df(u), epsilon = 1e-7);
            assert_relative_eq!(d2.evaluate(u), ddf(u), epsilon = 1e-6);
            assert_relative_eq!(d3.evaluate(u), 12.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_shared_columns_match_individual_fits() {
        let a = [0.0, 1.0, 4.0, 9.0, 16.0, 25.0];
        let b = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let mut m = DMatrix::<f64>::zeros(6, 2);
        for i in 0..6 {
            m[(i, 0)] = a[i];
            m[(i, 1)] = b[i];
        }
        let splines = BSpline::interpolate_columns(&m, 3).unwrap();
        let single = BSpline::interpolate(&b, 3).unwrap();
        assert_relative_eq!(splines[1].evaluate(0.37), single.evaluate(0.37), epsilon = 1e-12);
    }

    #[test]
    fn test_single_value_is_rejected() {
        assert!(matches!(
            BSpline::interpolate(&[1.0], 3),
            Err(ReconstructionError::TooFewWaypoints(1))
        ));
    }
}
