use super::{output_residual, CostFunction};
use crate::error::{NetworkError, Result};
use crate::linalg::Vector;
use crate::minibatch::Minibatch;
use crate::network::Network;

/// Squared error against the one-hot target, `1/2 * sum_j (a_j - [j == y])^2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quadratic;

impl CostFunction for Quadratic {
    fn cost(&self, output: &Vector, expected_class: usize) -> Result<f64> {
        if expected_class >= output.len() {
            return Err(NetworkError::ClassOutOfRange {
                class: expected_class,
                n_classes: output.len(),
            });
        }
        let squared = output
            .iter()
            .enumerate()
            .map(|(j, &a)| {
                let y = if j == expected_class { 1.0 } else { 0.0 };
                (a - y).powi(2)
            })
            .sum::<f64>();
        Ok(0.5 * squared)
    }

    fn output_error(
        &self,
        i: usize,
        expected_class: usize,
        network: &Network,
        minibatch: &Minibatch,
    ) -> Result<f64> {
        let (residual, slope) = output_residual(i, expected_class, network, minibatch)?;
        Ok(residual * slope)
    }
}
