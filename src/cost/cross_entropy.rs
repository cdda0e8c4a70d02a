use super::{output_residual, CostFunction};
use crate::error::{NetworkError, Result};
use crate::linalg::Vector;
use crate::minibatch::Minibatch;
use crate::network::Network;

// Activations are clamped into [EPSILON, 1 - EPSILON] before taking logarithms.
const EPSILON: f64 = 1e-12;

/// Binary cross-entropy summed over the output nodes, in bits:
/// `log2(a_y) + sum_{j != y} log2(1 - a_j)` for expected class `y`.
///
/// The value is not negated, so a better fit gives a larger (closer to zero) cost. The error
/// term of output node `i` is `(a_i - [i == y]) * sigmoid'(z_i)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropy;

impl CostFunction for CrossEntropy {
    fn cost(&self, output: &Vector, expected_class: usize) -> Result<f64> {
        if expected_class >= output.len() {
            return Err(NetworkError::ClassOutOfRange {
                class: expected_class,
                n_classes: output.len(),
            });
        }
        Ok(output
            .iter()
            .enumerate()
            .map(|(j, &a)| {
                let a = a.clamp(EPSILON, 1.0 - EPSILON);
                if j == expected_class {
                    a.log2()
                } else {
                    (1.0 - a).log2()
                }
            })
            .sum())
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
