use crate::error::{NetworkError, Result};
use crate::linalg::Vector;
use crate::network::Network;

/// One labelled input: activations for the input layer and the index of the output node
/// that should fire.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub input: Vector,
    pub expected_class: usize,
}

impl TrainingSample {
    pub fn new(input: Vector, expected_class: usize) -> Self {
        Self {
            input,
            expected_class,
        }
    }

    /// One-hot encoding of `expected_class` over `n_classes` outputs.
    pub fn target(&self, n_classes: usize) -> Result<Vector> {
        let mut target = Vector::zeros(n_classes);
        target
            .set(self.expected_class, 1.0)
            .map_err(|_| NetworkError::ClassOutOfRange {
                class: self.expected_class,
                n_classes,
            })?;
        Ok(target)
    }

    /// Check that this sample fits the input and output widths of `network`.
    pub fn check(&self, network: &Network) -> Result<()> {
        let layers = network.layers();
        if self.input.len() != layers[0] {
            return Err(NetworkError::DimensionMismatch {
                expected: layers[0],
                got: self.input.len(),
            });
        }
        let n_classes = layers[network.output_layer_index()];
        if self.expected_class >= n_classes {
            return Err(NetworkError::ClassOutOfRange {
                class: self.expected_class,
                n_classes,
            });
        }
        Ok(())
    }
}
