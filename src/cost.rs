mod cross_entropy;
mod quadratic;

pub use cross_entropy::CrossEntropy;
pub use quadratic::Quadratic;

use rayon::prelude::*;

use crate::activation::{Activation, Sigmoid};
use crate::data::TrainingSample;
use crate::error::{NetworkError, Result};
use crate::linalg::Vector;
use crate::minibatch::Minibatch;
use crate::network::Network;

// Samples handled by one worker before its partial sums are merged. Merging happens in chunk
// order, so results do not depend on the number of threads.
const CHUNK_SIZE: usize = 32;

/// A cost function over the output layer together with the backpropagation it induces.
///
/// Implementors supply the per-sample cost and the error term of the output layer; the
/// recurrence for hidden layers and the averaging over samples are shared.
pub trait CostFunction: Sync {
    /// Cost of one sample given the activations of the output layer.
    fn cost(&self, output: &Vector, expected_class: usize) -> Result<f64>;

    /// Error term (delta) of output node `i` after a feedforward in `minibatch`.
    fn output_error(
        &self,
        i: usize,
        expected_class: usize,
        network: &Network,
        minibatch: &Minibatch,
    ) -> Result<f64>;

    /// Mean cost over `samples`, feeding each one forward first.
    fn evaluate(&self, network: &Network, samples: &[TrainingSample]) -> Result<f64> {
        if samples.is_empty() {
            return Err(NetworkError::EmptySampleSet);
        }
        let partials = samples
            .par_chunks(CHUNK_SIZE)
            .map(|chunk| -> Result<f64> {
                let mut minibatch = Minibatch::new(network);
                let mut sum = 0.0;
                for sample in chunk {
                    sample.check(network)?;
                    network.set_input_activations(&sample.input, &mut minibatch)?;
                    network.feedforward(&mut minibatch)?;
                    let output = network.output_activations(&minibatch)?;
                    sum += self.cost(&output, sample.expected_class)?;
                }
                Ok(sum)
            })
            .collect::<Result<Vec<_>>>()?;

        let cost = partials.iter().sum::<f64>() / samples.len() as f64;
        if !cost.is_finite() {
            return Err(NetworkError::NonFinite(format!("cost evaluated to {}", cost)));
        }
        log::debug!("evaluated cost {} over {} samples", cost, samples.len());
        Ok(cost)
    }

    /// Delta of node `j` in `layer`, computed by recursing towards the output layer.
    ///
    /// Every call re-derives the deltas of all later layers, so this is only suitable for
    /// spot checks; [`CostFunction::backpropagate`] computes all deltas in one sweep.
    fn backward_error(
        &self,
        j: usize,
        layer: usize,
        network: &Network,
        minibatch: &Minibatch,
        expected_class: usize,
    ) -> Result<f64> {
        network.check_parameter_layer(layer)?;
        if layer == network.output_layer_index() {
            return self.output_error(j, expected_class, network, minibatch);
        }

        let z = network.weighted_input(j, layer, minibatch)?;
        let mut sum = 0.0;
        for k in 0..network.layer_size(layer + 1)? {
            let delta = self.backward_error(k, layer + 1, network, minibatch, expected_class)?;
            sum += network.weight(k, j, layer + 1)? * delta;
        }
        Ok(sum * Sigmoid.derivative(z))
    }

    /// Fill the deltas of every layer but the input, from the output layer downwards.
    /// Expects `minibatch` to hold the result of a feedforward.
    fn backpropagate(
        &self,
        network: &Network,
        minibatch: &mut Minibatch,
        expected_class: usize,
    ) -> Result<()> {
        network.check_minibatch(minibatch)?;
        let output_layer = network.output_layer_index();
        let layers = network.layers();
        if expected_class >= layers[output_layer] {
            return Err(NetworkError::ClassOutOfRange {
                class: expected_class,
                n_classes: layers[output_layer],
            });
        }

        let output_start = network.node_range(output_layer).start;
        for i in 0..layers[output_layer] {
            let delta = self.output_error(i, expected_class, network, minibatch)?;
            minibatch.deltas[output_start + i] = delta;
        }

        for layer in (1..output_layer).rev() {
            log::trace!("backpropagate layer {}", layer);
            let start = network.node_range(layer).start;
            let next = network.node_range(layer + 1);
            for j in 0..layers[layer] {
                let sum: f64 = (0..layers[layer + 1])
                    .map(|k| network.weight_row(k, layer + 1)[j] * minibatch.deltas[next.start + k])
                    .sum();
                minibatch.deltas[start + j] =
                    sum * Sigmoid.derivative(minibatch.weighted_inputs[start + j]);
            }
        }
        Ok(())
    }

    /// Feed `sample` forward and backpropagate its error in `minibatch`.
    fn propagate(
        &self,
        network: &Network,
        minibatch: &mut Minibatch,
        sample: &TrainingSample,
    ) -> Result<()> {
        sample.check(network)?;
        network.set_input_activations(&sample.input, minibatch)?;
        network.feedforward(minibatch)?;
        self.backpropagate(network, minibatch, sample.expected_class)
    }

    /// Mean partial derivative of the cost with respect to the bias of node `j` in `layer`.
    fn grad_bias(
        &self,
        j: usize,
        layer: usize,
        network: &Network,
        samples: &[TrainingSample],
    ) -> Result<f64> {
        network.bias_index(j, layer)?;
        if samples.is_empty() {
            return Err(NetworkError::EmptySampleSet);
        }
        let mut minibatch = Minibatch::new(network);
        let mut total = 0.0;
        for sample in samples {
            self.propagate(network, &mut minibatch, sample)?;
            total += network.delta(j, layer, &minibatch)?;
        }
        Ok(total / samples.len() as f64)
    }

    /// Mean partial derivative of the cost with respect to `w^layer_jk`.
    fn grad_weight(
        &self,
        j: usize,
        k: usize,
        layer: usize,
        network: &Network,
        samples: &[TrainingSample],
    ) -> Result<f64> {
        network.weight_index(j, k, layer)?;
        if samples.is_empty() {
            return Err(NetworkError::EmptySampleSet);
        }
        let mut minibatch = Minibatch::new(network);
        let mut total = 0.0;
        for sample in samples {
            self.propagate(network, &mut minibatch, sample)?;
            total += network.activation(k, layer - 1, &minibatch)?
                * network.delta(j, layer, &minibatch)?;
        }
        Ok(total / samples.len() as f64)
    }

    /// Mean gradient of every bias and weight over `samples`.
    /// Samples are processed in parallel, each worker with its own [`Minibatch`].
    fn gradient(&self, network: &Network, samples: &[TrainingSample]) -> Result<Gradient> {
        if samples.is_empty() {
            return Err(NetworkError::EmptySampleSet);
        }
        let partials = samples
            .par_chunks(CHUNK_SIZE)
            .map(|chunk| -> Result<Gradient> {
                let mut minibatch = Minibatch::new(network);
                let mut partial = Gradient::zeros(network);
                for sample in chunk {
                    self.propagate(network, &mut minibatch, sample)?;
                    partial.accumulate(network, &minibatch);
                }
                Ok(partial)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut gradient = Gradient::zeros(network);
        for partial in &partials {
            gradient.add(partial);
        }
        gradient.scale(1.0 / samples.len() as f64);
        log::debug!(
            "gradient over {} samples: norm {}",
            samples.len(),
            gradient.norm()
        );
        Ok(gradient)
    }
}

/// `(a_i - y_i, sigmoid'(z_i))` for output node `i`, where `y` is the one-hot target.
pub(crate) fn output_residual(
    i: usize,
    expected_class: usize,
    network: &Network,
    minibatch: &Minibatch,
) -> Result<(f64, f64)> {
    let layer = network.output_layer_index();
    let a = network.activation(i, layer, minibatch)?;
    let z = network.weighted_input(i, layer, minibatch)?;
    let y = if i == expected_class { 1.0 } else { 0.0 };
    Ok((a - y, Sigmoid.derivative(z)))
}

/// Partial derivatives of a cost with respect to every parameter, laid out like
/// [`Network::biases`] and [`Network::weights`].
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub biases: Vec<f64>,
    pub weights: Vec<f64>,
}

impl Gradient {
    pub fn zeros(network: &Network) -> Self {
        Self {
            biases: vec![0.0; network.n_biases()],
            weights: vec![0.0; network.n_weights()],
        }
    }

    /// Gradient of the bias of node `j` in `layer`, located through `network`'s layout.
    pub fn bias(&self, j: usize, layer: usize, network: &Network) -> Result<f64> {
        self.check_layout(network)?;
        Ok(self.biases[network.bias_index(j, layer)?])
    }

    pub fn weight(&self, j: usize, k: usize, layer: usize, network: &Network) -> Result<f64> {
        self.check_layout(network)?;
        Ok(self.weights[network.weight_index(j, k, layer)?])
    }

    // A gradient is only addressable through a network with the same parameter counts.
    fn check_layout(&self, network: &Network) -> Result<()> {
        if self.biases.len() != network.n_biases() {
            return Err(NetworkError::DimensionMismatch {
                expected: network.n_biases(),
                got: self.biases.len(),
            });
        }
        if self.weights.len() != network.n_weights() {
            return Err(NetworkError::DimensionMismatch {
                expected: network.n_weights(),
                got: self.weights.len(),
            });
        }
        Ok(())
    }

    pub fn norm(&self) -> f64 {
        self.biases
            .iter()
            .chain(&self.weights)
            .map(|g| g * g)
            .sum::<f64>()
            .sqrt()
    }

    // Add the contribution of the pass recorded in `minibatch`.
    fn accumulate(&mut self, network: &Network, minibatch: &Minibatch) {
        let layers = network.layers();
        for layer in 1..layers.len() {
            let nodes = network.node_range(layer);
            let previous = network.node_range(layer - 1);
            let bias_start = network.bias_range(layer).start;
            let weight_start = network.weight_range(layer).start;
            let n_prev = layers[layer - 1];

            for i in 0..layers[layer] {
                let delta = minibatch.deltas[nodes.start + i];
                self.biases[bias_start + i] += delta;
                let row = &mut self.weights[weight_start + i * n_prev..][..n_prev];
                for (w, &a) in row.iter_mut().zip(&minibatch.activations[previous.clone()]) {
                    *w += a * delta;
                }
            }
        }
    }

    fn add(&mut self, other: &Gradient) {
        for (g, o) in self.biases.iter_mut().zip(&other.biases) {
            *g += o;
        }
        for (g, o) in self.weights.iter_mut().zip(&other.weights) {
            *g += o;
        }
    }

    fn scale(&mut self, scalar: f64) {
        self.biases
            .iter_mut()
            .chain(self.weights.iter_mut())
            .for_each(|g| *g *= scalar);
    }
}
