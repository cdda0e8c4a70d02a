use std::io::{Read, Write};
use std::iter;
use std::ops::Range;

use ndarray::{Array, Array1, ArrayView1};
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::{Rng, SeedableRng};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use crate::activation::{Activation, Sigmoid};
use crate::config::NetworkConfig;
use crate::error::{NetworkError, Result};
use crate::linalg::{read_u64, Matrix, Vector};
use crate::minibatch::Minibatch;

/// Fully connected sigmoid network whose parameters live in two flat arrays.
///
/// Biases are stored layer by layer, skipping the input layer. Weights `w^l_ij`, the
/// connection from node `j` of layer `l - 1` to node `i` of layer `l`, are ordered by layer,
/// then by `i`, then by `j`:
///
/// ```text
/// w^1_00, w^1_01, ..., w^1_0m, w^1_10, ..., w^1_nm, w^2_00, ...
/// ```
///
/// Activations, pre-activations and deltas of a pass are kept in a [`Minibatch`] so that the
/// parameters can be shared read-only between passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layers: Vec<usize>,
    activation_offsets: Vec<usize>,
    bias_offsets: Vec<usize>,
    weight_offsets: Vec<usize>,
    biases: Vec<f64>,
    weights: Vec<f64>,
}

// [0, x0, x0 + x1, ...], or `None` if a term or a sum overflows.
fn prefix_sums(values: impl Iterator<Item = Option<usize>>) -> Option<Vec<usize>> {
    let mut sums = vec![0];
    let mut acc = 0usize;
    for value in values {
        acc = acc.checked_add(value?)?;
        sums.push(acc);
    }
    Some(sums)
}

// Where each layer starts in the flat activation, bias and weight arrays.
struct Layout {
    activation_offsets: Vec<usize>,
    bias_offsets: Vec<usize>,
    weight_offsets: Vec<usize>,
}

impl Layout {
    fn new(layers: &[usize]) -> Result<Self> {
        if layers.len() < 2 {
            return Err(NetworkError::InvalidTopology(format!(
                "at least an input and an output layer are required, got {} layers",
                layers.len()
            )));
        }
        if let Some(layer) = layers.iter().position(|&size| size == 0) {
            return Err(NetworkError::InvalidTopology(format!(
                "layer {} has no nodes",
                layer
            )));
        }

        let overflow =
            || NetworkError::InvalidTopology(format!("layer sizes {:?} overflow usize", layers));
        let activation_offsets =
            prefix_sums(layers.iter().map(|&size| Some(size))).ok_or_else(overflow)?;
        // Index 0 is a placeholder: the input layer has no parameters.
        let bias_offsets = iter::once(0)
            .chain(
                prefix_sums(layers[1..].iter().map(|&size| Some(size))).ok_or_else(overflow)?,
            )
            .collect::<Vec<_>>();
        let weight_offsets = iter::once(0)
            .chain(
                prefix_sums(layers.windows(2).map(|pair| pair[0].checked_mul(pair[1])))
                    .ok_or_else(overflow)?,
            )
            .collect::<Vec<_>>();

        Ok(Self {
            activation_offsets,
            bias_offsets,
            weight_offsets,
        })
    }
}

impl Network {
    /// Create a network with zero-filled biases and weights.
    /// `layers[0]` is the input width and the last entry is the output width.
    pub fn new(layers: &[usize]) -> Result<Self> {
        let layout = Layout::new(layers)?;
        let n_biases = layout.bias_offsets[layers.len()];
        let n_weights = layout.weight_offsets[layers.len()];
        Ok(Self::from_layout(
            layers,
            layout,
            vec![0.0; n_biases],
            vec![0.0; n_weights],
        ))
    }

    /// Create a network from flat parameter arrays laid out as described on [`Network`].
    pub fn with_parameters(layers: &[usize], biases: Vec<f64>, weights: Vec<f64>) -> Result<Self> {
        let layout = Layout::new(layers)?;
        let n_biases = layout.bias_offsets[layers.len()];
        let n_weights = layout.weight_offsets[layers.len()];
        if biases.len() != n_biases {
            return Err(NetworkError::DimensionMismatch {
                expected: n_biases,
                got: biases.len(),
            });
        }
        if weights.len() != n_weights {
            return Err(NetworkError::DimensionMismatch {
                expected: n_weights,
                got: weights.len(),
            });
        }
        Ok(Self::from_layout(layers, layout, biases, weights))
    }

    fn from_layout(layers: &[usize], layout: Layout, biases: Vec<f64>, weights: Vec<f64>) -> Self {
        log::debug!(
            "network {:?}: {} nodes, {} biases, {} weights",
            layers,
            layout.activation_offsets[layers.len()],
            biases.len(),
            weights.len()
        );
        Self {
            layers: layers.to_vec(),
            activation_offsets: layout.activation_offsets,
            bias_offsets: layout.bias_offsets,
            weight_offsets: layout.weight_offsets,
            biases,
            weights,
        }
    }

    /// Create a network whose parameters are drawn uniformly from `[low, high)`.
    pub fn random<R>(layers: &[usize], low: f64, high: f64, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(NetworkError::InvalidConfig(format!(
                "initialization range [{}, {}) is empty or not finite",
                low, high
            )));
        }
        let mut network = Self::new(layers)?;
        let distribution = Uniform::new(low, high);
        let biases: Array1<f64> = Array::random_using(network.n_biases(), distribution, rng);
        let weights: Array1<f64> = Array::random_using(network.n_weights(), distribution, rng);
        network.biases = biases.into_raw_vec();
        network.weights = weights.into_raw_vec();
        Ok(network)
    }

    pub fn from_config(config: &NetworkConfig) -> Result<Self> {
        config.validate()?;
        let (low, high) = config.init_range();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let network = Self::random(&config.layers, low, high, &mut rng)?;
        log::info!(
            "initialized network {:?} uniformly in [{}, {})",
            config.layers,
            low,
            high
        );
        Ok(network)
    }

    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn output_layer_index(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn layer_size(&self, layer: usize) -> Result<usize> {
        self.check_layer(layer)?;
        Ok(self.layers[layer])
    }

    pub fn n_nodes(&self) -> usize {
        self.activation_offsets[self.layers.len()]
    }

    pub fn n_biases(&self) -> usize {
        self.biases.len()
    }

    pub fn n_weights(&self) -> usize {
        self.weights.len()
    }

    pub fn activation_index(&self, index: usize, layer: usize) -> Result<usize> {
        self.check_node(index, layer)?;
        Ok(self.activation_offsets[layer] + index)
    }

    pub fn bias_index(&self, index: usize, layer: usize) -> Result<usize> {
        self.check_parameter_layer(layer)?;
        self.check_node(index, layer)?;
        Ok(self.bias_offsets[layer] + index)
    }

    /// Index of `w^layer_ij` in [`Network::weights`].
    pub fn weight_index(&self, i: usize, j: usize, layer: usize) -> Result<usize> {
        self.check_parameter_layer(layer)?;
        self.check_node(i, layer)?;
        self.check_node(j, layer - 1)?;
        Ok(self.weight_offsets[layer] + i * self.layers[layer - 1] + j)
    }

    pub fn bias(&self, index: usize, layer: usize) -> Result<f64> {
        Ok(self.biases[self.bias_index(index, layer)?])
    }

    pub fn set_bias(&mut self, index: usize, layer: usize, value: f64) -> Result<()> {
        let idx = self.bias_index(index, layer)?;
        self.biases[idx] = value;
        Ok(())
    }

    pub fn weight(&self, i: usize, j: usize, layer: usize) -> Result<f64> {
        Ok(self.weights[self.weight_index(i, j, layer)?])
    }

    pub fn set_weight(&mut self, i: usize, j: usize, layer: usize, value: f64) -> Result<()> {
        let idx = self.weight_index(i, j, layer)?;
        self.weights[idx] = value;
        Ok(())
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    /// Biases of `layer` as a column of length `layers[layer]`.
    pub fn bias_vector(&self, layer: usize) -> Result<Vector> {
        self.check_parameter_layer(layer)?;
        Ok(Vector::new(self.biases[self.bias_range(layer)].to_vec()))
    }

    /// Weights into `layer` as a `layers[layer] x layers[layer - 1]` matrix.
    pub fn weight_matrix(&self, layer: usize) -> Result<Matrix> {
        self.check_parameter_layer(layer)?;
        Matrix::new(
            self.layers[layer],
            self.layers[layer - 1],
            self.weights[self.weight_range(layer)].to_vec(),
        )
    }

    /// Copy `input` into the input layer of `minibatch`.
    pub fn set_input_activations(&self, input: &Vector, minibatch: &mut Minibatch) -> Result<()> {
        self.check_minibatch(minibatch)?;
        if input.len() != self.layers[0] {
            return Err(NetworkError::DimensionMismatch {
                expected: self.layers[0],
                got: input.len(),
            });
        }
        if let Some((index, value)) = input.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(NetworkError::NonFinite(format!(
                "input activation {} is {}",
                index, value
            )));
        }

        for (dst, &src) in minibatch.activations[..self.layers[0]]
            .iter_mut()
            .zip(input.iter())
        {
            *dst = src;
        }
        Ok(())
    }

    /// `sum_j w^layer_ij * a^{layer-1}_j`, excluding the bias.
    pub fn weighted_sum(&self, i: usize, layer: usize, minibatch: &Minibatch) -> Result<f64> {
        self.bias_index(i, layer)?;
        self.check_minibatch(minibatch)?;
        Ok(self.dot_row(i, layer, &minibatch.activations))
    }

    /// Recompute the activation of node `i` in `layer` from the previous layer.
    /// Input activations are supplied by the caller, so this is a no-op for layer 0.
    pub fn feedforward_activation(
        &self,
        i: usize,
        layer: usize,
        minibatch: &mut Minibatch,
    ) -> Result<()> {
        self.check_node(i, layer)?;
        self.check_minibatch(minibatch)?;
        if layer > 0 {
            self.activate_node(i, layer, minibatch);
        }
        Ok(())
    }

    pub fn feedforward_layer(&self, layer: usize, minibatch: &mut Minibatch) -> Result<()> {
        self.check_layer(layer)?;
        self.check_minibatch(minibatch)?;
        if layer > 0 {
            self.activate_layer(layer, minibatch);
        }
        Ok(())
    }

    /// Propagate the input activations through every layer in ascending order.
    pub fn feedforward(&self, minibatch: &mut Minibatch) -> Result<()> {
        self.check_minibatch(minibatch)?;
        for layer in 1..self.layers.len() {
            self.activate_layer(layer, minibatch);
        }
        Ok(())
    }

    pub fn activation(&self, index: usize, layer: usize, minibatch: &Minibatch) -> Result<f64> {
        let idx = self.activation_index(index, layer)?;
        self.check_minibatch(minibatch)?;
        Ok(minibatch.activations[idx])
    }

    /// Pre-activation `z + b` of node `index` recorded by the last feedforward.
    pub fn weighted_input(&self, index: usize, layer: usize, minibatch: &Minibatch) -> Result<f64> {
        self.check_parameter_layer(layer)?;
        let idx = self.activation_index(index, layer)?;
        self.check_minibatch(minibatch)?;
        Ok(minibatch.weighted_inputs[idx])
    }

    pub fn delta(&self, index: usize, layer: usize, minibatch: &Minibatch) -> Result<f64> {
        self.check_parameter_layer(layer)?;
        let idx = self.activation_index(index, layer)?;
        self.check_minibatch(minibatch)?;
        Ok(minibatch.deltas[idx])
    }

    pub fn output_activations(&self, minibatch: &Minibatch) -> Result<Vector> {
        self.check_minibatch(minibatch)?;
        let range = self.node_range(self.output_layer_index());
        Ok(Vector::new(minibatch.activations[range].to_vec()))
    }

    /// Run a single input through the network and return the output activations.
    pub fn predict(&self, input: &Vector) -> Result<Vector> {
        let mut minibatch = Minibatch::new(self);
        self.set_input_activations(input, &mut minibatch)?;
        self.feedforward(&mut minibatch)?;
        self.output_activations(&minibatch)
    }

    /// Index of the most activated output node.
    pub fn classify(&self, input: &Vector) -> Result<usize> {
        Ok(self.predict(input)?.argmax())
    }

    /// Encode the topology followed by, for every layer but the input, its biases as a
    /// column matrix and its weights as a matrix.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&(self.layers.len() as u64).to_le_bytes())?;
        for &size in &self.layers {
            writer.write_all(&(size as u64).to_le_bytes())?;
        }
        for layer in 1..self.layers.len() {
            Matrix::new(
                self.layers[layer],
                1,
                self.biases[self.bias_range(layer)].to_vec(),
            )?
            .write_to(writer)?;
            self.weight_matrix(layer)?.write_to(writer)?;
        }
        log::info!("saved network {:?}", self.layers);
        Ok(())
    }

    /// Decode a network written by [`Network::write_to`].
    /// Parameter storage grows only as matrix data is actually read.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let n_layers = read_u64(reader, "layer count")?;
        let mut layers = Vec::with_capacity(n_layers.min(1024));
        for _ in 0..n_layers {
            layers.push(read_u64(reader, "layer size")?);
        }
        Layout::new(&layers).map_err(|e| NetworkError::Decode(e.to_string()))?;

        let mut biases = Vec::new();
        let mut weights = Vec::new();
        for layer in 1..layers.len() {
            let layer_biases = Matrix::read_from(reader)?;
            if layer_biases.shape() != (layers[layer], 1) {
                return Err(NetworkError::Decode(format!(
                    "layer {} biases have shape {:?}, expected ({}, 1)",
                    layer,
                    layer_biases.shape(),
                    layers[layer]
                )));
            }
            let layer_weights = Matrix::read_from(reader)?;
            if layer_weights.shape() != (layers[layer], layers[layer - 1]) {
                return Err(NetworkError::Decode(format!(
                    "layer {} weights have shape {:?}, expected ({}, {})",
                    layer,
                    layer_weights.shape(),
                    layers[layer],
                    layers[layer - 1]
                )));
            }
            biases.extend(layer_biases.to_vec());
            weights.extend(layer_weights.to_vec());
        }
        let network = Self::with_parameters(&layers, biases, weights)?;
        log::info!("loaded network {:?}", network.layers);
        Ok(network)
    }

    pub(crate) fn node_range(&self, layer: usize) -> Range<usize> {
        self.activation_offsets[layer]..self.activation_offsets[layer + 1]
    }

    pub(crate) fn bias_range(&self, layer: usize) -> Range<usize> {
        self.bias_offsets[layer]..self.bias_offsets[layer + 1]
    }

    pub(crate) fn weight_range(&self, layer: usize) -> Range<usize> {
        self.weight_offsets[layer]..self.weight_offsets[layer + 1]
    }

    /// Weights from every node of `layer - 1` into node `i` of `layer`.
    pub(crate) fn weight_row(&self, i: usize, layer: usize) -> &[f64] {
        let n_prev = self.layers[layer - 1];
        let start = self.weight_offsets[layer] + i * n_prev;
        &self.weights[start..start + n_prev]
    }

    pub(crate) fn check_minibatch(&self, minibatch: &Minibatch) -> Result<()> {
        if minibatch.n_nodes() != self.n_nodes() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.n_nodes(),
                got: minibatch.n_nodes(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_parameter_layer(&self, layer: usize) -> Result<()> {
        if layer == 0 {
            return Err(NetworkError::InputLayerHasNoParameters);
        }
        self.check_layer(layer)
    }

    fn check_layer(&self, layer: usize) -> Result<()> {
        if layer >= self.layers.len() {
            return Err(NetworkError::LayerOutOfRange {
                layer,
                n_layers: self.layers.len(),
            });
        }
        Ok(())
    }

    fn check_node(&self, index: usize, layer: usize) -> Result<()> {
        self.check_layer(layer)?;
        if index >= self.layers[layer] {
            return Err(NetworkError::NodeOutOfRange {
                index,
                size: self.layers[layer],
                layer,
            });
        }
        Ok(())
    }

    fn dot_row(&self, i: usize, layer: usize, activations: &[f64]) -> f64 {
        let row = ArrayView1::from(self.weight_row(i, layer));
        let previous = ArrayView1::from(&activations[self.node_range(layer - 1)]);
        row.dot(&previous)
    }

    fn activate_node(&self, i: usize, layer: usize, minibatch: &mut Minibatch) {
        let z = self.dot_row(i, layer, &minibatch.activations)
            + self.biases[self.bias_offsets[layer] + i];
        let idx = self.activation_offsets[layer] + i;
        minibatch.weighted_inputs[idx] = z;
        minibatch.activations[idx] = Sigmoid.compute(z);
    }

    // Nodes of one layer only read the previous layer, so their order does not matter.
    fn activate_layer(&self, layer: usize, minibatch: &mut Minibatch) {
        log::trace!("feedforward layer {} ({} nodes)", layer, self.layers[layer]);
        for i in 0..self.layers[layer] {
            self.activate_node(i, layer, minibatch);
        }
    }
}
