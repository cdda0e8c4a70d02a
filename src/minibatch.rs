use crate::network::Network;

/// Per-sample scratch state for one forward and backward pass.
///
/// All three buffers are indexed like the network's activations (see
/// [`Network::activation_index`]). Entries for the input layer in `weighted_inputs` and
/// `deltas` are never written.
///
/// A `Network` is only read during a pass, so each worker thread owns a `Minibatch` and shares
/// the network by reference.
#[derive(Debug, Clone)]
pub struct Minibatch {
    pub(crate) activations: Vec<f64>,
    pub(crate) weighted_inputs: Vec<f64>,
    pub(crate) deltas: Vec<f64>,
}

impl Minibatch {
    pub fn new(network: &Network) -> Self {
        Self::with_size(network.n_nodes())
    }

    pub fn with_size(n_nodes: usize) -> Self {
        Self {
            activations: vec![0.0; n_nodes],
            weighted_inputs: vec![0.0; n_nodes],
            deltas: vec![0.0; n_nodes],
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.activations.len()
    }

    pub fn activations(&self) -> &[f64] {
        &self.activations
    }

    /// Pre-activation values `z + b` recorded by the last feedforward.
    pub fn weighted_inputs(&self) -> &[f64] {
        &self.weighted_inputs
    }

    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }
}
