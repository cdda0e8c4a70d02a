use crate::{
    cost::Gradient,
    error::{NetworkError, Result},
    network::Network,
    optimizer::Optimizer,
};

/// Plain gradient descent: `p <- p - learning_rate * dC/dp`.
pub struct GradientDescent {
    learning_rate: f64,
}

impl GradientDescent {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

fn check_len(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(NetworkError::DimensionMismatch { expected, got });
    }
    Ok(())
}

fn descend(parameters: &mut [f64], gradient: &[f64], learning_rate: f64) {
    for (p, g) in parameters.iter_mut().zip(gradient) {
        *p -= learning_rate * g;
    }
}

impl Optimizer for GradientDescent {
    fn update(&self, network: &mut Network, gradient: &Gradient) -> Result<()> {
        // Both checks come first so that a mismatch leaves the network untouched.
        check_len(network.n_biases(), gradient.biases.len())?;
        check_len(network.n_weights(), gradient.weights.len())?;
        descend(network.biases_mut(), &gradient.biases, self.learning_rate);
        descend(network.weights_mut(), &gradient.weights, self.learning_rate);
        Ok(())
    }
}
