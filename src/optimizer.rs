mod gradient_descent;

use crate::cost::Gradient;
use crate::error::Result;
use crate::network::Network;

pub use gradient_descent::GradientDescent;

/// Trait to abstract parameter update rules.
/// Updates must not overlap with gradient computation on the same network.
pub trait Optimizer {
    fn update(&self, network: &mut Network, gradient: &Gradient) -> Result<()>;
}
