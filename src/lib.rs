//! A small fully connected sigmoid network with backpropagation under a pluggable cost
//! function.
//!
//! Parameters live in a [`Network`]; the state of one forward and backward pass lives in a
//! [`Minibatch`], so gradients of many samples can be computed concurrently against the same
//! parameters.

pub mod activation;
pub mod config;
pub mod cost;
pub mod data;
pub mod error;
pub mod linalg;
pub mod metrics;
pub mod minibatch;
pub mod network;
pub mod optimizer;

pub use cost::{CostFunction, CrossEntropy, Gradient, Quadratic};
pub use data::TrainingSample;
pub use error::{NetworkError, Result};
pub use linalg::{Matrix, Vector};
pub use minibatch::Minibatch;
pub use network::Network;

/// Assert that two [`Vector`]s have the same length and relatively equal elements.
/// Requires `approx::assert_relative_eq` in scope.
#[macro_export]
macro_rules! assert_rel_eq_vec {
    ($actual:expr, $expected:expr) => {
        assert_eq!($actual.len(), $expected.len());
        $actual
            .iter()
            .zip($expected.iter())
            .for_each(|(v, w)| {
                assert_relative_eq!(v, w);
            });
    };
    ($actual:expr, $expected:expr, $($opt:tt)+) => {
        assert_eq!($actual.len(), $expected.len());
        $actual
            .iter()
            .zip($expected.iter())
            .for_each(|(v, w)| {
                assert_relative_eq!(v, w, $($opt)+);
            });
    };
}
