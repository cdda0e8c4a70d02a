use thiserror::Error;

pub type Result<T> = std::result::Result<T, NetworkError>;

/// Errors raised by the linear algebra primitives, the network and the cost functions.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("layer {layer} out of range for a network with {n_layers} layers")]
    LayerOutOfRange { layer: usize, n_layers: usize },

    #[error("node {index} out of range for layer {layer} of size {size}")]
    NodeOutOfRange {
        index: usize,
        size: usize,
        layer: usize,
    },

    #[error("the input layer has no biases or incoming weights")]
    InputLayerHasNoParameters,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("expected class {class} out of range for {n_classes} output nodes")]
    ClassOutOfRange { class: usize, n_classes: usize },

    #[error("sample set is empty")]
    EmptySampleSet,

    #[error("non-finite value: {0}")]
    NonFinite(String),

    #[error("malformed serialized data: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetworkError {
    /// True for shape and precondition violations, i.e. errors the caller could have
    /// avoided by validating its arguments. False for problems with the data itself.
    pub fn is_caller_misuse(&self) -> bool {
        !matches!(
            self,
            Self::NonFinite(_)
                | Self::Decode(_)
                | Self::Io(_)
                | Self::InvalidConfig(_)
                | Self::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_misuse_and_data_errors() {
        assert!(NetworkError::InputLayerHasNoParameters.is_caller_misuse());
        assert!(NetworkError::DimensionMismatch {
            expected: 2,
            got: 3
        }
        .is_caller_misuse());
        assert!(!NetworkError::NonFinite("activation".to_string()).is_caller_misuse());
        assert!(!NetworkError::Decode("truncated".to_string()).is_caller_misuse());
    }

    #[test]
    fn error_messages() {
        let err = NetworkError::NodeOutOfRange {
            index: 4,
            size: 3,
            layer: 1,
        };
        assert_eq!("node 4 out of range for layer 1 of size 3", err.to_string());
    }
}
