use crate::data::TrainingSample;
use crate::error::{NetworkError, Result};
use crate::linalg::Vector;
use crate::network::Network;

/// Euclidean distance between the expected and the actual output activations.
pub fn error(expected: &Vector, actual: &Vector) -> Result<f64> {
    expected.distance(actual)
}

/// Predicted class of an output layer: the index of its largest activation.
pub fn class_of(output: &Vector) -> usize {
    output.argmax()
}

/// Fraction of `samples` whose predicted class equals the expected one.
pub fn accuracy(network: &Network, samples: &[TrainingSample]) -> Result<f64> {
    if samples.is_empty() {
        return Err(NetworkError::EmptySampleSet);
    }
    let mut n_corrects = 0;
    for sample in samples {
        sample.check(network)?;
        if network.classify(&sample.input)? == sample.expected_class {
            n_corrects += 1;
        }
    }
    Ok(n_corrects as f64 / samples.len() as f64)
}

/// Confusion matrix over the output classes.
/// The item in row `i` and column `j` counts samples of class `i` predicted as class `j`.
pub fn confusion_matrix(network: &Network, samples: &[TrainingSample]) -> Result<Vec<Vec<usize>>> {
    let n_classes = network.layer_size(network.output_layer_index())?;
    let mut counts = vec![vec![0; n_classes]; n_classes];
    for sample in samples {
        sample.check(network)?;
        let predicted = network.classify(&sample.input)?;
        counts[sample.expected_class][predicted] += 1;
    }
    Ok(counts)
}
