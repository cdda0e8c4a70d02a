use crate::linalg::Vector;

pub trait Activation {
    fn compute(&self, z: f64) -> f64;

    fn derivative(&self, z: f64) -> f64;

    fn apply(&self, z: &Vector) -> Vector {
        let mut out = z.clone();
        out.map_inplace(|v| self.compute(v));
        out
    }

    fn apply_derivative(&self, z: &Vector) -> Vector {
        let mut out = z.clone();
        out.map_inplace(|v| self.derivative(v));
        out
    }
}

/// Logistic function `1 / (1 + e^-z)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sigmoid;

impl Activation for Sigmoid {
    fn compute(&self, z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }

    fn derivative(&self, z: f64) -> f64 {
        let s = self.compute(z);
        s * (1.0 - s)
    }
}

#[cfg(test)]
mod tests {
    use crate::assert_rel_eq_vec;

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sigmoid_compute() {
        let z = Vector::new(vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        let actual = Sigmoid.apply(&z);
        let expected = Vector::new(vec![
            0.11920292202211755,
            0.2689414213699951,
            0.5000000000000000,
            0.7310585786300049,
            0.8807970779778823,
        ]);
        assert_rel_eq_vec!(actual, expected);
    }

    #[test]
    fn sigmoid_derivative() {
        let z = Vector::new(vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        let actual = Sigmoid.apply_derivative(&z);
        let expected = Vector::new(vec![
            0.1049935854035065,
            0.19661193324148185,
            0.2500000000000000,
            0.19661193324148185,
            0.10499358540350662,
        ]);
        assert_rel_eq_vec!(actual, expected);
    }

    #[test]
    fn sigmoid_stays_in_open_unit_interval() {
        assert_eq!(0.5, Sigmoid.compute(0.0));
        for z in [-30.0, -5.0, -0.1, 0.1, 5.0, 30.0] {
            let s = Sigmoid.compute(z);
            assert!(0.0 < s && s < 1.0, "sigmoid({}) = {}", z, s);
        }
    }
}
