//! Garment classifier capability and the bundled multilayer perceptron.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A trained model mapping a feature vector to one score per class
pub trait ClassifierModel: Send + Sync {
    /// Length of the feature vector the model was trained on
    fn input_size(&self) -> usize;

    /// Scores for every class. Callers must pass exactly `input_size()`
    /// values; implementations may assert it in debug builds.
    fn predict(&self, features: &[f32]) -> Vec<f32>;
}

/// Neuron activation, applied to every layer after the input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activation {
    /// `beta * (1 - e^(-alpha x)) / (1 + e^(-alpha x))`
    SigmoidSym {
        #[serde(default = "default_alpha")]
        alpha: f32,
        #[serde(default = "default_beta")]
        beta: f32,
    },
    Identity,
    Relu,
}

fn default_alpha() -> f32 {
    2.0 / 3.0
}

fn default_beta() -> f32 {
    1.7159
}

impl Activation {
    fn apply(&self, x: f32) -> f32 {
        match *self {
            Activation::SigmoidSym { alpha, beta } => {
                let e = (-alpha * x).exp();
                beta * (1.0 - e) / (1.0 + e)
            }
            Activation::Identity => x,
            Activation::Relu => x.max(0.0),
        }
    }
}

/// Linear `value * scale + shift` applied per input or output neuron
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub scale: f32,
    pub shift: f32,
}

/// Fully connected feed-forward network.
///
/// `weights[l]` holds the `(layer_sizes[l] + 1) x layer_sizes[l + 1]` matrix
/// between layers `l` and `l + 1`, row-major, with the bias as the last row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpModel {
    pub layer_sizes: Vec<usize>,
    pub activation: Activation,
    #[serde(default)]
    pub input_scale: Option<Vec<Scale>>,
    #[serde(default)]
    pub output_scale: Option<Vec<Scale>>,
    pub weights: Vec<Vec<f32>>,
}

impl MlpModel {
    /// Read and validate a JSON model file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let reader = BufReader::new(File::open(path)?);
        let model: MlpModel = serde_json::from_reader(reader)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let model: MlpModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn output_size(&self) -> usize {
        self.layer_sizes.last().copied().unwrap_or(0)
    }

    /// Check that every matrix and scale table matches the declared layer sizes
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.layer_sizes.len() < 2 {
            return Err(ModelError::Invalid(format!(
                "need at least 2 layers, found {}",
                self.layer_sizes.len()
            )));
        }
        if self.layer_sizes.contains(&0) {
            return Err(ModelError::Invalid("layer of size 0".to_string()));
        }
        if self.weights.len() != self.layer_sizes.len() - 1 {
            return Err(ModelError::Invalid(format!(
                "{} layers need {} weight matrices, found {}",
                self.layer_sizes.len(),
                self.layer_sizes.len() - 1,
                self.weights.len()
            )));
        }
        for (l, matrix) in self.weights.iter().enumerate() {
            let expected = (self.layer_sizes[l] + 1) * self.layer_sizes[l + 1];
            if matrix.len() != expected {
                return Err(ModelError::Invalid(format!(
                    "weight matrix {l} has {} values, expected {expected}",
                    matrix.len()
                )));
            }
        }
        if let Some(scale) = &self.input_scale {
            if scale.len() != self.layer_sizes[0] {
                return Err(ModelError::Invalid(format!(
                    "input scale has {} entries for {} inputs",
                    scale.len(),
                    self.layer_sizes[0]
                )));
            }
        }
        if let Some(scale) = &self.output_scale {
            if scale.len() != self.output_size() {
                return Err(ModelError::Invalid(format!(
                    "output scale has {} entries for {} outputs",
                    scale.len(),
                    self.output_size()
                )));
            }
        }
        Ok(())
    }

    fn forward_layer(&self, layer: usize, input: &[f32]) -> Vec<f32> {
        let n_out = self.layer_sizes[layer + 1];
        let matrix = &self.weights[layer];
        let bias = &matrix[input.len() * n_out..];
        (0..n_out)
            .map(|j| {
                let sum: f32 = input
                    .iter()
                    .enumerate()
                    .map(|(i, x)| x * matrix[i * n_out + j])
                    .sum();
                self.activation.apply(sum + bias[j])
            })
            .collect()
    }
}

impl ClassifierModel for MlpModel {
    fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    fn predict(&self, features: &[f32]) -> Vec<f32> {
        debug_assert_eq!(features.len(), self.input_size(), "feature vector length");
        let mut values: Vec<f32> = match &self.input_scale {
            Some(scale) => features
                .iter()
                .zip(scale)
                .map(|(x, s)| x * s.scale + s.shift)
                .collect(),
            None => features.iter().take(self.input_size()).copied().collect(),
        };
        values.resize(self.input_size(), 0.0);

        for layer in 0..self.weights.len() {
            values = self.forward_layer(layer, &values);
        }

        if let Some(scale) = &self.output_scale {
            for (v, s) in values.iter_mut().zip(scale) {
                *v = *v * s.scale + s.shift;
            }
        }
        values
    }
}

/// Index of the highest score; the first one wins ties and NaN never wins
pub fn select_class(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}
