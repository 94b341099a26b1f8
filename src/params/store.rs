use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ParamError;
use crate::network::spec::{ParamShape, Plan};

/// Weights and bias of one parametrised layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerParams {
    pub shape: ParamShape,
    /// Flattened in (out, in[, kernel_row, kernel_col]) order.
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

impl LayerParams {
    /// Weight `[out_filter][in_filter][row][col]` of a convolution layer.
    pub fn conv_weight(&self, out_f: usize, in_f: usize, row: usize, col: usize) -> Option<f32> {
        match self.shape {
            ParamShape::Conv { out_filters, in_filters, kernel }
                if out_f < out_filters && in_f < in_filters && row < kernel && col < kernel =>
            {
                self.weights.get(((out_f * in_filters + in_f) * kernel + row) * kernel + col).copied()
            }
            _ => None,
        }
    }

    /// Weight `[out_feature][in_feature]` of a fully-connected layer.
    pub fn dense_weight(&self, out_n: usize, in_i: usize) -> Option<f32> {
        match self.shape {
            ParamShape::Dense { out_features, in_features } if out_n < out_features && in_i < in_features => {
                self.weights.get(out_n * in_features + in_i).copied()
            }
            _ => None,
        }
    }
}

/// All weights and biases of an architecture, in plan order.
///
/// Built once and never mutated; share it between inferences behind an
/// `Arc` and give each inference its own `ActivationState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    layers: Vec<LayerParams>,
}

impl Parameters {
    /// Consumes a flat value stream in architecture order: for each
    /// parametrised layer its weights, then its bias.
    ///
    /// The stream carries no shape information; counts come from `plan`.
    /// Running dry mid-layer or leaving values unread is an error.
    pub fn load<I>(plan: &Plan, values: I) -> Result<Parameters, ParamError>
    where
        I: IntoIterator<Item = f32>,
    {
        let mut values = values.into_iter();
        let mut layers = Vec::new();

        for (stage, shape) in plan.param_stages() {
            let expected = shape.weight_len() + shape.bias_len();
            let weights: Vec<f32> = values.by_ref().take(shape.weight_len()).collect();
            let bias: Vec<f32> = values.by_ref().take(shape.bias_len()).collect();
            let found = weights.len() + bias.len();
            if found != expected {
                return Err(ParamError::Truncated { layer: stage.index, expected, found });
            }
            layers.push(LayerParams { shape, weights, bias });
        }

        let extra = values.count();
        if extra > 0 {
            return Err(ParamError::TrailingValues { extra });
        }

        debug!(architecture = %plan.name, values = plan.param_count(), "parameters loaded");
        Ok(Parameters { layers })
    }

    /// Like [`load`](Self::load) but parses every token as an `f32` first.
    pub fn load_tokens<'t, I>(plan: &Plan, tokens: I) -> Result<Parameters, ParamError>
    where
        I: IntoIterator<Item = &'t str>,
    {
        let values = tokens
            .into_iter()
            .enumerate()
            .map(|(index, token)| parse_token(index, token))
            .collect::<Result<Vec<f32>, ParamError>>()?;
        Parameters::load(plan, values)
    }

    /// Assembles parameters from already-shaped layers, checking each one
    /// against the architecture.
    pub fn from_layers(plan: &Plan, layers: Vec<LayerParams>) -> Result<Parameters, ParamError> {
        let params = Parameters { layers };
        params.check(plan)?;
        Ok(params)
    }

    /// Wraps layers that were generated from a plan and are shaped by construction.
    pub(crate) fn new_unchecked(layers: Vec<LayerParams>) -> Parameters {
        Parameters { layers }
    }

    /// Verifies these parameters were built for `plan`.
    pub fn check(&self, plan: &Plan) -> Result<(), ParamError> {
        let expected = plan.param_stages().count();
        if self.layers.len() != expected {
            return Err(ParamError::LayerCount { expected, found: self.layers.len() });
        }
        for ((stage, shape), layer) in plan.param_stages().zip(&self.layers) {
            let mismatch = |what, expected, found| ParamError::ShapeMismatch { layer: stage.index, what, expected, found };
            if layer.shape != shape {
                return Err(mismatch("shape", shape.weight_len(), layer.shape.weight_len()));
            }
            if layer.weights.len() != shape.weight_len() {
                return Err(mismatch("weights", shape.weight_len(), layer.weights.len()));
            }
            if layer.bias.len() != shape.bias_len() {
                return Err(mismatch("bias", shape.bias_len(), layer.bias.len()));
            }
        }
        Ok(())
    }

    /// Parameters of the `slot`-th parametrised layer.
    pub fn layer(&self, slot: usize) -> Option<&LayerParams> {
        self.layers.get(slot)
    }

    pub fn layers(&self) -> &[LayerParams] {
        &self.layers
    }

    /// Total number of stored values.
    pub fn element_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len() + l.bias.len()).sum()
    }

    /// Serializes the parameters to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ParamError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|source| io_error(path, source))?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    /// Deserializes parameters written by `save_json` and checks them against `plan`.
    pub fn load_json(plan: &Plan, path: impl AsRef<Path>) -> Result<Parameters, ParamError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| io_error(path, source))?;
        let params: Parameters = serde_json::from_reader(std::io::BufReader::new(file))?;
        params.check(plan)?;
        Ok(params)
    }
}

/// Parses one decimal literal; `inf` and `NaN` spellings are rejected.
pub(crate) fn parse_token(index: usize, token: &str) -> Result<f32, ParamError> {
    match token.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParamError::InvalidToken { index, token: token.to_owned() }),
    }
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> ParamError {
    ParamError::Io { path: path.to_path_buf(), source }
}
