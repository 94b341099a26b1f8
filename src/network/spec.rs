use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::ShapeError;
use crate::layers::Window;
use crate::math::output_size;

/// Describes one layer of an architecture.
///
/// `padding` on a spatial layer is the zero border already embedded in that
/// layer's *input*. The layer before it writes that border around its own
/// output, so the declaration lives in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayerSpec {
    Conv { out_channels: usize, kernel: usize, stride: usize, padding: usize },
    MaxPool { kernel: usize, stride: usize, padding: usize },
    /// Max pooling followed by filter/row/column linearisation.
    MaxPoolFlatten { kernel: usize, stride: usize, padding: usize },
    Dense { out_features: usize, activation: Activation },
}

impl LayerSpec {
    /// Input padding for spatial layers, `None` for dense ones.
    fn spatial_padding(&self) -> Option<usize> {
        match *self {
            LayerSpec::Conv { padding, .. }
            | LayerSpec::MaxPool { padding, .. }
            | LayerSpec::MaxPoolFlatten { padding, .. } => Some(padding),
            LayerSpec::Dense { .. } => None,
        }
    }
}

/// Shape of the tensor handed to the first layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    /// Zero border already embedded in the input tensor.
    pub padding: usize,
}

/// A fully serializable network topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureSpec {
    pub name: String,
    pub input: InputSpec,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
}

const RGB_128: InputSpec = InputSpec { channels: 3, height: 128, width: 128, padding: 1 };

impl ArchitectureSpec {
    /// One convolution and one flattening max-pool. Produces the 16·63·63
    /// pooled features rather than class logits.
    pub fn shallow() -> ArchitectureSpec {
        ArchitectureSpec {
            name: "shallow".to_owned(),
            input: RGB_128,
            layers: vec![
                LayerSpec::Conv { out_channels: 16, kernel: 3, stride: 2, padding: 1 },
                LayerSpec::MaxPoolFlatten { kernel: 2, stride: 1, padding: 0 },
            ],
        }
    }

    /// Three conv/pool pairs and three fully-connected layers ending in ten logits.
    pub fn deep() -> ArchitectureSpec {
        ArchitectureSpec {
            name: "deep".to_owned(),
            input: RGB_128,
            layers: vec![
                LayerSpec::Conv { out_channels: 16, kernel: 3, stride: 2, padding: 1 },
                LayerSpec::MaxPool { kernel: 2, stride: 2, padding: 0 },
                LayerSpec::Conv { out_channels: 32, kernel: 3, stride: 1, padding: 1 },
                LayerSpec::MaxPool { kernel: 2, stride: 2, padding: 0 },
                LayerSpec::Conv { out_channels: 64, kernel: 3, stride: 1, padding: 1 },
                LayerSpec::MaxPoolFlatten { kernel: 2, stride: 2, padding: 0 },
                LayerSpec::Dense { out_features: 128, activation: Activation::ReLU },
                LayerSpec::Dense { out_features: 64, activation: Activation::ReLU },
                LayerSpec::Dense { out_features: 10, activation: Activation::Identity },
            ],
        }
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes an `ArchitectureSpec` from a JSON file.
    pub fn load_json(path: &str) -> std::io::Result<ArchitectureSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Walks the layers applying the shape law and resolves every stage's
    /// input/output extent, look-ahead padding and parameter shape.
    pub fn plan(&self) -> Result<Plan, ShapeError> {
        let InputSpec { channels, height, width, padding } = self.input;
        if channels == 0 || height == 0 || width == 0 {
            return Err(ShapeError::EmptyInput);
        }
        let first = self.layers.first().ok_or(ShapeError::NoLayers)?;
        if let Some(layer) = first.spatial_padding() {
            if layer != padding {
                return Err(ShapeError::InputPadding { input: padding, layer });
            }
        }

        let mut current = Extent::Map { channels, height, width, padding };
        let mut stages = Vec::with_capacity(self.layers.len());
        let mut param_slots = 0;

        for (index, layer) in self.layers.iter().enumerate() {
            let new_padding = self
                .layers
                .get(index + 1)
                .and_then(LayerSpec::spatial_padding)
                .unwrap_or(0);

            let (kind, output, params) = match *layer {
                LayerSpec::Conv { out_channels, kernel, stride, .. } => {
                    require(index, "out_channels", out_channels)?;
                    let window = window(index, kernel, stride)?;
                    let (in_channels, h, w) = pooled(index, current, window)?;
                    let output = Extent::Map { channels: out_channels, height: h, width: w, padding: new_padding };
                    let params = ParamShape::Conv { out_filters: out_channels, in_filters: in_channels, kernel };
                    product(index, &[out_channels, in_channels, kernel, kernel])?;
                    (StageKind::Conv(window), output, Some(params))
                }
                LayerSpec::MaxPool { kernel, stride, .. } => {
                    let window = window(index, kernel, stride)?;
                    let (channels, h, w) = pooled(index, current, window)?;
                    let output = Extent::Map { channels, height: h, width: w, padding: new_padding };
                    (StageKind::MaxPool(window), output, None)
                }
                LayerSpec::MaxPoolFlatten { kernel, stride, .. } => {
                    let window = window(index, kernel, stride)?;
                    let (channels, h, w) = pooled(index, current, window)?;
                    let len = product(index, &[channels, h, w])?;
                    (StageKind::MaxPoolFlatten(window), Extent::Vector(len), None)
                }
                LayerSpec::Dense { out_features, activation } => {
                    require(index, "out_features", out_features)?;
                    let in_features = match current {
                        Extent::Vector(len) => len,
                        Extent::Map { .. } => return Err(ShapeError::DenseBeforeFlatten { layer: index }),
                    };
                    let params = ParamShape::Dense { out_features, in_features };
                    product(index, &[out_features, in_features])?;
                    (StageKind::Dense(activation), Extent::Vector(out_features), Some(params))
                }
            };

            let param_slot = params.map(|_| {
                param_slots += 1;
                param_slots - 1
            });
            stages.push(Stage { index, kind, input: current, output, params, param_slot });
            current = output;
        }

        if let Extent::Map { .. } = current {
            return Err(ShapeError::SpatialOutput { layer: self.layers.len() - 1 });
        }
        Ok(Plan { name: self.name.clone(), input: self.input, stages })
    }
}

fn require(layer: usize, field: &'static str, value: usize) -> Result<(), ShapeError> {
    if value == 0 {
        return Err(ShapeError::ZeroParameter { layer, field });
    }
    Ok(())
}

fn window(layer: usize, kernel: usize, stride: usize) -> Result<Window, ShapeError> {
    require(layer, "kernel", kernel)?;
    require(layer, "stride", stride)?;
    Ok(Window { kernel, stride })
}

/// Applies the shape law to a spatial input; returns (channels, height, width).
fn pooled(layer: usize, input: Extent, window: Window) -> Result<(usize, usize, usize), ShapeError> {
    let Extent::Map { channels, height, width, padding } = input else {
        return Err(ShapeError::SpatialAfterFlatten { layer });
    };
    let padded = |dim: usize| {
        padding
            .checked_mul(2)
            .and_then(|border| dim.checked_add(border))
            .ok_or(ShapeError::Overflow { layer })
    };
    let too_large = |extent| ShapeError::KernelTooLarge { layer, kernel: window.kernel, extent };
    let (padded_h, padded_w) = (padded(height)?, padded(width)?);
    product(layer, &[channels, padded_h, padded_w])?;
    let h = output_size(height, padding, window.kernel, window.stride).ok_or(too_large(padded_h))?;
    let w = output_size(width, padding, window.kernel, window.stride).ok_or(too_large(padded_w))?;
    Ok((channels, h, w))
}

/// Product of `dims`, or `Overflow` if it does not fit a `usize`.
fn product(layer: usize, dims: &[usize]) -> Result<usize, ShapeError> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(ShapeError::Overflow { layer })
}

/// Extent of one stage's activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Interior `height × width` per channel plus an embedded border.
    Map { channels: usize, height: usize, width: usize, padding: usize },
    Vector(usize),
}

/// Weight/bias shape a stage expects from the parameter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ParamShape {
    /// Weights are (out_filters, in_filters, kernel, kernel).
    Conv { out_filters: usize, in_filters: usize, kernel: usize },
    /// Weights are (out_features, in_features).
    Dense { out_features: usize, in_features: usize },
}

impl ParamShape {
    pub fn weight_len(&self) -> usize {
        match *self {
            ParamShape::Conv { out_filters, in_filters, kernel } => out_filters * in_filters * kernel * kernel,
            ParamShape::Dense { out_features, in_features } => out_features * in_features,
        }
    }

    pub fn bias_len(&self) -> usize {
        match *self {
            ParamShape::Conv { out_filters, .. } => out_filters,
            ParamShape::Dense { out_features, .. } => out_features,
        }
    }

    /// Inputs feeding one output unit; used as fan-in for initialisation.
    pub fn fan_in(&self) -> usize {
        self.weight_len() / self.bias_len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Conv(Window),
    MaxPool(Window),
    MaxPoolFlatten(Window),
    Dense(Activation),
}

/// One resolved pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Position in the layer list, starting at 0.
    pub index: usize,
    pub kind: StageKind,
    pub input: Extent,
    pub output: Extent,
    pub params: Option<ParamShape>,
    /// Position among parametrised stages; indexes [`Parameters`](crate::params::Parameters).
    pub param_slot: Option<usize>,
}

impl Stage {
    /// Conventional layer name, numbered from 1: `conv1`, `pool2`, `fc7`, ...
    pub fn name(&self) -> String {
        let prefix = match self.kind {
            StageKind::Conv(_) => "conv",
            StageKind::MaxPool(_) | StageKind::MaxPoolFlatten(_) => "pool",
            StageKind::Dense(_) => "fc",
        };
        format!("{prefix}{}", self.index + 1)
    }
}

/// A validated architecture: every stage with its dimensions resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub name: String,
    pub input: InputSpec,
    pub stages: Vec<Stage>,
}

impl Plan {
    /// Stages that read weights and biases, in parameter-file order.
    pub fn param_stages(&self) -> impl Iterator<Item = (&Stage, ParamShape)> + '_ {
        self.stages.iter().filter_map(|s| s.params.map(|p| (s, p)))
    }

    /// Total number of weight and bias values the architecture consumes.
    pub fn param_count(&self) -> usize {
        self.param_stages().map(|(_, p)| p.weight_len() + p.bias_len()).sum()
    }

    /// Length of the final output vector (logits for a classifier).
    pub fn output_len(&self) -> usize {
        match self.stages.last().map(|s| s.output) {
            Some(Extent::Vector(len)) => len,
            _ => 0,
        }
    }
}
