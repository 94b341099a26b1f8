use std::path::PathBuf;

use thiserror::Error;

/// Problems found while turning an `ArchitectureSpec` into an executable plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("architecture has no layers")]
    NoLayers,
    #[error("layer {layer}: {field} must be at least 1")]
    ZeroParameter { layer: usize, field: &'static str },
    #[error("layer {layer}: kernel {kernel} does not fit a padded extent of {extent}")]
    KernelTooLarge { layer: usize, kernel: usize, extent: usize },
    #[error("input declares padding {input} but the first layer expects {layer}")]
    InputPadding { input: usize, layer: usize },
    #[error("layer {layer}: spatial layer follows a flattened stage")]
    SpatialAfterFlatten { layer: usize },
    #[error("layer {layer}: dense layer needs a flattened input")]
    DenseBeforeFlatten { layer: usize },
    #[error("input must have at least one channel, row and column")]
    EmptyInput,
    #[error("layer {layer}: network ends on a spatial stage, last layer must flatten or be dense")]
    SpatialOutput { layer: usize },
    #[error("layer {layer}: dimensions overflow usize")]
    Overflow { layer: usize },
}

/// Failures while reading a parameter stream or file.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("parameter stream ended inside layer {layer}: expected {expected} values, found {found}")]
    Truncated { layer: usize, expected: usize, found: usize },
    #[error("parameter stream has {extra} values beyond the architecture")]
    TrailingValues { extra: usize },
    #[error("token {index} ({token:?}) is not a floating-point literal")]
    InvalidToken { index: usize, token: String },
    #[error("group {group} ({name}) holds {found} values, expected {expected}")]
    GroupLength { group: usize, name: String, expected: usize, found: usize },
    #[error("parameter file ends before group {group} ({name})")]
    MissingGroup { group: usize, name: String },
    #[error("parameter file has {extra} non-empty lines beyond the last group")]
    TrailingGroups { extra: usize },
    #[error("layer {layer}: {what} has {found} values, architecture declares {expected}")]
    ShapeMismatch { layer: usize, what: &'static str, expected: usize, found: usize },
    #[error("parameters cover {found} layers, architecture has {expected}")]
    LayerCount { expected: usize, found: usize },
    #[error("cannot read parameters from {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("malformed parameter json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Contract violations detected before a forward pass starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("input tensor is {found:?} (channels, height, width, padding), network expects {expected:?}")]
    InputShape { expected: (usize, usize, usize, usize), found: (usize, usize, usize, usize) },
    #[error("input tensor has a non-zero value in its padding border")]
    DirtyBorder,
    #[error("activation state was allocated for a different architecture")]
    StateMismatch,
    #[error("network output is empty")]
    EmptyOutput,
    #[error("network produces {outputs} outputs but {labels} labels were given")]
    LabelCount { outputs: usize, labels: usize },
    #[error("class index {index} has no label ({labels} labels known)")]
    UnknownLabel { index: usize, labels: usize },
}

/// Rejections when a serialized tensor is read back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TensorError {
    #[error("tensor buffer holds {found} values, its dimensions need {expected}")]
    Length { expected: usize, found: usize },
    #[error("tensor dimensions overflow usize")]
    Overflow,
    #[error("tensor has a non-zero value in its padding border")]
    DirtyBorder,
}

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("network input needs {0} channels, images provide 3")]
    Channels(usize),
    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Umbrella error for callers that drive the whole pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}
