use std::sync::Arc;

use tracing::{debug, trace_span};

use crate::error::{Error, InferenceError};
use crate::layers::{conv2d, dense, max_pool2d, max_pool2d_flatten};
use crate::math::PaddedTensor;
use crate::params::Parameters;

use super::labels::LabelSet;
use super::spec::{ArchitectureSpec, Plan, StageKind};
use super::state::{ActivationState, StageBuffer};

/// Input of a stage: the network input or the previous stage's buffer.
enum Source<'a> {
    Map(&'a PaddedTensor),
    Vector(&'a [f32]),
}

/// A validated architecture bound to its parameters.
///
/// `Network` is immutable and `Sync`; clone it or share it by reference
/// across threads, giving each thread its own [`ActivationState`].
#[derive(Debug, Clone)]
pub struct Network {
    spec: ArchitectureSpec,
    plan: Plan,
    params: Arc<Parameters>,
}

impl Network {
    /// Plans `spec` and checks that `params` match it layer by layer.
    pub fn new(spec: ArchitectureSpec, params: impl Into<Arc<Parameters>>) -> Result<Network, Error> {
        let plan = spec.plan()?;
        let params = params.into();
        params.check(&plan)?;
        Ok(Network { spec, plan, params })
    }

    pub fn spec(&self) -> &ArchitectureSpec {
        &self.spec
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    /// Allocates every stage buffer this network needs.
    pub fn new_state(&self) -> ActivationState {
        ActivationState::new(&self.plan)
    }

    /// Runs every stage once, in order, and returns the final vector.
    ///
    /// For a classifier this is the logits; the shallow preset returns its
    /// flattened pooled features instead.
    pub fn forward<'s>(
        &self,
        input: &PaddedTensor,
        state: &'s mut ActivationState,
    ) -> Result<&'s [f32], InferenceError> {
        let spec = self.plan.input;
        let expected = (spec.channels, spec.height, spec.width, spec.padding);
        if input.dims() != expected {
            return Err(InferenceError::InputShape { expected, found: input.dims() });
        }
        if !input.border_is_zero() {
            return Err(InferenceError::DirtyBorder);
        }
        if !state.fits(&self.plan) {
            return Err(InferenceError::StateMismatch);
        }

        let _span = trace_span!("forward", architecture = %self.plan.name).entered();
        state.reset(&self.plan);

        for stage in &self.plan.stages {
            let (done, rest) = state.stages.split_at_mut(stage.index);
            let source = match done.last() {
                None => Source::Map(input),
                Some(StageBuffer::Map(t)) => Source::Map(t),
                Some(StageBuffer::Vector(v)) => Source::Vector(v),
            };
            let params = stage.param_slot.and_then(|slot| self.params.layer(slot));

            match (stage.kind, source, &mut rest[0], params) {
                (StageKind::Conv(window), Source::Map(x), StageBuffer::Map(y), Some(p)) => {
                    conv2d(x, &p.weights, &p.bias, window, y)
                }
                (StageKind::MaxPool(window), Source::Map(x), StageBuffer::Map(y), None) => max_pool2d(x, window, y),
                (StageKind::MaxPoolFlatten(window), Source::Map(x), StageBuffer::Vector(y), None) => {
                    max_pool2d_flatten(x, window, y)
                }
                (StageKind::Dense(activation), Source::Vector(x), StageBuffer::Vector(y), Some(p)) => {
                    dense(x, &p.weights, &p.bias, activation, y)
                }
                _ => unreachable!("stage {} buffers disagree with its plan", stage.name()),
            }

            state.record(stage.output);
            debug!(
                stage = %stage.name(),
                filters = state.filters,
                height = state.height,
                width = state.width,
                "stage done"
            );
        }

        Ok(state.output())
    }

    /// Forward pass followed by [`argmax`] over the final vector.
    pub fn predict(&self, input: &PaddedTensor, state: &mut ActivationState) -> Result<usize, InferenceError> {
        let logits = self.forward(input, state)?;
        argmax(logits).ok_or(InferenceError::EmptyOutput)
    }

    /// Fails unless `labels` names every output of this network.
    pub fn check_labels(&self, labels: &LabelSet) -> Result<(), InferenceError> {
        let outputs = self.plan.output_len();
        if outputs != labels.len() {
            return Err(InferenceError::LabelCount { outputs, labels: labels.len() });
        }
        Ok(())
    }

    /// Predicts and translates the class index through `labels`.
    pub fn classify<'l>(
        &self,
        input: &PaddedTensor,
        state: &mut ActivationState,
        labels: &'l LabelSet,
    ) -> Result<(usize, &'l str), InferenceError> {
        let index = self.predict(input, state)?;
        let label = labels
            .get(index)
            .ok_or(InferenceError::UnknownLabel { index, labels: labels.len() })?;
        Ok((index, label))
    }
}

/// Index of the largest value; the first of several equal maxima wins.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let (first, rest) = values.split_first()?;
    let mut max_ind = 0;
    let mut max_val = *first;
    for (i, &v) in rest.iter().enumerate() {
        if v > max_val {
            max_ind = i + 1;
            max_val = v;
        }
    }
    Some(max_ind)
}
