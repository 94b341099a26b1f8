use crate::math::PaddedTensor;

use super::spec::{Extent, Plan};

/// Output buffer of one stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageBuffer {
    Map(PaddedTensor),
    Vector(Vec<f32>),
}

impl StageBuffer {
    fn allocate(extent: Extent) -> StageBuffer {
        match extent {
            Extent::Map { channels, height, width, padding } => {
                StageBuffer::Map(PaddedTensor::zeros(channels, height, width, padding))
            }
            Extent::Vector(len) => StageBuffer::Vector(vec![0.0; len]),
        }
    }

    fn extent(&self) -> Extent {
        match self {
            StageBuffer::Map(t) => {
                let (channels, height, width, padding) = t.dims();
                Extent::Map { channels, height, width, padding }
            }
            StageBuffer::Vector(v) => Extent::Vector(v.len()),
        }
    }
}

/// Per-inference scratch: one buffer per stage plus the running shape.
///
/// Buffers are sized once from a [`Plan`] and overwritten in place by every
/// forward pass, so a state can be reused across images without
/// reallocating. Each concurrent inference needs its own state.
#[derive(Debug, Clone)]
pub struct ActivationState {
    pub(crate) stages: Vec<StageBuffer>,
    /// Interior height of the last completed stage (1 for vectors).
    pub height: usize,
    /// Interior width of the last completed stage (1 for vectors).
    pub width: usize,
    /// Filter count of the last completed stage, or vector length.
    pub filters: usize,
}

impl ActivationState {
    pub fn new(plan: &Plan) -> ActivationState {
        let stages = plan.stages.iter().map(|s| StageBuffer::allocate(s.output)).collect();
        let mut state = ActivationState { stages, height: 0, width: 0, filters: 0 };
        state.reset(plan);
        state
    }

    /// Puts the running shape back to the network input.
    pub fn reset(&mut self, plan: &Plan) {
        self.height = plan.input.height;
        self.width = plan.input.width;
        self.filters = plan.input.channels;
    }

    /// True when every buffer has exactly the extent `plan` assigns it.
    pub fn fits(&self, plan: &Plan) -> bool {
        self.stages.len() == plan.stages.len()
            && self.stages.iter().zip(&plan.stages).all(|(a, s)| a.extent() == s.output)
    }

    pub(crate) fn record(&mut self, extent: Extent) {
        (self.filters, self.height, self.width) = match extent {
            Extent::Map { channels, height, width, .. } => (channels, height, width),
            Extent::Vector(len) => (len, 1, 1),
        };
    }

    /// Output of stage `index`, if it exists.
    pub fn stage(&self, index: usize) -> Option<&StageBuffer> {
        self.stages.get(index)
    }

    /// The last stage's output vector.
    pub fn output(&self) -> &[f32] {
        match self.stages.last() {
            Some(StageBuffer::Vector(v)) => v,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::spec::ArchitectureSpec;

    #[test]
    fn buffers_follow_the_plan() {
        let plan = ArchitectureSpec::deep().plan().unwrap();
        let state = ActivationState::new(&plan);
        assert!(state.fits(&plan));
        assert_eq!((state.filters, state.height, state.width), (3, 128, 128));
        match state.stage(1) {
            Some(StageBuffer::Map(t)) => {
                assert_eq!(t.dims(), (16, 32, 32, 1));
                assert!(t.border_is_zero());
            }
            other => panic!("unexpected stage buffer {other:?}"),
        }
        assert_eq!(state.output().len(), 10);
    }

    #[test]
    fn foreign_plan_does_not_fit() {
        let deep = ArchitectureSpec::deep().plan().unwrap();
        let shallow = ArchitectureSpec::shallow().plan().unwrap();
        assert!(!ActivationState::new(&shallow).fits(&deep));
    }
}
