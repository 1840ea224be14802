use crate::scene::spatial::Transformable;
use crate::scene::state::UpdateTime;

/// Per-node animation, advanced once per update before the transform
/// pipeline runs.
///
/// `target` is `None` for grouping nodes without transform state.
pub trait AnimationDriver: Send + Sync {
    fn advance(&mut self, time: &UpdateTime, target: Option<&mut dyn Transformable>);

    /// Finished drivers are dropped by the scene after their last advance.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Adapts a closure into an [`AnimationDriver`] that runs forever.
pub struct FnAnimation<F>(pub F);

impl<F> AnimationDriver for FnAnimation<F>
where
    F: FnMut(&UpdateTime, &mut dyn Transformable) + Send + Sync,
{
    fn advance(&mut self, time: &UpdateTime, target: Option<&mut dyn Transformable>) {
        if let Some(target) = target {
            (self.0)(time, target);
        }
    }
}
