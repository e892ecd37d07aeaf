//! Two-state guard for the animated drill-down swap. All zoom requests go
//! through `request`; while an animation is in flight every further click
//! is dropped, never queued.

use crate::model::NodeId;

/// Animation length in milliseconds.
pub const DURATION_MS: f64 = 750.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    Idle,
    Transitioning { elapsed_ms: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionController {
    phase: Phase,
}

impl Default for TransitionController {
    fn default() -> Self {
        Self { phase: Phase::Idle }
    }
}

impl TransitionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, Phase::Transitioning { .. })
    }

    /// Single entry point for zoom triggers. Returns the accepted target:
    /// `None` while transitioning (click dropped) or when there is no
    /// target to zoom to (stay idle).
    pub fn request(&mut self, target: Option<NodeId>) -> Option<NodeId> {
        if self.is_transitioning() {
            return None;
        }
        let target = target?;
        self.phase = Phase::Transitioning { elapsed_ms: 0.0 };
        Some(target)
    }

    /// Advances the animation clock. Returns true on the tick that
    /// completes the transition; a transition always runs to completion.
    pub fn tick(&mut self, dt_ms: f64) -> bool {
        match self.phase {
            Phase::Idle => false,
            Phase::Transitioning { elapsed_ms } => {
                let elapsed_ms = elapsed_ms + dt_ms;
                if elapsed_ms >= DURATION_MS {
                    self.phase = Phase::Idle;
                    true
                } else {
                    self.phase = Phase::Transitioning { elapsed_ms };
                    false
                }
            }
        }
    }

    /// Eased progress in [0, 1] while transitioning.
    pub fn progress(&self) -> Option<f64> {
        match self.phase {
            Phase::Idle => None,
            Phase::Transitioning { elapsed_ms } => {
                Some(ease_cubic_in_out(elapsed_ms / DURATION_MS))
            }
        }
    }
}

/// Symmetric cubic easing, the default easing of the animation this
/// replicates.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = (t * 2.0).clamp(0.0, 2.0);
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}
