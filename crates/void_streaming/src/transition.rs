//! Transition coordinator - sequences a full level-to-level move
//!
//! ```text
//! revoke input -> close effects -> deactivate old level -> ensure residency
//!   -> prepare new level -> (blend wait) -> open effects -> activate new level
//!   -> restore input
//! ```
//!
//! Only one transition runs at a time; a request made while another is in
//! flight is rejected. When a transition stops after the effects closed, the
//! coordinator is left `Degraded`: input stays revoked and the effects stay
//! closed until a later transition succeeds.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::join_all;
use void_level_graph::LevelId;

use crate::effects::{Timer, TransitionEffect};
use crate::error::{LevelError, LevelResult};
use crate::events::LevelEvent;
use crate::navigation::{PlacementSpec, Trail};
use crate::orchestrator::LoadingOrchestrator;
use crate::subject::{InputControl, PlacementSubject};

/// Coordinator state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionState {
    #[default]
    Idle,
    Transitioning,
    /// The last transition aborted with input revoked and effects closed
    Degraded,
}

/// Step at which a transition aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStage {
    Residency,
    Resolve,
    Prepare,
    Activate,
}

/// Drives level transitions for one orchestrator
pub struct TransitionCoordinator {
    orchestrator: Rc<LoadingOrchestrator>,
    input: Rc<dyn InputControl>,
    effects: Vec<Rc<dyn TransitionEffect>>,
    timer: Option<Rc<dyn Timer>>,
    blend_wait: Duration,
    state: Cell<TransitionState>,
}

impl TransitionCoordinator {
    /// Create a coordinator with no effects and no blend wait
    pub fn new(orchestrator: Rc<LoadingOrchestrator>, input: Rc<dyn InputControl>) -> Self {
        Self {
            orchestrator,
            input,
            effects: Vec::new(),
            timer: None,
            blend_wait: Duration::ZERO,
            state: Cell::new(TransitionState::Idle),
        }
    }

    /// Add a close/open visual effect
    pub fn with_effect(mut self, effect: Rc<dyn TransitionEffect>) -> Self {
        self.effects.push(effect);
        self
    }

    /// Wait `blend_wait` on `timer` between preparing and opening
    pub fn with_timer(mut self, timer: Rc<dyn Timer>, blend_wait: Duration) -> Self {
        self.timer = Some(timer);
        self.blend_wait = blend_wait;
        self
    }

    pub fn state(&self) -> TransitionState {
        self.state.get()
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.get() == TransitionState::Transitioning
    }

    pub fn orchestrator(&self) -> &Rc<LoadingOrchestrator> {
        &self.orchestrator
    }

    /// Move `subject` into `target`, placed according to `spec`
    pub async fn transition_to(
        &self,
        target: &LevelId,
        subject: &Rc<dyn PlacementSubject>,
        spec: &PlacementSpec,
    ) -> LevelResult<Trail> {
        if self.is_transitioning() {
            log::warn!("TransitionCoordinator: rejected transition to {}, another is in progress", target);
            return Err(LevelError::TransitionInProgress);
        }
        if !self.orchestrator.catalog().contains(target) {
            log::error!("TransitionCoordinator: unknown target level {}", target);
            return Err(LevelError::UnknownLevel(target.clone()));
        }

        self.state.set(TransitionState::Transitioning);
        log::info!("TransitionCoordinator: transition to {} started", target);
        self.orchestrator
            .events()
            .emit(LevelEvent::TransitionStarted { target: target.clone() });

        self.input.revoke_input();
        join_all(self.effects.iter().map(|effect| effect.close())).await;

        self.orchestrator.deactivate_current();

        match self.orchestrator.ensure_residency(target).await {
            Ok(report) if !report.is_complete() => {
                log::warn!(
                    "TransitionCoordinator: {} levels failed to load around {}, continuing",
                    report.failed.len(),
                    target
                );
            }
            Ok(_) => {}
            Err(err) => return Err(self.abort(target, TransitionStage::Residency, err)),
        }

        let Some(controller) = self.orchestrator.controller(target) else {
            return Err(self.abort(
                target,
                TransitionStage::Resolve,
                LevelError::NotResident(target.clone()),
            ));
        };

        let prepared = controller.prepare(subject, spec);
        let trail = match prepared {
            Ok(trail) => trail,
            Err(err) => return Err(self.abort(target, TransitionStage::Prepare, err)),
        };

        if let Some(timer) = &self.timer {
            if !self.blend_wait.is_zero() {
                timer.wait(self.blend_wait).await;
            }
        }

        join_all(self.effects.iter().map(|effect| effect.open())).await;

        let activated = controller.activate();
        if let Err(err) = activated {
            return Err(self.abort(target, TransitionStage::Activate, err));
        }
        self.orchestrator.set_current(&controller);

        self.input.restore_input();
        self.state.set(TransitionState::Idle);
        log::info!("TransitionCoordinator: transition to {} ended", target);
        self.orchestrator
            .events()
            .emit(LevelEvent::TransitionEnded { target: target.clone() });

        Ok(trail)
    }

    fn abort(&self, target: &LevelId, stage: TransitionStage, source: LevelError) -> LevelError {
        log::error!(
            "TransitionCoordinator: transition to {} aborted at {:?}: {}",
            target,
            stage,
            source
        );
        self.state.set(TransitionState::Degraded);
        self.orchestrator.events().emit(LevelEvent::TransitionAborted {
            target: target.clone(),
            stage,
        });
        LevelError::TransitionAborted {
            target: target.clone(),
            stage,
            source: Box::new(source),
        }
    }
}
