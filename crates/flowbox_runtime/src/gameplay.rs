//! Gameplay object budgets: concurrent targets, obstacles, particles.
//!
//! The budget gates new spawns only. Shrinking the budget on a tier
//! step-down never evicts live objects; they drain naturally and the
//! gate keeps new ones out until the count is back under the cap.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use flowbox_quality::{ApplyError, OptimizationState, QualitySubscriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Target,
    Obstacle,
    Particle,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Target => "target",
            Self::Obstacle => "obstacle",
            Self::Particle => "particle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct BudgetState {
    max_targets: u32,
    max_obstacles: u32,
    max_particles: u32,
    live_targets: u32,
    live_obstacles: u32,
    live_particles: u32,
}

impl BudgetState {
    fn cap(&self, kind: ObjectKind) -> u32 {
        match kind {
            ObjectKind::Target => self.max_targets,
            ObjectKind::Obstacle => self.max_obstacles,
            ObjectKind::Particle => self.max_particles,
        }
    }

    fn live_mut(&mut self, kind: ObjectKind) -> &mut u32 {
        match kind {
            ObjectKind::Target => &mut self.live_targets,
            ObjectKind::Obstacle => &mut self.live_obstacles,
            ObjectKind::Particle => &mut self.live_particles,
        }
    }

    fn live(&self, kind: ObjectKind) -> u32 {
        match kind {
            ObjectKind::Target => self.live_targets,
            ObjectKind::Obstacle => self.live_obstacles,
            ObjectKind::Particle => self.live_particles,
        }
    }
}

/// Cloneable handle over the shared budget (single-threaded loop): one
/// clone registers with the applier, spawners keep their own.
#[derive(Debug, Clone, Default)]
pub struct ObjectBudget {
    inner: Rc<RefCell<BudgetState>>,
}

impl ObjectBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a slot for one object. False when the cap is reached.
    pub fn try_spawn(&self, kind: ObjectKind) -> bool {
        let mut inner = self.inner.borrow_mut();
        let cap = inner.cap(kind);
        let live = inner.live_mut(kind);
        if *live >= cap {
            return false;
        }
        *live += 1;
        true
    }

    /// Release a slot when an object despawns.
    pub fn release(&self, kind: ObjectKind) {
        let mut inner = self.inner.borrow_mut();
        let live = inner.live_mut(kind);
        *live = live.saturating_sub(1);
    }

    pub fn live(&self, kind: ObjectKind) -> u32 {
        self.inner.borrow().live(kind)
    }

    pub fn cap(&self, kind: ObjectKind) -> u32 {
        self.inner.borrow().cap(kind)
    }
}

impl QualitySubscriber for ObjectBudget {
    fn name(&self) -> &str {
        "gameplay_budget"
    }

    fn apply(&mut self, state: &OptimizationState) -> Result<(), ApplyError> {
        let mut inner = self.inner.borrow_mut();
        inner.max_targets = state.applied.max_targets;
        inner.max_obstacles = state.applied.max_obstacles;
        inner.max_particles = state.applied.max_particles;
        // Live counts are untouched; over-cap objects drain on release.
        Ok(())
    }
}
