//! Physics settings subscriber: solver iteration count.

use std::cell::RefCell;
use std::rc::Rc;

use flowbox_quality::{ApplyError, OptimizationState, QualitySubscriber};

#[derive(Debug, Clone, PartialEq)]
struct PhysicsState {
    solver_iterations: u32,
    /// Ceiling of the physics backend; tiers asking for more are
    /// clamped, not rejected.
    max_solver_iterations: u32,
}

/// Cloneable handle over shared physics state (single-threaded loop).
#[derive(Debug, Clone)]
pub struct PhysicsSettings {
    inner: Rc<RefCell<PhysicsState>>,
}

impl PhysicsSettings {
    pub fn new(max_solver_iterations: u32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PhysicsState {
                solver_iterations: max_solver_iterations.min(6),
                max_solver_iterations,
            })),
        }
    }

    pub fn solver_iterations(&self) -> u32 {
        self.inner.borrow().solver_iterations
    }
}

impl QualitySubscriber for PhysicsSettings {
    fn name(&self) -> &str {
        "physics"
    }

    fn apply(&mut self, state: &OptimizationState) -> Result<(), ApplyError> {
        let mut inner = self.inner.borrow_mut();
        inner.solver_iterations = state
            .applied
            .physics_iterations
            .min(inner.max_solver_iterations);
        Ok(())
    }
}
