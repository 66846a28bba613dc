//! Render settings subscriber: resolution scale and shadow quality.

use std::cell::RefCell;
use std::rc::Rc;

use flowbox_quality::{ApplyError, OptimizationState, QualitySubscriber, ShadowQuality};

#[derive(Debug, Clone, PartialEq)]
struct RenderState {
    resolution_scale: f64,
    shadow_quality: ShadowQuality,
    /// Hard ceiling of the display pipeline; tiers asking for more are
    /// rejected and skipped.
    max_resolution_scale: f64,
}

/// Cloneable handle over shared render state. The control loop is
/// single-threaded, so plain `Rc<RefCell<_>>` sharing is enough: one
/// clone registers with the applier, others read the applied values.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    inner: Rc<RefCell<RenderState>>,
}

impl RenderSettings {
    pub fn new(max_resolution_scale: f64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RenderState {
                resolution_scale: 1.0,
                shadow_quality: ShadowQuality::Medium,
                max_resolution_scale,
            })),
        }
    }

    pub fn resolution_scale(&self) -> f64 {
        self.inner.borrow().resolution_scale
    }

    pub fn shadow_quality(&self) -> ShadowQuality {
        self.inner.borrow().shadow_quality
    }
}

impl QualitySubscriber for RenderSettings {
    fn name(&self) -> &str {
        "render"
    }

    fn apply(&mut self, state: &OptimizationState) -> Result<(), ApplyError> {
        let mut inner = self.inner.borrow_mut();
        if state.applied.render_scale > inner.max_resolution_scale {
            return Err(ApplyError::OutOfRange {
                knob: "render_scale".to_string(),
                value: state.applied.render_scale,
                limit: inner.max_resolution_scale,
            });
        }
        inner.resolution_scale = state.applied.render_scale;
        inner.shadow_quality = state.applied.shadow_quality;
        Ok(())
    }
}
