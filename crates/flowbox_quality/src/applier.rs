//! Quality applier: the single `OptimizationState` and the subscriber
//! registry that pushes tier changes to dependent subsystems.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ApplyError;
use crate::events::{EventJournal, QualityEventKind};
use crate::tier::{QualityTier, TierConfig};
use crate::types::{SubscriberId, TickTime};

/// The currently applied tier plus the raw knob values in effect.
///
/// Exactly one exists per controller. Only the applier mutates it; all
/// other readers treat it as read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationState {
    pub tier: QualityTier,
    pub applied: TierConfig,
    /// Bumped on every application, including forced re-applications.
    pub revision: u64,
}

/// A subsystem that reacts to tier changes. Registration is explicit:
/// the applier never discovers subsystems at runtime.
pub trait QualitySubscriber {
    fn name(&self) -> &str;

    /// Push the new state into the subsystem. An error skips this
    /// subscriber only; the rest of the application proceeds.
    fn apply(&mut self, state: &OptimizationState) -> Result<(), ApplyError>;
}

/// A completed tier transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTransition {
    pub from: QualityTier,
    pub to: QualityTier,
    pub revision: u64,
}

pub struct QualityApplier {
    state: OptimizationState,
    subscribers: BTreeMap<SubscriberId, Box<dyn QualitySubscriber>>,
    next_subscriber_id: SubscriberId,
}

impl QualityApplier {
    pub fn new(initial_tier: QualityTier, initial_config: TierConfig) -> Self {
        Self {
            state: OptimizationState {
                tier: initial_tier,
                applied: initial_config,
                revision: 0,
            },
            subscribers: BTreeMap::new(),
            next_subscriber_id: 0,
        }
    }

    pub fn state(&self) -> &OptimizationState {
        &self.state
    }

    pub fn register(&mut self, subscriber: Box<dyn QualitySubscriber>) -> SubscriberId {
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;
        self.subscribers.insert(id, subscriber);
        id
    }

    pub fn unregister(&mut self, id: SubscriberId) -> Option<Box<dyn QualitySubscriber>> {
        self.subscribers.remove(&id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Apply `target` with its knob bundle. Idempotent: re-applying the
    /// active tier is a complete no-op — no subscriber calls, no journal
    /// entry, no revision bump. Returns the transition when one applied.
    pub fn apply_tier(
        &mut self,
        target: QualityTier,
        config: &TierConfig,
        now: TickTime,
        journal: &mut EventJournal,
    ) -> Option<TierTransition> {
        if target == self.state.tier && *config == self.state.applied {
            return None;
        }
        let from = self.state.tier;
        self.state.tier = target;
        self.state.applied = config.clone();
        self.state.revision += 1;

        journal.record(
            now,
            QualityEventKind::TierChanged {
                from,
                to: target,
                config: config.clone(),
            },
        );
        self.push_to_subscribers(now, journal);

        Some(TierTransition {
            from,
            to: target,
            revision: self.state.revision,
        })
    }

    /// Re-push the current state to every subscriber. Used after late
    /// registration so new subsystems pick up the active knob values.
    pub fn force_reapply(&mut self, now: TickTime, journal: &mut EventJournal) {
        self.state.revision += 1;
        journal.record(
            now,
            QualityEventKind::TierReapplied {
                tier: self.state.tier,
            },
        );
        self.push_to_subscribers(now, journal);
    }

    // Best-effort fan-out: a failing subscriber is journaled and
    // skipped, never fatal.
    fn push_to_subscribers(&mut self, now: TickTime, journal: &mut EventJournal) {
        for subscriber in self.subscribers.values_mut() {
            if let Err(err) = subscriber.apply(&self.state) {
                journal.record(
                    now,
                    QualityEventKind::SubsystemSkipped {
                        subsystem: subscriber.name().to_string(),
                        reason: err.to_string(),
                    },
                );
            }
        }
    }
}

impl std::fmt::Debug for QualityApplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityApplier")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::TierTable;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        name: String,
        applied: Rc<RefCell<Vec<QualityTier>>>,
        fail: bool,
    }

    impl QualitySubscriber for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn apply(&mut self, state: &OptimizationState) -> Result<(), ApplyError> {
            if self.fail {
                return Err(ApplyError::Unavailable {
                    reason: "not wired".to_string(),
                });
            }
            self.applied.borrow_mut().push(state.tier);
            Ok(())
        }
    }

    fn recorder(name: &str, fail: bool) -> (Recorder, Rc<RefCell<Vec<QualityTier>>>) {
        let applied = Rc::new(RefCell::new(Vec::new()));
        (
            Recorder {
                name: name.to_string(),
                applied: Rc::clone(&applied),
                fail,
            },
            applied,
        )
    }

    fn applier_at(tier: QualityTier) -> QualityApplier {
        let table = TierTable::default();
        QualityApplier::new(tier, table.get(tier).unwrap().clone())
    }

    #[test]
    fn apply_tier_updates_state_and_notifies_subscribers() {
        let table = TierTable::default();
        let mut applier = applier_at(QualityTier::High);
        let (sub, applied) = recorder("render", false);
        applier.register(Box::new(sub));

        let mut journal = EventJournal::default();
        let transition = applier
            .apply_tier(
                QualityTier::Medium,
                table.get(QualityTier::Medium).unwrap(),
                5,
                &mut journal,
            )
            .unwrap();

        assert_eq!(transition.from, QualityTier::High);
        assert_eq!(transition.to, QualityTier::Medium);
        assert_eq!(applier.state().tier, QualityTier::Medium);
        assert_eq!(applier.state().revision, 1);
        assert_eq!(applied.borrow().as_slice(), &[QualityTier::Medium]);
        assert!(matches!(
            journal.latest().unwrap().kind,
            QualityEventKind::TierChanged { .. }
        ));
    }

    #[test]
    fn reapplying_the_active_tier_is_a_no_op() {
        let table = TierTable::default();
        let mut applier = applier_at(QualityTier::Medium);
        let (sub, applied) = recorder("render", false);
        applier.register(Box::new(sub));

        let mut journal = EventJournal::default();
        let result = applier.apply_tier(
            QualityTier::Medium,
            table.get(QualityTier::Medium).unwrap(),
            5,
            &mut journal,
        );

        assert!(result.is_none());
        assert_eq!(applier.state().revision, 0);
        assert!(applied.borrow().is_empty());
        assert!(journal.is_empty());
    }

    #[test]
    fn failing_subscriber_is_skipped_not_fatal() {
        let table = TierTable::default();
        let mut applier = applier_at(QualityTier::High);
        let (broken, _) = recorder("physics", true);
        let (working, applied) = recorder("render", false);
        applier.register(Box::new(broken));
        applier.register(Box::new(working));

        let mut journal = EventJournal::default();
        let transition = applier.apply_tier(
            QualityTier::Medium,
            table.get(QualityTier::Medium).unwrap(),
            5,
            &mut journal,
        );

        assert!(transition.is_some());
        // The working subscriber still got the update.
        assert_eq!(applied.borrow().as_slice(), &[QualityTier::Medium]);
        let kinds: Vec<_> = journal.events().map(|e| &e.kind).collect();
        assert!(kinds.iter().any(|k| matches!(
            k,
            QualityEventKind::SubsystemSkipped { subsystem, .. } if subsystem == "physics"
        )));
    }

    #[test]
    fn unregistered_subscriber_no_longer_receives_updates() {
        let table = TierTable::default();
        let mut applier = applier_at(QualityTier::High);
        let (sub, applied) = recorder("render", false);
        let id = applier.register(Box::new(sub));
        assert!(applier.unregister(id).is_some());
        assert_eq!(applier.subscriber_count(), 0);

        let mut journal = EventJournal::default();
        applier.apply_tier(
            QualityTier::Medium,
            table.get(QualityTier::Medium).unwrap(),
            5,
            &mut journal,
        );
        assert!(applied.borrow().is_empty());
    }

    #[test]
    fn force_reapply_bumps_revision_and_pushes_current_state() {
        let mut applier = applier_at(QualityTier::Low);
        let (sub, applied) = recorder("render", false);
        applier.register(Box::new(sub));

        let mut journal = EventJournal::default();
        applier.force_reapply(9, &mut journal);

        assert_eq!(applier.state().revision, 1);
        assert_eq!(applied.borrow().as_slice(), &[QualityTier::Low]);
        assert_eq!(
            journal.latest().unwrap().kind,
            QualityEventKind::TierReapplied {
                tier: QualityTier::Low
            }
        );
    }
}
