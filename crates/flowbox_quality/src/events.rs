//! Bounded journal of quality control events.
//!
//! The core crate journals what it does instead of logging; whoever owns
//! the controller drains the journal and reports it (the demo binary
//! prints JSON lines).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::tier::{QualityTier, TierConfig};
use crate::types::{QualityEventId, TickTime};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityEvent {
    pub id: QualityEventId,
    pub time: TickTime,
    pub kind: QualityEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum QualityEventKind {
    TierChanged {
        from: QualityTier,
        to: QualityTier,
        config: TierConfig,
    },
    TierReapplied {
        tier: QualityTier,
    },
    SubsystemSkipped {
        subsystem: String,
        reason: String,
    },
    PartialSample,
    ControllerEnabled,
    ControllerDisabled,
}

/// Fixed-capacity event journal; the oldest event is evicted first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventJournal {
    events: VecDeque<QualityEvent>,
    capacity: usize,
    next_id: QualityEventId,
}

pub const DEFAULT_JOURNAL_CAPACITY: usize = 256;

impl Default for EventJournal {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_JOURNAL_CAPACITY)
    }
}

impl EventJournal {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            next_id: 0,
        }
    }

    pub fn record(&mut self, time: TickTime, kind: QualityEventKind) -> QualityEventId {
        let id = self.next_id;
        self.next_id += 1;
        self.events.push_back(QualityEvent { id, time, kind });
        while self.events.len() > self.capacity {
            self.events.pop_front();
        }
        id
    }

    pub fn events(&self) -> impl Iterator<Item = &QualityEvent> {
        self.events.iter()
    }

    pub fn latest(&self) -> Option<&QualityEvent> {
        self.events.back()
    }

    /// Remove and return all buffered events, oldest first.
    pub fn drain(&mut self) -> Vec<QualityEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
