/// Milliseconds since session start. Supplied by whatever drives the
/// control loop; the core never reads a wall clock itself.
pub type TickTime = u64;

/// Monotonically increasing journal event id.
pub type QualityEventId = u64;

/// Handle returned when a subsystem registers with the quality applier.
pub type SubscriberId = u64;
