//! Engine configuration.

/// How a partially failed bulk action is reported.
///
/// Either way the selection is cleared and the list resynced first; the
/// policy only decides what the caller is told afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialFailurePolicy {
    /// Any per-item failure is reported as a single remote failure.
    #[default]
    AllOrNothing,
    /// Failed item ids are returned in the bulk outcome and surfaced
    /// through the notifier.
    PerItem,
}

/// Tunables for the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    pub partial_failure: PartialFailurePolicy,
}
