use serde::{Deserialize, Serialize};

use stockflow_core::EngineError;

/// Stock movement status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
}

impl MovementStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [MovementStatus; 4] = [
        MovementStatus::Pending,
        MovementStatus::Approved,
        MovementStatus::Completed,
        MovementStatus::Cancelled,
    ];

    /// Legal next statuses for this status.
    ///
    /// This is the closed transition table (no implicit wildcard). Any
    /// affordance for choosing a next status must be built from this table;
    /// edges are never hand-listed anywhere else.
    pub fn next_states(self) -> &'static [MovementStatus] {
        match self {
            MovementStatus::Pending => &[
                MovementStatus::Approved,
                MovementStatus::Cancelled,
                MovementStatus::Completed,
            ],
            MovementStatus::Approved => &[
                MovementStatus::Pending,
                MovementStatus::Cancelled,
                MovementStatus::Completed,
            ],
            MovementStatus::Completed | MovementStatus::Cancelled => &[],
        }
    }

    /// A terminal status has no outgoing edges.
    pub fn is_terminal(self) -> bool {
        self.next_states().is_empty()
    }

    pub fn can_transition_to(self, target: MovementStatus) -> bool {
        self.next_states().contains(&target)
    }

    /// Movements may be deleted while pending, or while cancelled
    /// (terminal but deletable). Approved/completed movements are immutable
    /// except via further legal transitions.
    pub fn is_deletable(self) -> bool {
        matches!(self, MovementStatus::Pending | MovementStatus::Cancelled)
    }

    /// Synchronous legality check, run before any optimistic mutation or
    /// remote call.
    pub fn ensure_can_transition_to(self, target: MovementStatus) -> Result<(), EngineError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(EngineError::illegal_transition(format!("{self} -> {target}")))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementStatus::Pending => "pending",
            MovementStatus::Approved => "approved",
            MovementStatus::Completed => "completed",
            MovementStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_allows_approved_cancelled_completed() {
        let next = MovementStatus::Pending.next_states();
        assert_eq!(
            next,
            &[
                MovementStatus::Approved,
                MovementStatus::Cancelled,
                MovementStatus::Completed,
            ]
        );
    }

    #[test]
    fn approved_allows_pending_cancelled_completed() {
        let next = MovementStatus::Approved.next_states();
        assert_eq!(
            next,
            &[
                MovementStatus::Pending,
                MovementStatus::Cancelled,
                MovementStatus::Completed,
            ]
        );
    }

    #[test]
    fn completed_and_cancelled_are_terminal() {
        assert!(MovementStatus::Completed.next_states().is_empty());
        assert!(MovementStatus::Cancelled.next_states().is_empty());
        assert!(MovementStatus::Completed.is_terminal());
        assert!(MovementStatus::Cancelled.is_terminal());
        assert!(!MovementStatus::Pending.is_terminal());
        assert!(!MovementStatus::Approved.is_terminal());
    }

    #[test]
    fn self_loops_are_not_in_the_table() {
        for status in MovementStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn deletable_only_while_pending_or_cancelled() {
        assert!(MovementStatus::Pending.is_deletable());
        assert!(MovementStatus::Cancelled.is_deletable());
        assert!(!MovementStatus::Approved.is_deletable());
        assert!(!MovementStatus::Completed.is_deletable());
    }

    #[test]
    fn ensure_rejects_edges_outside_the_table() {
        let err = MovementStatus::Completed
            .ensure_can_transition_to(MovementStatus::Pending)
            .unwrap_err();
        match err {
            stockflow_core::EngineError::IllegalTransition(msg) => {
                assert!(msg.contains("completed -> pending"));
            }
            other => panic!("expected IllegalTransition, got {other:?}"),
        }

        assert!(
            MovementStatus::Pending
                .ensure_can_transition_to(MovementStatus::Approved)
                .is_ok()
        );
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&MovementStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        let back: MovementStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(back, MovementStatus::Approved);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = MovementStatus> {
            prop::sample::select(MovementStatus::ALL.to_vec())
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                // Use deterministic seed for CI reproducibility
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: terminal statuses admit no target at all.
            #[test]
            fn terminal_statuses_admit_no_target(
                from in any_status(),
                to in any_status()
            ) {
                if from.is_terminal() {
                    prop_assert!(!from.can_transition_to(to));
                    prop_assert!(from.ensure_can_transition_to(to).is_err());
                }
            }

            /// Property: `can_transition_to` agrees with membership in
            /// `next_states` for every pair.
            #[test]
            fn can_transition_matches_table_membership(
                from in any_status(),
                to in any_status()
            ) {
                let in_table = from.next_states().contains(&to);
                prop_assert_eq!(from.can_transition_to(to), in_table);
                prop_assert_eq!(from.ensure_can_transition_to(to).is_ok(), in_table);
            }
        }
    }
}
