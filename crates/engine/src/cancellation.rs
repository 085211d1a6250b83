//! Cancellation flow: mandatory reason capture before the `cancelled`
//! transition.

use stockflow_core::{EngineError, MovementId};
use stockflow_movements::{MovementStatus, StockMovement};

use crate::controller::{TransitionEngine, TransitionOutcome};
use crate::notify::Notifier;
use crate::remote::MovementActions;

/// Upper bound on the cancellation reason length.
pub const MAX_REASON_LEN: usize = 250;

/// Synchronous side-channel collecting the cancellation reason.
///
/// `None` means the operator aborted the prompt.
pub trait ReasonPrompt: Send + Sync {
    fn request_reason(&self, movement: &StockMovement) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationOutcome {
    /// The operator aborted the prompt; no transition was attempted and no
    /// state was touched.
    Aborted,
    Applied(StockMovement),
    Superseded,
}

/// Orchestrates reason capture ahead of the `cancelled` transition.
///
/// Cancelling is the only transition with a side-channel; every other target
/// status goes straight to the controller.
#[derive(Debug)]
pub struct CancellationFlow<P> {
    prompt: P,
}

impl<P> CancellationFlow<P>
where
    P: ReasonPrompt,
{
    pub fn new(prompt: P) -> Self {
        Self { prompt }
    }

    pub async fn run<A, N>(
        &self,
        engine: &TransitionEngine<A, N>,
        id: MovementId,
    ) -> Result<CancellationOutcome, EngineError>
    where
        A: MovementActions,
        N: Notifier,
    {
        let movement = engine.store().get(id).ok_or_else(EngineError::not_found)?;

        let Some(raw) = self.prompt.request_reason(&movement) else {
            return Ok(CancellationOutcome::Aborted);
        };
        let reason = validate_reason(&raw)?;

        match engine
            .apply_transition(id, MovementStatus::Cancelled, Some(reason))
            .await?
        {
            TransitionOutcome::Applied(movement) => Ok(CancellationOutcome::Applied(movement)),
            TransitionOutcome::Superseded => Ok(CancellationOutcome::Superseded),
        }
    }
}

fn validate_reason(raw: &str) -> Result<String, EngineError> {
    let reason = raw.trim();
    if reason.is_empty() {
        return Err(EngineError::validation(
            "cancellation reason cannot be empty",
        ));
    }
    if reason.chars().count() > MAX_REASON_LEN {
        return Err(EngineError::validation(format!(
            "cancellation reason must be at most {MAX_REASON_LEN} characters"
        )));
    }
    Ok(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_accepts_reasonable_text() {
        assert_eq!(
            validate_reason("  Damaged in transit  ").unwrap(),
            "Damaged in transit"
        );
    }

    #[test]
    fn rejects_blank_reasons() {
        assert!(matches!(
            validate_reason("   "),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn rejects_overlong_reasons() {
        let raw = "x".repeat(MAX_REASON_LEN + 1);
        assert!(matches!(
            validate_reason(&raw),
            Err(EngineError::Validation(_))
        ));

        let raw = "x".repeat(MAX_REASON_LEN);
        assert!(validate_reason(&raw).is_ok());
    }
}
