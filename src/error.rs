//! Errors surfaced by a sorting cycle.

use crate::ledger::LedgerError;

/// Errors that abort a cycle.
///
/// `E` is the error type of the [`ArmAdapter`](crate::ArmAdapter) in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleError<E> {
    /// The arm or a sensor reported a failure. The block in progress is
    /// abandoned. Ledger counts reflect every release and retrieval that
    /// completed before the failure.
    Arm(E),

    /// No block showed up within the configured presence timeout.
    SensorTimeout,

    /// A ledger precondition was broken. Indicates a bug; the loop stops.
    Ledger(LedgerError),
}

impl<E> CycleError<E> {
    /// Returns true if the control loop must not continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CycleError::Ledger(_))
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            CycleError::Arm(_) => "arm failure",
            CycleError::SensorTimeout => "sensor timeout",
            CycleError::Ledger(_) => "ledger invariant violated",
        }
    }
}

impl<E> From<LedgerError> for CycleError<E> {
    fn from(err: LedgerError) -> Self {
        CycleError::Ledger(err)
    }
}

impl<E: core::fmt::Display> core::fmt::Display for CycleError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CycleError::Arm(err) => write!(f, "arm error: {}", err),
            CycleError::SensorTimeout => write!(f, "timed out waiting for a block"),
            CycleError::Ledger(err) => write!(f, "ledger invariant violated: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<E: core::fmt::Debug + core::fmt::Display> std::error::Error for CycleError<E> {}
