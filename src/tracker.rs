//! Completion tracker: detects finished units and starts new ones.

use crate::config::{ResetPolicy, ResetTrigger, SorterConfig};
use crate::ledger::InventoryLedger;
use crate::types::BlockColor;

/// Build progress of the current unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackerState {
    /// At least one column is still missing layers.
    Building,
    /// Every column holds its full sequence. Waiting for the reset trigger.
    AllComplete,
}

/// Two-state machine stepped twice per block: the reset check runs as soon
/// as the block's color is known, the completion check after the flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionTracker {
    state: TrackerState,
    trigger: BlockColor,
    policy: ResetPolicy,
    units_completed: u32,
}

impl CompletionTracker {
    /// Creates a tracker in `Building` state.
    pub fn new(trigger: BlockColor, policy: ResetPolicy) -> Self {
        Self {
            state: TrackerState::Building,
            trigger,
            policy,
            units_completed: 0,
        }
    }

    /// Creates a tracker using the trigger color and policy from `config`.
    pub fn from_config<const COLS: usize, const LAYERS: usize>(
        config: &SorterConfig<COLS, LAYERS>,
    ) -> Self {
        Self::new(config.reset_trigger(), config.reset_policy())
    }

    /// Starts a new unit if the previous one is complete and a block of
    /// `color` meets the reset trigger.
    ///
    /// Must run before the block is placed, so a trigger-colored block lands
    /// on the fresh columns instead of being stashed. Returns true if the
    /// columns were reset.
    pub fn maybe_reset<const COLS: usize>(
        &mut self,
        color: BlockColor,
        ledger: &mut InventoryLedger<COLS>,
    ) -> bool {
        if self.state != TrackerState::AllComplete || !self.trigger_met(color, ledger) {
            return false;
        }

        info!("reset trigger {} seen, starting new unit", self.trigger);
        ledger.reset_all(self.policy.clear_buffers);
        self.state = TrackerState::Building;
        true
    }

    /// Moves to `AllComplete` once every column is full.
    ///
    /// Returns true only in the cycle a unit completes.
    pub fn check_completion<const COLS: usize>(&mut self, ledger: &InventoryLedger<COLS>) -> bool {
        if self.state != TrackerState::Building || !ledger.all_complete() {
            return false;
        }

        self.state = TrackerState::AllComplete;
        self.units_completed = self.units_completed.saturating_add(1);
        info!("unit {} complete", self.units_completed);
        true
    }

    /// Both checks back to back, for bookkeeping without an arm: a reset for
    /// `last_color` followed by the completion check.
    ///
    /// Returns true only in the cycle a unit completes.
    pub fn check_and_maybe_reset<const COLS: usize>(
        &mut self,
        last_color: BlockColor,
        ledger: &mut InventoryLedger<COLS>,
    ) -> bool {
        self.maybe_reset(last_color, ledger);
        self.check_completion(ledger)
    }

    fn trigger_met<const COLS: usize>(
        &self,
        last_color: BlockColor,
        ledger: &InventoryLedger<COLS>,
    ) -> bool {
        if last_color == self.trigger {
            return true;
        }

        match self.policy.trigger {
            ResetTrigger::OnArrival => false,
            ResetTrigger::OnArrivalOrBuffered => ledger.buffer_count(self.trigger) > 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Returns true while waiting for the reset trigger.
    pub fn is_complete(&self) -> bool {
        self.state == TrackerState::AllComplete
    }

    /// Number of units finished since startup.
    pub fn units_completed(&self) -> u32 {
        self.units_completed
    }

    /// Color that starts a new unit.
    pub fn trigger(&self) -> BlockColor {
        self.trigger
    }
}
