//! Placement scheduler: decides where each block goes and drains buffers.
//!
//! For a freshly classified block the scheduler first scans columns in
//! priority order for one whose next needed color matches. If none does, the
//! block is stashed in its color's buffer. Either way a flush pass follows,
//! moving buffered blocks onto any column whose next need is in stock.
//!
//! Buffers are LIFO per color: retrieval always takes the most recently
//! stashed slot. Each ledger count changes as soon as the gripper action it
//! records has succeeded and before the arm lifts away, so the ledger
//! matches what is physically in the buffers and columns whichever move fails.

use crate::config::SorterConfig;
use crate::error::CycleError;
use crate::ledger::InventoryLedger;
use crate::motion::{ArmAdapter, MotionStager};
use crate::types::{BlockColor, Decision, Placement, Transfer};

/// Stateless decision engine over a [`SorterConfig`] and an [`InventoryLedger`].
#[derive(Debug, Clone, Copy)]
pub struct PlacementScheduler<'c, const COLS: usize, const LAYERS: usize> {
    config: &'c SorterConfig<COLS, LAYERS>,
}

impl<'c, const COLS: usize, const LAYERS: usize> PlacementScheduler<'c, COLS, LAYERS> {
    /// Creates a scheduler for `config`.
    pub fn new(config: &'c SorterConfig<COLS, LAYERS>) -> Self {
        Self { config }
    }

    /// Decides where a block of `color` goes, without touching anything.
    ///
    /// The first column (in configuration order) whose next needed color is
    /// `color` wins. Otherwise the block is stashed at the next free slot of
    /// its buffer.
    pub fn decide(&self, color: BlockColor, ledger: &InventoryLedger<COLS>) -> Decision {
        for (column, sequence) in self.config.columns().iter().enumerate() {
            let Some(layer) = ledger.layer_count(column) else {
                break;
            };

            if sequence.get(layer) == Some(color) {
                return Decision::Direct { column, layer };
            }
        }

        Decision::Stash {
            slot: ledger.buffer_count(color),
        }
    }

    /// Next buffer-to-column move a flush pass would make, if any.
    ///
    /// Picks the first incomplete column whose needed color is buffered.
    /// A flush only ever removes from buffers, so a column skipped here for
    /// lack of stock stays skipped for the rest of the pass.
    pub fn pending_transfer(&self, ledger: &InventoryLedger<COLS>) -> Option<Transfer> {
        self.config
            .columns()
            .iter()
            .enumerate()
            .find_map(|(column, sequence)| {
                let layer = ledger.layer_count(column)?;
                let color = sequence.get(layer)?;
                let stocked = ledger.buffer_count(color);

                (stocked > 0).then(|| Transfer {
                    color,
                    slot: stocked - 1,
                    column,
                    layer,
                })
            })
    }

    /// Places the held block of `color` and then runs a flush pass.
    ///
    /// # Errors
    /// * `Arm` - The arm failed; the ledger still records every release or
    ///   retrieval that succeeded before the failure
    /// * `Ledger` - A ledger precondition was broken (internal bug, fatal)
    pub fn decide_and_execute<A: ArmAdapter>(
        &self,
        color: BlockColor,
        ledger: &mut InventoryLedger<COLS>,
        motion: &mut MotionStager<A>,
    ) -> Result<Placement, CycleError<A::Error>> {
        let geometry = self.config.geometry();
        let decision = self.decide(color, ledger);

        match decision {
            Decision::Direct { column, layer } => {
                info!("placing {} on column {} layer {}", color, column, layer);
                motion
                    .drop_at(geometry.column_slot(column, layer))
                    .map_err(CycleError::Arm)?;
                ledger.increment_column(column)?;
            }
            Decision::Stash { slot } => {
                info!("stashing {} in buffer slot {}", color, slot);
                motion
                    .drop_at(geometry.buffer_slot(color, slot))
                    .map_err(CycleError::Arm)?;
                ledger.increment_buffer(color);
            }
        }
        motion.lift().map_err(CycleError::Arm)?;

        let transfers = self.flush(ledger, motion)?;

        Ok(Placement {
            color,
            decision,
            transfers,
        })
    }

    /// Moves buffered blocks onto columns until no column's next need is in
    /// stock. Returns the number of blocks moved.
    ///
    /// Running it again straight after makes no further moves.
    pub fn flush<A: ArmAdapter>(
        &self,
        ledger: &mut InventoryLedger<COLS>,
        motion: &mut MotionStager<A>,
    ) -> Result<usize, CycleError<A::Error>> {
        let geometry = self.config.geometry();
        let mut moved = 0;

        while let Some(transfer) = self.pending_transfer(ledger) {
            debug!(
                "flush: {} from slot {} to column {} layer {}",
                transfer.color,
                transfer.slot,
                transfer.column,
                transfer.layer
            );

            // Once gripped the block is out of the buffer; if a later move
            // fails it is held by the arm and counted nowhere.
            motion
                .grip_at(geometry.buffer_slot(transfer.color, transfer.slot))
                .map_err(CycleError::Arm)?;
            ledger.decrement_buffer(transfer.color)?;
            motion.lift().map_err(CycleError::Arm)?;

            motion
                .drop_at(geometry.column_slot(transfer.column, transfer.layer))
                .map_err(CycleError::Arm)?;
            ledger.increment_column(transfer.column)?;
            moved += 1;
            motion.lift().map_err(CycleError::Arm)?;
        }

        Ok(moved)
    }
}
