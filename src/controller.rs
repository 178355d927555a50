//! Sorting controller: the single-entry control loop.
//!
//! Provides [`SortController`], which owns the arm, the ledger and the
//! completion tracker and runs one block at a time through
//! wait, pick, classify, reset check, place or stash, flush, and
//! completion check.

use crate::config::{SorterConfig, WaitPolicy};
use crate::error::CycleError;
use crate::ledger::InventoryLedger;
use crate::motion::{ArmAdapter, MotionStager};
use crate::scheduler::PlacementScheduler;
use crate::time::{Backoff, TimeDuration, TimeInstant, TimeSource};
use crate::tracker::{CompletionTracker, TrackerState};
use crate::types::{BlockColor, Placement};

/// Result of one fully processed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Where the block went and how many buffered blocks followed it.
    pub placement: Placement,

    /// A unit was finished during this cycle.
    pub completed_unit: bool,

    /// Column counts were reset for a new unit during this cycle.
    pub reset: bool,
}

/// Controls one pick-and-place arm sorting blocks into ordered columns.
///
/// Owns all mutable scheduling state. Blocks are handled strictly one at a
/// time; every arm call blocks until the motion has finished.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `A` - Arm implementation type
/// * `T` - Time source implementation type
/// * `COLS` - Maximum number of output columns
/// * `LAYERS` - Maximum length of a column's target sequence
pub struct SortController<
    't,
    I: TimeInstant,
    A: ArmAdapter,
    T: TimeSource<I>,
    const COLS: usize,
    const LAYERS: usize,
> {
    config: SorterConfig<COLS, LAYERS>,
    wait: WaitPolicy<I::Duration>,
    motion: MotionStager<A>,
    time_source: &'t T,
    ledger: InventoryLedger<COLS>,
    tracker: CompletionTracker,
}

impl<'t, I, A, T, const COLS: usize, const LAYERS: usize> SortController<'t, I, A, T, COLS, LAYERS>
where
    I: TimeInstant,
    A: ArmAdapter,
    T: TimeSource<I>,
{
    /// Creates a controller with empty buffers and columns.
    pub fn new(
        arm: A,
        time_source: &'t T,
        config: SorterConfig<COLS, LAYERS>,
        wait: WaitPolicy<I::Duration>,
    ) -> Self {
        let ledger = InventoryLedger::new(&config);
        let tracker = CompletionTracker::from_config(&config);
        let motion = MotionStager::new(arm, config.clearance_z());

        Self {
            config,
            wait,
            motion,
            time_source,
            ledger,
            tracker,
        }
    }

    /// Runs cycles until `should_stop` returns true.
    ///
    /// Recoverable errors abandon the current block and the loop goes back to
    /// waiting. A fatal error stops the loop and is returned.
    pub fn run<F: FnMut() -> bool>(&mut self, mut should_stop: F) -> Result<(), CycleError<A::Error>> {
        info!("sorting started");

        while !should_stop() {
            match self.run_cycle() {
                Ok(_) => {}
                Err(err) if err.is_fatal() => {
                    error!("stopping: {}", err.label());
                    return Err(err);
                }
                Err(err) => {
                    warn!("cycle aborted: {}", err.label());
                }
            }
        }

        info!("sorting stopped");
        Ok(())
    }

    /// Waits for one block, picks it, classifies it and processes it.
    ///
    /// # Errors
    /// * `SensorTimeout` - No block arrived in time
    /// * `Arm` - The arm or a sensor failed
    /// * `Ledger` - Internal invariant violated (fatal)
    pub fn run_cycle(&mut self) -> Result<CycleReport, CycleError<A::Error>> {
        debug!(
            "cycle start: columns {}, buffers R{} G{} B{}",
            self.ledger.layer_counts(),
            self.ledger.buffer_count(BlockColor::Red),
            self.ledger.buffer_count(BlockColor::Green),
            self.ledger.buffer_count(BlockColor::Blue)
        );

        self.motion
            .transit_to(self.config.approach_position())
            .map_err(CycleError::Arm)?;
        self.wait_for_block()?;

        self.motion
            .grip_at(self.config.grab_position())
            .map_err(CycleError::Arm)?;
        self.motion
            .rise_to(self.config.sensor_clearance_z())
            .map_err(CycleError::Arm)?;

        let color = self.sense_color()?;
        self.process_block(color)
    }

    /// Schedules a block of `color` that is already held by the gripper.
    ///
    /// A finished unit is reset first if `color` meets the reset trigger, so
    /// the block can start the new unit. Completion is checked after the
    /// flush.
    pub fn process_block(&mut self, color: BlockColor) -> Result<CycleReport, CycleError<A::Error>> {
        let reset = self.tracker.maybe_reset(color, &mut self.ledger);

        let placement = PlacementScheduler::new(&self.config).decide_and_execute(
            color,
            &mut self.ledger,
            &mut self.motion,
        )?;

        let completed_unit = self.tracker.check_completion(&self.ledger);

        Ok(CycleReport {
            placement,
            completed_unit,
            reset,
        })
    }

    /// Runs a flush pass outside of a cycle, e.g. after restoring buffers.
    pub fn flush(&mut self) -> Result<usize, CycleError<A::Error>> {
        PlacementScheduler::new(&self.config).flush(&mut self.ledger, &mut self.motion)
    }

    /// Polls the presence sensor with exponential backoff.
    fn wait_for_block(&mut self) -> Result<(), CycleError<A::Error>> {
        let mut backoff = Backoff::new(
            self.time_source.now(),
            self.wait.poll_interval,
            self.wait.max_poll_interval,
            self.wait.timeout,
        );

        loop {
            if self
                .motion
                .arm_mut()
                .sense_presence()
                .map_err(CycleError::Arm)?
            {
                self.motion
                    .arm_mut()
                    .pause(self.wait.presence_settle.as_millis());
                return Ok(());
            }

            let nap = backoff
                .next_nap(self.time_source.now())
                .ok_or(CycleError::SensorTimeout)?;
            trace!("no block yet, sleeping {} ms", nap);
            self.motion.arm_mut().pause(nap);
        }
    }

    fn sense_color(&mut self) -> Result<BlockColor, CycleError<A::Error>> {
        self.motion
            .transit_to(self.config.sensor_position())
            .map_err(CycleError::Arm)?;
        self.motion
            .arm_mut()
            .pause(self.wait.color_settle.as_millis());

        let color = self
            .motion
            .arm_mut()
            .classify_color()
            .map_err(CycleError::Arm)?;
        info!("classified block as {}", color);

        self.motion.lift().map_err(CycleError::Arm)?;
        Ok(color)
    }

    /// Current buffer and column counts.
    pub fn ledger(&self) -> &InventoryLedger<COLS> {
        &self.ledger
    }

    /// Current completion tracker.
    pub fn tracker(&self) -> &CompletionTracker {
        &self.tracker
    }

    /// Completion state of the current unit.
    pub fn state(&self) -> TrackerState {
        self.tracker.state()
    }

    /// The configuration this controller runs with.
    pub fn config(&self) -> &SorterConfig<COLS, LAYERS> {
        &self.config
    }

    /// Returns a reference to the arm.
    pub fn arm(&self) -> &A {
        self.motion.arm()
    }

    /// Returns a mutable reference to the arm.
    pub fn arm_mut(&mut self) -> &mut A {
        self.motion.arm_mut()
    }
}
