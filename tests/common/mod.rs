//! Shared test infrastructure for block-sequencer integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::collections::VecDeque;

use block_sequencer::{
    ArmAdapter, BlockColor, ConfigBuilder, Point3, SorterConfig, TimeDuration, TimeInstant, TimeSource,
};
use palette::Srgb;

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    const ZERO: Self = TestDuration(0);

    fn as_millis(&self) -> u64 {
        self.0
    }

    fn from_millis(millis: u64) -> Self {
        TestDuration(millis)
    }

    fn saturating_sub(self, other: Self) -> Self {
        TestDuration(self.0.saturating_sub(other.0))
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: core::cell::Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: core::cell::Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given number of milliseconds
    pub fn advance(&self, millis: u64) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + millis));
    }

    pub fn millis(&self) -> u64 {
        self.current_time.get().0
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Arm
// ============================================================================

/// Hardware failure injected by tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    /// Gripper refused to release
    Jammed,
    /// Motion aborted before the arm confirmed arrival
    Stalled,
    /// Color read with no block queued
    NoBlock,
}

impl core::fmt::Display for MockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MockError::Jammed => write!(f, "gripper jammed"),
            MockError::Stalled => write!(f, "motion stalled"),
            MockError::NoBlock => write!(f, "no block at sensor"),
        }
    }
}

/// Command issued to the mock arm
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArmCommand {
    Move(Point3),
    Engage(Point3),
    Release(Point3),
}

/// Mock arm that records every command and replays queued color readings.
///
/// Pauses advance the shared mock clock. A failed move still carries the arm
/// to its target; only the confirmation is lost.
pub struct MockArm<'a> {
    clock: &'a MockTimeSource,
    position: Point3,
    path: Vec<Point3>,
    readings: VecDeque<Srgb<u16>>,
    commands: Vec<ArmCommand>,
    pauses: Vec<u64>,
    moves: usize,
    fail_on_move: Option<usize>,
    fail_on_move_to: Option<(Point3, usize)>,
    releases: usize,
    fail_on_release: Option<usize>,
    presence_misses: usize,
    pose_reads: usize,
}

impl<'a> MockArm<'a> {
    pub fn new(clock: &'a MockTimeSource) -> Self {
        let start = Point3::new(0.0, 0.0, 0.0);
        Self {
            clock,
            position: start,
            path: vec![start],
            readings: VecDeque::new(),
            commands: Vec::new(),
            pauses: Vec::new(),
            moves: 0,
            fail_on_move: None,
            fail_on_move_to: None,
            releases: 0,
            fail_on_release: None,
            presence_misses: 0,
            pose_reads: 0,
        }
    }

    /// Place the arm somewhere before the controller takes over
    pub fn starting_at(mut self, position: Point3) -> Self {
        self.position = position;
        self.path = vec![position];
        self
    }

    /// Make the n-th move call (0-based) fail with `Stalled`
    pub fn fail_on_move(mut self, n: usize) -> Self {
        self.fail_on_move = Some(n);
        self
    }

    /// Make the n-th move (0-based) targeting `target` fail with `Stalled`
    pub fn fail_on_move_to(mut self, target: Point3, n: usize) -> Self {
        self.fail_on_move_to = Some((target, n));
        self
    }

    /// Queue blocks that will arrive at the feeder, in order
    pub fn with_arrivals(mut self, colors: &[BlockColor]) -> Self {
        self.readings.extend(colors.iter().map(|&c| reading(c)));
        self
    }

    /// Make the n-th release call (0-based) fail with `Jammed`
    pub fn fail_on_release(mut self, n: usize) -> Self {
        self.fail_on_release = Some(n);
        self
    }

    /// Report "no block" this many times before reporting presence
    pub fn with_presence_misses(mut self, misses: usize) -> Self {
        self.presence_misses = misses;
        self
    }

    pub fn commands(&self) -> &[ArmCommand] {
        &self.commands
    }

    /// Every position the arm physically reached, starting pose first
    pub fn path(&self) -> &[Point3] {
        &self.path
    }

    /// Number of times the controller asked where the arm is
    pub fn pose_reads(&self) -> usize {
        self.pose_reads
    }

    pub fn pauses(&self) -> &[u64] {
        &self.pauses
    }

    pub fn clear_log(&mut self) {
        self.commands.clear();
        self.pauses.clear();
    }

    /// Positions where the gripper engaged, in order
    pub fn engage_points(&self) -> Vec<Point3> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                ArmCommand::Engage(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Positions where the gripper released, in order
    pub fn release_points(&self) -> Vec<Point3> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                ArmCommand::Release(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// All commanded move targets, in order
    pub fn move_points(&self) -> Vec<Point3> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                ArmCommand::Move(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl ArmAdapter for MockArm<'_> {
    type Error = MockError;

    fn move_to(&mut self, target: Point3) -> Result<(), Self::Error> {
        let n = self.moves;
        self.moves += 1;
        self.position = target;
        self.path.push(target);

        if self.fail_on_move == Some(n) {
            return Err(MockError::Stalled);
        }
        if let Some((point, remaining)) = self.fail_on_move_to {
            if point == target {
                if remaining == 0 {
                    self.fail_on_move_to = None;
                    return Err(MockError::Stalled);
                }
                self.fail_on_move_to = Some((point, remaining - 1));
            }
        }

        self.commands.push(ArmCommand::Move(target));
        Ok(())
    }

    fn current_position(&mut self) -> Result<Point3, Self::Error> {
        self.pose_reads += 1;
        Ok(self.position)
    }

    fn engage_gripper(&mut self) -> Result<(), Self::Error> {
        self.commands.push(ArmCommand::Engage(self.position));
        Ok(())
    }

    fn release_gripper(&mut self) -> Result<(), Self::Error> {
        let n = self.releases;
        self.releases += 1;
        if self.fail_on_release == Some(n) {
            return Err(MockError::Jammed);
        }

        self.commands.push(ArmCommand::Release(self.position));
        Ok(())
    }

    fn sense_presence(&mut self) -> Result<bool, Self::Error> {
        if self.presence_misses > 0 {
            self.presence_misses -= 1;
            return Ok(false);
        }
        Ok(!self.readings.is_empty())
    }

    fn read_color_channels(&mut self) -> Result<Srgb<u16>, Self::Error> {
        self.readings.pop_front().ok_or(MockError::NoBlock)
    }

    fn pause(&mut self, millis: u64) {
        self.pauses.push(millis);
        self.clock.advance(millis);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Raw sensor reading dominated by `color`'s channel
pub fn reading(color: BlockColor) -> Srgb<u16> {
    match color {
        BlockColor::Red => Srgb::new(820, 140, 90),
        BlockColor::Green => Srgb::new(160, 700, 210),
        BlockColor::Blue => Srgb::new(60, 180, 640),
    }
}

/// Two columns: [B, G, R] and [B, R]
pub fn reference_config() -> SorterConfig<2, 3> {
    SorterConfig::reference_cell().unwrap()
}

/// Builder for the reference cell layout, for tests that vary one setting
pub fn reference_builder() -> ConfigBuilder<2, 3> {
    use BlockColor::{Blue, Green, Red};

    SorterConfig::builder()
        .grab_position(Point3::new(263.0, 165.0, 16.0))
        .sensor_position(Point3::new(193.0, 111.0, 25.0))
        .approach_offset(10.0)
        .clearance_z(CLEARANCE_Z)
        .buffer_origin(Red, Point3::new(300.0, -65.0, -42.0))
        .buffer_origin(Green, Point3::new(260.0, -65.0, -42.0))
        .buffer_origin(Blue, Point3::new(220.0, -65.0, -42.0))
        .buffer_spacing(50.0, 24.0)
        .column_origin(Point3::new(200.0, -150.0, -42.0))
        .column_spacing(45.0, 24.0)
        .column(&[Blue, Green, Red])
        .unwrap()
        .column(&[Blue, Red])
        .unwrap()
}

pub const CLEARANCE_Z: f32 = 50.0;

/// Asserts that every XY displacement along `path` happens at clearance
pub fn assert_lateral_at_clearance(path: &[Point3]) {
    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.x != b.x || a.y != b.y {
            assert_eq!(a.z, CLEARANCE_Z, "lateral move from {:?} to {:?}", a, b);
            assert_eq!(b.z, CLEARANCE_Z, "lateral move from {:?} to {:?}", a, b);
        }
    }
}

pub type TestController<'a> =
    block_sequencer::SortController<'a, TestInstant, MockArm<'a>, MockTimeSource, 2, 3>;

/// Controller over the reference cell with default wait timing
pub fn controller<'a>(clock: &'a MockTimeSource, arm: MockArm<'a>) -> TestController<'a> {
    TestController::new(arm, clock, reference_config(), block_sequencer::WaitPolicy::default())
}
