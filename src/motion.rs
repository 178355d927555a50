//! Arm hardware abstraction and clearance-altitude motion staging.
//!
//! Defines the [`ArmAdapter`] trait the controller drives, and
//! [`MotionStager`], which turns "go to this point" into a safe series of
//! moves: lateral travel only ever happens at the clearance altitude.

use crate::colors::classify;
use crate::types::{BlockColor, Point3};
use heapless::Vec;
use palette::Srgb;

/// Position tolerance when comparing commanded coordinates, in millimeters.
const POSITION_EPSILON: f32 = 0.05;

/// Trait for abstracting the arm, its gripper and its sensors.
///
/// Implement this for your hardware (serial protocol, vendor SDK, simulator).
/// Every fallible call blocks until the action has physically completed.
pub trait ArmAdapter {
    /// Error reported by the hardware layer.
    type Error;

    /// Moves the end effector to `target` in a straight line.
    fn move_to(&mut self, target: Point3) -> Result<(), Self::Error>;

    /// Reads the end effector's actual position.
    ///
    /// Queried whenever the last commanded position is unknown: at startup
    /// and after a failed move.
    fn current_position(&mut self) -> Result<Point3, Self::Error>;

    /// Grips the block under the end effector (e.g. switches suction on).
    fn engage_gripper(&mut self) -> Result<(), Self::Error>;

    /// Releases the held block.
    fn release_gripper(&mut self) -> Result<(), Self::Error>;

    /// Returns true if a block is waiting at the grab position.
    fn sense_presence(&mut self) -> Result<bool, Self::Error>;

    /// Reads raw red, green and blue intensities from the color sensor.
    fn read_color_channels(&mut self) -> Result<Srgb<u16>, Self::Error>;

    /// Classifies the block held at the color sensor.
    ///
    /// The default implementation takes the strongest channel of
    /// [`read_color_channels`](Self::read_color_channels), breaking ties in
    /// Red, Green, Blue order.
    fn classify_color(&mut self) -> Result<BlockColor, Self::Error> {
        self.read_color_channels().map(classify)
    }

    /// Blocks for `millis` milliseconds.
    fn pause(&mut self, millis: u64);
}

#[inline]
fn same_xy(a: Point3, b: Point3) -> bool {
    (a.x - b.x).abs() <= POSITION_EPSILON && (a.y - b.y).abs() <= POSITION_EPSILON
}

#[inline]
fn same_height(a: f32, b: f32) -> bool {
    (a - b).abs() <= POSITION_EPSILON
}

/// Computes the moves that take the arm from `from` to `to`.
///
/// * Same XY: a single vertical move.
/// * Otherwise: lift to `clearance_z` (if not already there), travel at
///   `clearance_z`, then descend to `to` (if it is not at `clearance_z`).
pub fn transit_waypoints(from: Point3, to: Point3, clearance_z: f32) -> Vec<Point3, 3> {
    let mut waypoints = Vec::new();

    if same_xy(from, to) {
        if !same_height(from.z, to.z) {
            let _ = waypoints.push(to);
        }
        return waypoints;
    }

    if !same_height(from.z, clearance_z) {
        let _ = waypoints.push(from.at_height(clearance_z));
    }
    let _ = waypoints.push(to.at_height(clearance_z));
    if !same_height(to.z, clearance_z) {
        let _ = waypoints.push(to);
    }

    waypoints
}

/// Drives an [`ArmAdapter`] through clearance-safe transits.
///
/// Tracks the last commanded position. After a failed move the position is
/// unknown and is read back from the arm before the next move is planned.
pub struct MotionStager<A: ArmAdapter> {
    arm: A,
    clearance_z: f32,
    position: Option<Point3>,
}

impl<A: ArmAdapter> MotionStager<A> {
    /// Creates a stager. The arm's starting position is read on first use.
    pub fn new(arm: A, clearance_z: f32) -> Self {
        Self {
            arm,
            clearance_z,
            position: None,
        }
    }

    /// Last commanded position, if known.
    pub fn position(&self) -> Option<Point3> {
        self.position
    }

    /// Returns a reference to the arm.
    pub fn arm(&self) -> &A {
        &self.arm
    }

    /// Returns a mutable reference to the arm.
    pub fn arm_mut(&mut self) -> &mut A {
        &mut self.arm
    }

    /// Consumes the stager, returning the arm.
    pub fn into_arm(self) -> A {
        self.arm
    }

    fn step(&mut self, target: Point3) -> Result<(), A::Error> {
        trace!("move to {}", target);
        match self.arm.move_to(target) {
            Ok(()) => {
                self.position = Some(target);
                Ok(())
            }
            Err(err) => {
                self.position = None;
                Err(err)
            }
        }
    }

    fn locate(&mut self) -> Result<Point3, A::Error> {
        match self.position {
            Some(position) => Ok(position),
            None => {
                let position = self.arm.current_position()?;
                debug!("position re-read from arm: {}", position);
                self.position = Some(position);
                Ok(position)
            }
        }
    }

    /// Moves to `target`, passing through the clearance altitude for any
    /// lateral travel.
    pub fn transit_to(&mut self, target: Point3) -> Result<(), A::Error> {
        let from = self.locate()?;
        let waypoints = transit_waypoints(from, target, self.clearance_z);
        for &waypoint in waypoints.iter() {
            self.step(waypoint)?;
        }
        Ok(())
    }

    /// Rises (or sinks) straight to height `z` without moving in XY.
    pub fn rise_to(&mut self, z: f32) -> Result<(), A::Error> {
        let position = self.locate()?;
        if same_height(position.z, z) {
            return Ok(());
        }
        self.step(position.at_height(z))
    }

    /// Rises straight up to the clearance altitude.
    pub fn lift(&mut self) -> Result<(), A::Error> {
        self.rise_to(self.clearance_z)
    }

    /// Moves to `target` and grips the block there. The arm stays at
    /// `target`.
    pub fn grip_at(&mut self, target: Point3) -> Result<(), A::Error> {
        self.transit_to(target)?;
        self.arm.engage_gripper()
    }

    /// Moves to `target` and lets go of the held block. The arm stays at
    /// `target`.
    pub fn drop_at(&mut self, target: Point3) -> Result<(), A::Error> {
        self.transit_to(target)?;
        self.arm.release_gripper()
    }
}
