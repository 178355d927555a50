//! Core types shared by the scheduling components.

/// Color of a block, as decided by the color sensor.
///
/// The declaration order (Red, Green, Blue) is the fixed enumeration order used
/// for buffer indexing and for breaking ties during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockColor {
    /// Red block.
    Red,

    /// Green block.
    Green,

    /// Blue block.
    Blue,
}

impl BlockColor {
    /// Number of distinct block colors.
    pub const COUNT: usize = 3;

    /// All colors in their fixed enumeration order.
    pub const ALL: [BlockColor; BlockColor::COUNT] = [BlockColor::Red, BlockColor::Green, BlockColor::Blue];

    /// Position of this color in [`BlockColor::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            BlockColor::Red => 0,
            BlockColor::Green => 1,
            BlockColor::Blue => 2,
        }
    }

    /// Single-letter tag (`R`, `G` or `B`).
    pub const fn letter(self) -> char {
        match self {
            BlockColor::Red => 'R',
            BlockColor::Green => 'G',
            BlockColor::Blue => 'B',
        }
    }
}

impl core::fmt::Display for BlockColor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A point in the arm's Cartesian workspace, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Same XY position at a different height.
    #[inline]
    pub const fn at_height(self, z: f32) -> Self {
        Self::new(self.x, self.y, z)
    }

    /// Same XY position, raised by `dz`.
    #[inline]
    pub fn raised(self, dz: f32) -> Self {
        Self::new(self.x, self.y, self.z + dz)
    }

    /// Returns true if all three coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Outcome of the direct-placement scan for a freshly classified block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decision {
    /// A column needs this color next; the block goes straight onto it.
    Direct {
        /// Column receiving the block.
        column: usize,
        /// Layer the block lands on.
        layer: usize,
    },

    /// No column needs this color yet; the block goes into its color's buffer.
    Stash {
        /// Buffer slot index the block is stored at.
        slot: usize,
    },
}

/// A single buffer-to-column move performed during a flush pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transfer {
    /// Color being moved.
    pub color: BlockColor,

    /// Buffer slot the block is retrieved from (the most recently stashed one).
    pub slot: usize,

    /// Destination column.
    pub column: usize,

    /// Destination layer.
    pub layer: usize,
}

/// What happened to one block during a scheduling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Placement {
    /// The block's color.
    pub color: BlockColor,

    /// Where the block itself went.
    pub decision: Decision,

    /// Number of buffered blocks moved onto columns by the following flush.
    pub transfers: usize,
}

impl Placement {
    /// Returns true if the block was placed straight onto a column.
    pub fn is_direct(&self) -> bool {
        matches!(self.decision, Decision::Direct { .. })
    }
}
