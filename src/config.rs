//! Static configuration for a sorting cell.
//!
//! A [`SorterConfig`] is immutable once built and can only be obtained through
//! [`ConfigBuilder::build`], which rejects any missing coordinate or sequence.

use crate::geometry::Geometry;
use crate::time::TimeDuration;
use crate::types::{BlockColor, Point3};
use heapless::Vec;

/// The ordered list of colors one output column must receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSequence<const LAYERS: usize> {
    colors: Vec<BlockColor, LAYERS>,
}

impl<const LAYERS: usize> TargetSequence<LAYERS> {
    /// Creates a target sequence.
    ///
    /// # Errors
    /// * `EmptyTargetSequence` - No colors given
    /// * `SequenceTooLong` - More colors than `LAYERS`
    ///
    /// The `column` field of either error is reported as 0; the builder
    /// rewrites it with the real column index.
    pub fn new(colors: &[BlockColor]) -> Result<Self, ConfigError> {
        if colors.is_empty() {
            return Err(ConfigError::EmptyTargetSequence { column: 0 });
        }

        let mut sequence = Vec::new();
        for &color in colors {
            if sequence.push(color).is_err() {
                return Err(ConfigError::SequenceTooLong { column: 0 });
            }
        }

        Ok(Self { colors: sequence })
    }

    /// Color needed at `layer`, or `None` once the column is complete.
    #[inline]
    pub fn get(&self, layer: usize) -> Option<BlockColor> {
        self.colors.get(layer).copied()
    }

    /// Number of layers in a finished column.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false for a built sequence.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color that starts the column.
    pub fn first(&self) -> Option<BlockColor> {
        self.colors.first().copied()
    }

    /// All colors in placement order.
    pub fn as_slice(&self) -> &[BlockColor] {
        &self.colors
    }
}

/// What makes the completion tracker start a new unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResetTrigger {
    /// Reset only when a block of the trigger color has just been classified.
    #[default]
    OnArrival,

    /// Also reset when a trigger-colored block is already waiting in its buffer.
    OnArrivalOrBuffered,
}

/// How the completion tracker resets after a finished unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetPolicy {
    /// Condition that starts the next unit.
    pub trigger: ResetTrigger,

    /// Zero buffer occupancy along with column counts.
    ///
    /// Only enable this if the buffer tray is physically emptied between units.
    pub clear_buffers: bool,
}

/// Timing used while waiting for and sensing a block.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitPolicy<D: TimeDuration> {
    /// First pause between presence polls.
    pub poll_interval: D,

    /// Cap for the doubling poll interval.
    pub max_poll_interval: D,

    /// Give up with `SensorTimeout` after this long. `None` waits forever.
    pub timeout: Option<D>,

    /// Pause after the presence sensor fires, before picking.
    pub presence_settle: D,

    /// Pause at the color sensor before reading.
    pub color_settle: D,
}

impl<D: TimeDuration> WaitPolicy<D> {
    /// Returns this policy with a presence timeout.
    pub fn with_timeout(mut self, timeout: D) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl<D: TimeDuration> Default for WaitPolicy<D> {
    fn default() -> Self {
        Self {
            poll_interval: D::from_millis(10),
            max_poll_interval: D::from_millis(80),
            timeout: None,
            presence_settle: D::from_millis(50),
            color_settle: D::from_millis(300),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Grab position not set.
    MissingGrabPosition,

    /// Color sensor position not set.
    MissingSensorPosition,

    /// Clearance altitude not set.
    MissingClearanceAltitude,

    /// Buffer origin for this color not set.
    MissingBufferOrigin(BlockColor),

    /// Buffer row spacing and layer height not set.
    MissingBufferSpacing,

    /// Column origin not set.
    MissingColumnOrigin,

    /// Column spacing and layer height not set.
    MissingColumnSpacing,

    /// No output columns configured.
    NoColumns,

    /// More columns than the configured capacity.
    TooManyColumns,

    /// A column was given an empty target sequence.
    EmptyTargetSequence { column: usize },

    /// A column's target sequence exceeds the layer capacity.
    SequenceTooLong { column: usize },

    /// Columns start with different colors and no reset trigger was set.
    AmbiguousResetTrigger,

    /// A coordinate or spacing is NaN or infinite.
    NonFiniteCoordinate,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::MissingGrabPosition => write!(f, "grab position is not set"),
            ConfigError::MissingSensorPosition => write!(f, "color sensor position is not set"),
            ConfigError::MissingClearanceAltitude => write!(f, "clearance altitude is not set"),
            ConfigError::MissingBufferOrigin(color) => {
                write!(f, "buffer origin for color {} is not set", color)
            }
            ConfigError::MissingBufferSpacing => write!(f, "buffer spacing is not set"),
            ConfigError::MissingColumnOrigin => write!(f, "column origin is not set"),
            ConfigError::MissingColumnSpacing => write!(f, "column spacing is not set"),
            ConfigError::NoColumns => write!(f, "at least one output column is required"),
            ConfigError::TooManyColumns => write!(f, "column capacity exceeded"),
            ConfigError::EmptyTargetSequence { column } => {
                write!(f, "column {} has an empty target sequence", column)
            }
            ConfigError::SequenceTooLong { column } => {
                write!(f, "target sequence of column {} exceeds layer capacity", column)
            }
            ConfigError::AmbiguousResetTrigger => {
                write!(
                    f,
                    "columns start with different colors; set the reset trigger explicitly"
                )
            }
            ConfigError::NonFiniteCoordinate => write!(f, "coordinates must be finite"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Validated, immutable configuration of a sorting cell.
///
/// # Type Parameters
/// * `COLS` - Maximum number of output columns
/// * `LAYERS` - Maximum length of a column's target sequence
#[derive(Debug, Clone)]
pub struct SorterConfig<const COLS: usize, const LAYERS: usize> {
    grab_position: Point3,
    sensor_position: Point3,
    approach_offset: f32,
    clearance_z: f32,
    sensor_clearance_z: Option<f32>,
    geometry: Geometry,
    columns: Vec<TargetSequence<LAYERS>, COLS>,
    reset_trigger: BlockColor,
    reset_policy: ResetPolicy,
}

impl<const COLS: usize, const LAYERS: usize> SorterConfig<COLS, LAYERS> {
    /// Creates a new configuration builder.
    pub fn builder() -> ConfigBuilder<COLS, LAYERS> {
        ConfigBuilder::new()
    }

    /// The two-column demo cell: column 0 builds Blue, Green, Red and
    /// column 1 builds Blue, Red.
    ///
    /// # Errors
    /// `TooManyColumns` or `SequenceTooLong` if `COLS < 2` or `LAYERS < 3`.
    pub fn reference_cell() -> Result<Self, ConfigError> {
        use BlockColor::{Blue, Green, Red};

        Self::builder()
            .grab_position(Point3::new(263.0, 165.0, 16.0))
            .sensor_position(Point3::new(193.0, 111.0, 25.0))
            .approach_offset(10.0)
            .clearance_z(50.0)
            .buffer_origin(Red, Point3::new(300.0, -65.0, -42.0))
            .buffer_origin(Green, Point3::new(260.0, -65.0, -42.0))
            .buffer_origin(Blue, Point3::new(220.0, -65.0, -42.0))
            .buffer_spacing(50.0, 24.0)
            .column_origin(Point3::new(200.0, -150.0, -42.0))
            .column_spacing(45.0, 24.0)
            .column(&[Blue, Green, Red])?
            .column(&[Blue, Red])?
            .build()
    }

    /// Where blocks arrive to be picked.
    pub fn grab_position(&self) -> Point3 {
        self.grab_position
    }

    /// Point above the grab position where the arm waits for a block.
    pub fn approach_position(&self) -> Point3 {
        self.grab_position.raised(self.approach_offset)
    }

    /// Where the block is held for color sensing.
    pub fn sensor_position(&self) -> Point3 {
        self.sensor_position
    }

    /// Safety height for all lateral transits.
    pub fn clearance_z(&self) -> f32 {
        self.clearance_z
    }

    /// Height the arm rises to straight after gripping at the feeder.
    ///
    /// Falls back to [`clearance_z`](Self::clearance_z) when not configured.
    pub fn sensor_clearance_z(&self) -> f32 {
        self.sensor_clearance_z.unwrap_or(self.clearance_z)
    }

    /// Buffer and column slot geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Target sequences in column priority order.
    pub fn columns(&self) -> &[TargetSequence<LAYERS>] {
        &self.columns
    }

    /// Color that begins a new unit.
    pub fn reset_trigger(&self) -> BlockColor {
        self.reset_trigger
    }

    /// Reset behavior after a finished unit.
    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset_policy
    }
}

/// Builder for a validated [`SorterConfig`].
#[derive(Debug)]
pub struct ConfigBuilder<const COLS: usize, const LAYERS: usize> {
    grab_position: Option<Point3>,
    sensor_position: Option<Point3>,
    approach_offset: f32,
    clearance_z: Option<f32>,
    sensor_clearance_z: Option<f32>,
    buffer_origins: [Option<Point3>; BlockColor::COUNT],
    buffer_spacing: Option<(f32, f32)>,
    column_origin: Option<Point3>,
    column_spacing: Option<(f32, f32)>,
    columns: Vec<TargetSequence<LAYERS>, COLS>,
    reset_trigger: Option<BlockColor>,
    reset_policy: ResetPolicy,
}

impl<const COLS: usize, const LAYERS: usize> ConfigBuilder<COLS, LAYERS> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            grab_position: None,
            sensor_position: None,
            approach_offset: 0.0,
            clearance_z: None,
            sensor_clearance_z: None,
            buffer_origins: [None; BlockColor::COUNT],
            buffer_spacing: None,
            column_origin: None,
            column_spacing: None,
            columns: Vec::new(),
            reset_trigger: None,
            reset_policy: ResetPolicy::default(),
        }
    }

    /// Sets where blocks arrive to be picked.
    pub fn grab_position(mut self, position: Point3) -> Self {
        self.grab_position = Some(position);
        self
    }

    /// Sets where blocks are held for color sensing.
    pub fn sensor_position(mut self, position: Point3) -> Self {
        self.sensor_position = Some(position);
        self
    }

    /// Sets how far above the grab position the arm waits. Defaults to 0.
    pub fn approach_offset(mut self, offset: f32) -> Self {
        self.approach_offset = offset;
        self
    }

    /// Sets the safety height used for all lateral transits.
    pub fn clearance_z(mut self, z: f32) -> Self {
        self.clearance_z = Some(z);
        self
    }

    /// Sets the height the arm rises to after gripping a block at the
    /// feeder, before heading for the color sensor.
    ///
    /// Only vertical moves happen at this height. Defaults to the clearance
    /// altitude.
    pub fn sensor_clearance_z(mut self, z: f32) -> Self {
        self.sensor_clearance_z = Some(z);
        self
    }

    /// Sets the origin (slot 0) of `color`'s buffer.
    pub fn buffer_origin(mut self, color: BlockColor, origin: Point3) -> Self {
        self.buffer_origins[color.index()] = Some(origin);
        self
    }

    /// Sets buffer row spacing (Y) and layer height (Z).
    pub fn buffer_spacing(mut self, row_spacing: f32, layer_height: f32) -> Self {
        self.buffer_spacing = Some((row_spacing, layer_height));
        self
    }

    /// Sets the origin of column 0.
    pub fn column_origin(mut self, origin: Point3) -> Self {
        self.column_origin = Some(origin);
        self
    }

    /// Sets per-column spacing (Y) and layer height (Z).
    pub fn column_spacing(mut self, spacing: f32, layer_height: f32) -> Self {
        self.column_spacing = Some((spacing, layer_height));
        self
    }

    /// Adds an output column. Columns are scanned in the order they are added.
    ///
    /// # Errors
    /// * `EmptyTargetSequence` - No colors given
    /// * `SequenceTooLong` - More colors than `LAYERS`
    /// * `TooManyColumns` - More columns than `COLS`
    pub fn column(mut self, colors: &[BlockColor]) -> Result<Self, ConfigError> {
        let column = self.columns.len();
        let sequence = TargetSequence::new(colors).map_err(|err| match err {
            ConfigError::EmptyTargetSequence { .. } => ConfigError::EmptyTargetSequence { column },
            ConfigError::SequenceTooLong { .. } => ConfigError::SequenceTooLong { column },
            other => other,
        })?;

        self.columns
            .push(sequence)
            .map_err(|_| ConfigError::TooManyColumns)?;
        Ok(self)
    }

    /// Sets the color that begins a new unit.
    ///
    /// Defaults to the color every target sequence starts with.
    pub fn reset_trigger(mut self, color: BlockColor) -> Self {
        self.reset_trigger = Some(color);
        self
    }

    /// Sets the reset policy. Defaults to [`ResetPolicy::default`].
    pub fn reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.reset_policy = policy;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    /// Any `Missing*` variant for an unset coordinate or spacing, `NoColumns`,
    /// `AmbiguousResetTrigger`, or `NonFiniteCoordinate`.
    pub fn build(self) -> Result<SorterConfig<COLS, LAYERS>, ConfigError> {
        let grab_position = self.grab_position.ok_or(ConfigError::MissingGrabPosition)?;
        let sensor_position = self
            .sensor_position
            .ok_or(ConfigError::MissingSensorPosition)?;
        let clearance_z = self
            .clearance_z
            .ok_or(ConfigError::MissingClearanceAltitude)?;

        let mut buffer_origins = [Point3::new(0.0, 0.0, 0.0); BlockColor::COUNT];
        for color in BlockColor::ALL {
            buffer_origins[color.index()] = self.buffer_origins[color.index()]
                .ok_or(ConfigError::MissingBufferOrigin(color))?;
        }
        let (buffer_row_spacing, buffer_layer_height) = self
            .buffer_spacing
            .ok_or(ConfigError::MissingBufferSpacing)?;
        let column_origin = self.column_origin.ok_or(ConfigError::MissingColumnOrigin)?;
        let (column_spacing, column_layer_height) = self
            .column_spacing
            .ok_or(ConfigError::MissingColumnSpacing)?;

        let points_finite = [grab_position, sensor_position, column_origin]
            .iter()
            .chain(buffer_origins.iter())
            .all(Point3::is_finite);
        let scalars_finite = [
            self.approach_offset,
            clearance_z,
            self.sensor_clearance_z.unwrap_or(clearance_z),
            buffer_row_spacing,
            buffer_layer_height,
            column_spacing,
            column_layer_height,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !points_finite || !scalars_finite {
            return Err(ConfigError::NonFiniteCoordinate);
        }

        let first = self
            .columns
            .first()
            .and_then(TargetSequence::first)
            .ok_or(ConfigError::NoColumns)?;

        let reset_trigger = match self.reset_trigger {
            Some(color) => color,
            None if self.columns.iter().all(|c| c.first() == Some(first)) => first,
            None => return Err(ConfigError::AmbiguousResetTrigger),
        };

        Ok(SorterConfig {
            grab_position,
            sensor_position,
            approach_offset: self.approach_offset,
            clearance_z,
            sensor_clearance_z: self.sensor_clearance_z,
            geometry: Geometry::new(
                buffer_origins,
                buffer_row_spacing,
                buffer_layer_height,
                column_origin,
                column_spacing,
                column_layer_height,
            ),
            columns: self.columns,
            reset_trigger,
            reset_policy: self.reset_policy,
        })
    }
}

impl<const COLS: usize, const LAYERS: usize> Default for ConfigBuilder<COLS, LAYERS> {
    fn default() -> Self {
        Self::new()
    }
}
