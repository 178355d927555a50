//! Geometry resolver: maps buffer slots and column layers to workspace coordinates.
//!
//! Both lookups are pure functions of static configuration and an index.
//! Buffers are packed three deep: index `i` lands in row `i / 3` (shifting Y)
//! at height `i % 3` (shifting Z). Columns shift Y per column and Z per layer.

use crate::types::{BlockColor, Point3};

/// Number of slots stacked in one buffer row.
pub const BUFFER_TRAY_DEPTH: usize = 3;

/// Static slot geometry for buffers and columns.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Geometry {
    buffer_origins: [Point3; BlockColor::COUNT],
    buffer_row_spacing: f32,
    buffer_layer_height: f32,
    column_origin: Point3,
    column_spacing: f32,
    column_layer_height: f32,
}

impl Geometry {
    /// Creates a geometry from buffer origins (indexed by [`BlockColor::index`])
    /// and column origin plus spacings.
    pub const fn new(
        buffer_origins: [Point3; BlockColor::COUNT],
        buffer_row_spacing: f32,
        buffer_layer_height: f32,
        column_origin: Point3,
        column_spacing: f32,
        column_layer_height: f32,
    ) -> Self {
        Self {
            buffer_origins,
            buffer_row_spacing,
            buffer_layer_height,
            column_origin,
            column_spacing,
            column_layer_height,
        }
    }

    /// Coordinates of slot `index` in `color`'s buffer.
    pub fn buffer_slot(&self, color: BlockColor, index: usize) -> Point3 {
        let row = index / BUFFER_TRAY_DEPTH;
        let layer = index % BUFFER_TRAY_DEPTH;
        let origin = self.buffer_origins[color.index()];

        Point3::new(
            origin.x,
            origin.y - row as f32 * self.buffer_row_spacing,
            origin.z + layer as f32 * self.buffer_layer_height,
        )
    }

    /// Coordinates of `layer` on output column `column`.
    pub fn column_slot(&self, column: usize, layer: usize) -> Point3 {
        let origin = self.column_origin;

        Point3::new(
            origin.x,
            origin.y - column as f32 * self.column_spacing,
            origin.z + layer as f32 * self.column_layer_height,
        )
    }

    /// Origin of `color`'s buffer.
    pub fn buffer_origin(&self, color: BlockColor) -> Point3 {
        self.buffer_origins[color.index()]
    }

    /// Origin of the first output column.
    pub fn column_origin(&self) -> Point3 {
        self.column_origin
    }
}
