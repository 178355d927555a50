//! Inventory ledger: the mutable counts behind every scheduling decision.
//!
//! Holds per-color buffer occupancy and per-column placed-layer counts. These
//! methods are the only way to change either.

use crate::config::SorterConfig;
use crate::types::BlockColor;

/// Ledger operation errors.
///
/// All variants indicate a caller broke a precondition; none are expected in
/// normal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedgerError {
    /// Retrieval attempted from an empty buffer.
    Underflow(BlockColor),

    /// Placement attempted on a column that already holds its full sequence.
    ColumnFull { column: usize },

    /// Column index out of range.
    InvalidColumn { column: usize },
}

impl core::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LedgerError::Underflow(color) => write!(f, "buffer {} is already empty", color),
            LedgerError::ColumnFull { column } => write!(f, "column {} is already complete", column),
            LedgerError::InvalidColumn { column } => write!(f, "column {} does not exist", column),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LedgerError {}

/// Buffer occupancy and column progress for one sorting cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryLedger<const COLS: usize> {
    buffers: [usize; BlockColor::COUNT],
    layers: [usize; COLS],
    lengths: [usize; COLS],
    column_count: usize,
}

impl<const COLS: usize> InventoryLedger<COLS> {
    /// Creates an empty ledger for the columns in `config`.
    pub fn new<const LAYERS: usize>(config: &SorterConfig<COLS, LAYERS>) -> Self {
        let mut lengths = [0; COLS];
        for (length, sequence) in lengths.iter_mut().zip(config.columns()) {
            *length = sequence.len();
        }

        Self {
            buffers: [0; BlockColor::COUNT],
            layers: [0; COLS],
            lengths,
            column_count: config.columns().len(),
        }
    }

    /// Number of blocks currently in `color`'s buffer.
    #[inline]
    pub fn buffer_count(&self, color: BlockColor) -> usize {
        self.buffers[color.index()]
    }

    /// Layers placed on `column` so far, or `None` if it does not exist.
    #[inline]
    pub fn layer_count(&self, column: usize) -> Option<usize> {
        self.layer_counts().get(column).copied()
    }

    /// Layers placed on every column, in column order.
    pub fn layer_counts(&self) -> &[usize] {
        &self.layers[..self.column_count]
    }

    /// Number of configured columns.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Returns true if `column` holds its full target sequence.
    pub fn is_column_complete(&self, column: usize) -> bool {
        column < self.column_count && self.layers[column] == self.lengths[column]
    }

    /// Returns true if every column holds its full target sequence.
    pub fn all_complete(&self) -> bool {
        (0..self.column_count).all(|column| self.is_column_complete(column))
    }

    /// Records a block stashed into `color`'s buffer.
    pub fn increment_buffer(&mut self, color: BlockColor) {
        self.buffers[color.index()] += 1;
    }

    /// Records a block retrieved from `color`'s buffer.
    ///
    /// # Errors
    /// `Underflow` if the buffer is already empty. The count is left at zero.
    pub fn decrement_buffer(&mut self, color: BlockColor) -> Result<(), LedgerError> {
        let count = &mut self.buffers[color.index()];
        if *count == 0 {
            return Err(LedgerError::Underflow(color));
        }

        *count -= 1;
        Ok(())
    }

    /// Records a block placed on `column`.
    ///
    /// # Errors
    /// * `InvalidColumn` - No such column
    /// * `ColumnFull` - The column is already complete
    pub fn increment_column(&mut self, column: usize) -> Result<(), LedgerError> {
        if column >= self.column_count {
            return Err(LedgerError::InvalidColumn { column });
        }
        if self.layers[column] >= self.lengths[column] {
            return Err(LedgerError::ColumnFull { column });
        }

        self.layers[column] += 1;
        Ok(())
    }

    /// Sets every column's layer count to zero, and every buffer's occupancy
    /// too if `clear_buffers` is set.
    pub fn reset_all(&mut self, clear_buffers: bool) {
        self.layers = [0; COLS];
        if clear_buffers {
            self.buffers = [0; BlockColor::COUNT];
        }
    }

    /// Total number of blocks tracked (buffered plus placed).
    pub fn total_blocks(&self) -> usize {
        self.buffers.iter().sum::<usize>() + self.layer_counts().iter().sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> InventoryLedger<4> {
        let config = SorterConfig::<4, 3>::reference_cell().unwrap();
        InventoryLedger::new(&config)
    }

    #[test]
    fn starts_empty() {
        let ledger = ledger();
        assert_eq!(ledger.column_count(), 2);
        assert_eq!(ledger.layer_counts(), &[0, 0]);
        assert_eq!(ledger.layer_count(2), None);
        for color in BlockColor::ALL {
            assert_eq!(ledger.buffer_count(color), 0);
        }
        assert!(!ledger.all_complete());
    }

    #[test]
    fn decrement_empty_buffer_underflows() {
        let mut ledger = ledger();
        assert_eq!(
            ledger.decrement_buffer(BlockColor::Green),
            Err(LedgerError::Underflow(BlockColor::Green))
        );
        assert_eq!(ledger.buffer_count(BlockColor::Green), 0);

        ledger.increment_buffer(BlockColor::Green);
        assert_eq!(ledger.decrement_buffer(BlockColor::Green), Ok(()));
        assert_eq!(ledger.buffer_count(BlockColor::Green), 0);
    }

    #[test]
    fn column_never_exceeds_sequence_length() {
        let mut ledger = ledger();
        ledger.increment_column(1).unwrap();
        ledger.increment_column(1).unwrap();
        assert!(ledger.is_column_complete(1));
        assert_eq!(
            ledger.increment_column(1),
            Err(LedgerError::ColumnFull { column: 1 })
        );
        assert_eq!(ledger.layer_count(1), Some(2));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let mut ledger = ledger();
        assert_eq!(
            ledger.increment_column(2),
            Err(LedgerError::InvalidColumn { column: 2 })
        );
    }

    #[test]
    fn reset_keeps_buffers_unless_asked() {
        let mut ledger = ledger();
        ledger.increment_column(0).unwrap();
        ledger.increment_buffer(BlockColor::Red);

        ledger.reset_all(false);
        assert_eq!(ledger.layer_counts(), &[0, 0]);
        assert_eq!(ledger.buffer_count(BlockColor::Red), 1);

        ledger.reset_all(true);
        assert_eq!(ledger.buffer_count(BlockColor::Red), 0);
        assert_eq!(ledger.total_blocks(), 0);
    }
}
