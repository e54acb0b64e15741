// Copyright 2023 Greptime Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::ops::Range;

use snafu::{ensure, OptionExt};

use crate::error::{
    ColumnOutOfBoundsSnafu, EmptyColumnsSnafu, InvalidColumnWidthSnafu, LayoutOverflowSnafu,
    Result, RowOutOfBoundsSnafu,
};

/// Widest column a layout accepts.
pub const MAX_COLUMN_WIDTH: u32 = 64;

/// Shape of a bit-packed matrix.
///
/// Rows are stored one after another and the columns of a row are stored in
/// order, with no padding between columns or rows. Only the last byte may
/// carry unused bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitPackedLayout {
    rows: usize,
    column_widths: Vec<u32>,
    column_offsets: Vec<u64>,
    row_width: u64,
    size_in_bytes: usize,
}

impl BitPackedLayout {
    pub fn new(rows: usize, column_widths: &[u32]) -> Result<Self> {
        ensure!(!column_widths.is_empty(), EmptyColumnsSnafu);

        let mut column_offsets = Vec::with_capacity(column_widths.len());
        let mut row_width = 0u64;
        for (column, &width) in column_widths.iter().enumerate() {
            ensure!(
                (1..=MAX_COLUMN_WIDTH).contains(&width),
                InvalidColumnWidthSnafu { column, width }
            );
            column_offsets.push(row_width);
            row_width += u64::from(width);
        }

        let size_in_bytes = (rows as u64)
            .checked_mul(row_width)
            .map(|bits| bits.div_ceil(8))
            .and_then(|bytes| usize::try_from(bytes).ok())
            .context(LayoutOverflowSnafu { rows, row_width })?;

        Ok(Self {
            rows,
            column_widths: column_widths.to_vec(),
            column_offsets,
            row_width,
            size_in_bytes,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.column_widths.len()
    }

    pub fn column_widths(&self) -> &[u32] {
        &self.column_widths
    }

    /// Bits per row.
    pub fn row_width(&self) -> u64 {
        self.row_width
    }

    /// Bytes needed to hold every row.
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }

    /// Returns the first bit of the cell at (`row`, `column`) and the width of `column`.
    pub fn locate(&self, row: usize, column: usize) -> Result<(u64, u32)> {
        ensure!(
            row < self.rows,
            RowOutOfBoundsSnafu {
                row,
                rows: self.rows,
            }
        );
        ensure!(
            column < self.column_widths.len(),
            ColumnOutOfBoundsSnafu {
                column,
                columns: self.column_widths.len(),
            }
        );

        let bit_offset = row as u64 * self.row_width + self.column_offsets[column];
        Ok((bit_offset, self.column_widths[column]))
    }
}

/// Bytes covering `width` bits starting at `bit_offset`.
pub fn byte_span(bit_offset: u64, width: u32) -> Range<usize> {
    let start = bit_offset / 8;
    let end = (bit_offset + u64::from(width)).div_ceil(8);
    start as usize..end as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_layout() {
        let layout = BitPackedLayout::new(10, &[3, 5, 64]).unwrap();
        assert_eq!(72, layout.row_width());
        assert_eq!(90, layout.size_in_bytes());
        assert_eq!(3, layout.num_columns());
        assert_eq!((0, 3), layout.locate(0, 0).unwrap());
        assert_eq!((3, 5), layout.locate(0, 1).unwrap());
        assert_eq!((72 + 8, 64), layout.locate(1, 2).unwrap());
    }

    #[test]
    fn test_size_rounds_up() {
        assert_eq!(1, BitPackedLayout::new(1, &[1]).unwrap().size_in_bytes());
        assert_eq!(2, BitPackedLayout::new(3, &[3]).unwrap().size_in_bytes());
        assert_eq!(0, BitPackedLayout::new(0, &[7]).unwrap().size_in_bytes());
    }

    #[test]
    fn test_invalid_layout() {
        assert!(matches!(
            BitPackedLayout::new(1, &[]).unwrap_err(),
            Error::EmptyColumns { .. }
        ));
        assert!(matches!(
            BitPackedLayout::new(1, &[3, 0]).unwrap_err(),
            Error::InvalidColumnWidth { column: 1, .. }
        ));
        assert!(matches!(
            BitPackedLayout::new(1, &[65]).unwrap_err(),
            Error::InvalidColumnWidth { width: 65, .. }
        ));
        assert!(matches!(
            BitPackedLayout::new(usize::MAX, &[64, 64]).unwrap_err(),
            Error::LayoutOverflow { .. }
        ));
    }

    #[test]
    fn test_locate_out_of_bounds() {
        let layout = BitPackedLayout::new(2, &[4, 4]).unwrap();
        assert!(matches!(
            layout.locate(2, 0).unwrap_err(),
            Error::RowOutOfBounds { .. }
        ));
        assert!(matches!(
            layout.locate(0, 2).unwrap_err(),
            Error::ColumnOutOfBounds { .. }
        ));
    }

    #[test]
    fn test_byte_span() {
        assert_eq!(0..1, byte_span(0, 3));
        assert_eq!(0..1, byte_span(3, 5));
        // 5 bits at offset 6 straddle two bytes.
        assert_eq!(0..2, byte_span(6, 5));
        assert_eq!(1..10, byte_span(12, 64));
        assert_eq!(1..9, byte_span(8, 64));
    }
}
