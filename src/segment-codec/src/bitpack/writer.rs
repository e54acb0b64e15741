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

use std::path::Path;

use common_telemetry::debug;
use snafu::ensure;

use super::buffer::{MmapBuffer, PackedBuffer};
use super::layout::{byte_span, BitPackedLayout};
use crate::error::{BufferTooSmallSnafu, Result, ValueOverflowSnafu};

/// Packs fixed-width unsigned integers into a [BitPackedLayout].
///
/// A value's bits are stored least significant bit first, starting at the
/// cell's bit offset. Bytes shared with neighbouring cells are updated by OR,
/// so each cell must be set at most once on a zeroed buffer.
///
/// `set_value` takes `&mut self`, so writing from several threads needs
/// external synchronization.
#[derive(Debug)]
pub struct BitPackedWriter<B> {
    buffer: B,
    layout: BitPackedLayout,
}

impl BitPackedWriter<MmapBuffer> {
    /// Creates the file at `path`, sized and zero-filled for `layout`, and maps it.
    pub fn create(path: impl AsRef<Path>, layout: BitPackedLayout) -> Result<Self> {
        let path = path.as_ref();
        let buffer = MmapBuffer::create(path, layout.size_in_bytes())?;
        debug!(
            "Created bit-packed file {}, rows: {}, row width: {}, size: {}",
            path.display(),
            layout.rows(),
            layout.row_width(),
            layout.size_in_bytes()
        );

        Ok(Self { buffer, layout })
    }
}

impl<B: PackedBuffer> BitPackedWriter<B> {
    /// Packs into a caller supplied buffer.
    ///
    /// The first [BitPackedLayout::size_in_bytes] bytes of `buffer` are zeroed.
    pub fn with_buffer(mut buffer: B, layout: BitPackedLayout) -> Result<Self> {
        let size = layout.size_in_bytes();
        let actual = buffer.as_ref().len();
        ensure!(
            actual >= size,
            BufferTooSmallSnafu {
                expected: size,
                actual,
            }
        );
        buffer.as_mut()[..size].fill(0);

        Ok(Self { buffer, layout })
    }

    pub fn layout(&self) -> &BitPackedLayout {
        &self.layout
    }

    /// Sets the cell at (`row`, `column`) to `value`.
    ///
    /// Fails without writing if the cell is out of bounds or `value` needs
    /// more bits than the column has.
    pub fn set_value(&mut self, row: usize, column: usize, value: u64) -> Result<()> {
        let (bit_offset, width) = self.layout.locate(row, column)?;
        ensure!(
            width == 64 || value >> width == 0,
            ValueOverflowSnafu {
                value,
                width,
                column,
            }
        );

        let span = byte_span(bit_offset, width);
        let bytes = &mut self.buffer.as_mut()[span];
        let mut shift = (bit_offset % 8) as u32;
        let mut remaining = width;
        let mut value = value;
        for byte in bytes.iter_mut() {
            let take = remaining.min(8 - shift);
            let mask = (1u64 << take) - 1;
            *byte |= ((value & mask) << shift) as u8;
            value >>= take;
            remaining -= take;
            shift = 0;
        }
        debug_assert_eq!(0, remaining);

        Ok(())
    }

    /// Flushes the packed bytes and hands the buffer back.
    pub fn finish(mut self) -> Result<B> {
        self.buffer.flush()?;
        Ok(self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn writer(rows: usize, widths: &[u32]) -> BitPackedWriter<Vec<u8>> {
        let layout = BitPackedLayout::new(rows, widths).unwrap();
        BitPackedWriter::with_buffer(vec![0xff; layout.size_in_bytes()], layout).unwrap()
    }

    #[test]
    fn test_with_buffer_zeroes_layout_range() {
        let layout = BitPackedLayout::new(2, &[4]).unwrap();
        let buf = BitPackedWriter::with_buffer(vec![0xffu8; 3], layout)
            .unwrap()
            .finish()
            .unwrap();
        // Only the byte covered by the layout is zeroed.
        assert_eq!(vec![0x00, 0xff, 0xff], buf);
    }

    #[test]
    fn test_buffer_too_small() {
        let layout = BitPackedLayout::new(3, &[8]).unwrap();
        let err = BitPackedWriter::with_buffer(vec![0u8; 2], layout).unwrap_err();
        assert!(matches!(err, Error::BufferTooSmall { expected: 3, actual: 2, .. }));
    }

    #[test]
    fn test_shared_byte() {
        // 3 bits + 5 bits share the first byte.
        let mut w = writer(1, &[3, 5]);
        w.set_value(0, 0, 0b101).unwrap();
        w.set_value(0, 1, 0b10011).unwrap();
        assert_eq!(vec![0b1001_1101], w.finish().unwrap());
    }

    #[test]
    fn test_straddling_span() {
        // 5 bits at offset 6 straddle the first two bytes.
        let mut w = writer(1, &[6, 5]);
        w.set_value(0, 1, 0b11111).unwrap();
        assert_eq!(vec![0b1100_0000, 0b0000_0111], w.finish().unwrap());
    }

    #[test]
    fn test_full_width() {
        let mut w = writer(2, &[4, 64]);
        w.set_value(0, 1, u64::MAX).unwrap();
        w.set_value(1, 0, 0xf).unwrap();
        let buf = w.finish().unwrap();
        assert_eq!(17, buf.len());
        assert_eq!(0xf0, buf[0]);
        assert!(buf[1..8].iter().all(|b| *b == 0xff));
        // Last 4 bits of column 1 and all of row 1 column 0.
        assert_eq!(0xff, buf[8]);
        assert!(buf[9..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_value_overflow() {
        let mut w = writer(1, &[3]);
        let err = w.set_value(0, 0, 8).unwrap_err();
        assert!(matches!(err, Error::ValueOverflow { value: 8, width: 3, .. }));
        assert!(w.set_value(0, 0, 7).is_ok());
        assert!(matches!(
            w.set_value(1, 0, 1).unwrap_err(),
            Error::RowOutOfBounds { .. }
        ));
    }

    #[test]
    fn test_borrowed_buffer() {
        let mut storage = [0xaau8; 4];
        let layout = BitPackedLayout::new(2, &[8]).unwrap();
        let mut w = BitPackedWriter::with_buffer(&mut storage[..], layout).unwrap();
        w.set_value(1, 0, 0x42).unwrap();
        let _ = w.finish().unwrap();
        assert_eq!([0x00, 0x42, 0xaa, 0xaa], storage);
    }
}
