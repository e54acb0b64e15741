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

use snafu::ensure;

use super::buffer::MappedFile;
use super::layout::{byte_span, BitPackedLayout};
use crate::error::{BufferTooSmallSnafu, Result};

/// Reads cells written by a [BitPackedWriter](crate::BitPackedWriter).
#[derive(Debug)]
pub struct BitPackedReader<B> {
    buffer: B,
    layout: BitPackedLayout,
}

impl BitPackedReader<MappedFile> {
    /// Maps the file at `path` read-only.
    pub fn open(path: impl AsRef<Path>, layout: BitPackedLayout) -> Result<Self> {
        let buffer = MappedFile::open(path.as_ref(), layout.size_in_bytes())?;
        Ok(Self { buffer, layout })
    }
}

impl<B: AsRef<[u8]>> BitPackedReader<B> {
    pub fn new(buffer: B, layout: BitPackedLayout) -> Result<Self> {
        let actual = buffer.as_ref().len();
        ensure!(
            actual >= layout.size_in_bytes(),
            BufferTooSmallSnafu {
                expected: layout.size_in_bytes(),
                actual,
            }
        );
        Ok(Self { buffer, layout })
    }

    pub fn layout(&self) -> &BitPackedLayout {
        &self.layout
    }

    pub fn get_value(&self, row: usize, column: usize) -> Result<u64> {
        let (bit_offset, width) = self.layout.locate(row, column)?;
        let bytes = &self.buffer.as_ref()[byte_span(bit_offset, width)];

        let mut shift = (bit_offset % 8) as u32;
        let mut read = 0u32;
        let mut value = 0u64;
        for byte in bytes {
            let take = (width - read).min(8 - shift);
            let bits = (u64::from(*byte) >> shift) & ((1u64 << take) - 1);
            value |= bits << read;
            read += take;
            shift = 0;
        }

        Ok(value)
    }

    pub fn into_inner(self) -> B {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_read_packed_bytes() {
        let layout = BitPackedLayout::new(1, &[3, 5]).unwrap();
        let reader = BitPackedReader::new(vec![0b1001_1101u8], layout).unwrap();
        assert_eq!(0b101, reader.get_value(0, 0).unwrap());
        assert_eq!(0b10011, reader.get_value(0, 1).unwrap());
    }

    #[test]
    fn test_short_buffer() {
        let layout = BitPackedLayout::new(2, &[8]).unwrap();
        let err = BitPackedReader::new(vec![0u8], layout).unwrap_err();
        assert!(matches!(err, Error::BufferTooSmall { .. }));
    }
}
