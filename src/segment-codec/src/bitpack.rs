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

//! Fixed bit width row/column encoding.
//!
//! A matrix of `rows x columns` unsigned integers, where every column has its
//! own width between 1 and 64 bits, is stored row-major in
//! `ceil(rows * row_width / 8)` bytes. The file has no header; readers need
//! the same [BitPackedLayout] the writer used.

mod buffer;
mod layout;
mod reader;
mod writer;

pub use buffer::{MappedFile, MmapBuffer, PackedBuffer};
pub use layout::{byte_span, BitPackedLayout, MAX_COLUMN_WIDTH};
pub use reader::BitPackedReader;
pub use writer::BitPackedWriter;
