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

use std::any::Any;

use common_error::ext::ErrorExt;
use common_error::status_code::StatusCode;
use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("A bit-packed layout needs at least one column"))]
    EmptyColumns {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid width {} of column {}, expect 1..=64", width, column))]
    InvalidColumnWidth {
        column: usize,
        width: u32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Layout of {} rows with {} bits per row is too large",
        rows,
        row_width
    ))]
    LayoutOverflow {
        rows: usize,
        row_width: u64,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Row {} out of bounds, rows: {}", row, rows))]
    RowOutOfBounds {
        row: usize,
        rows: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Column {} out of bounds, columns: {}", column, columns))]
    ColumnOutOfBounds {
        column: usize,
        columns: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Value {} does not fit in {} bits of column {}",
        value,
        width,
        column
    ))]
    ValueOverflow {
        value: u64,
        width: u32,
        column: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Buffer too small, expect {} bytes, actual {}", expected, actual))]
    BufferTooSmall {
        expected: usize,
        actual: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to open file {}", path))]
    OpenFile {
        path: String,
        #[snafu(source)]
        error: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to map file {}", path))]
    MapFile {
        path: String,
        #[snafu(source)]
        error: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to flush mapped file {}", path))]
    Flush {
        path: String,
        #[snafu(source)]
        error: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl ErrorExt for Error {
    fn status_code(&self) -> StatusCode {
        use Error::*;
        match self {
            EmptyColumns { .. }
            | InvalidColumnWidth { .. }
            | LayoutOverflow { .. }
            | RowOutOfBounds { .. }
            | ColumnOutOfBounds { .. }
            | ValueOverflow { .. }
            | BufferTooSmall { .. } => StatusCode::InvalidArguments,
            OpenFile { .. } | MapFile { .. } | Flush { .. } => StatusCode::StorageUnavailable,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
