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

use common_error::ext::{BoxedError, ErrorExt};
use common_error::status_code::StatusCode;
use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display(
        "Invalid time range [{}, {}] of segment {} in table {}",
        start_ms,
        end_ms,
        segment,
        table
    ))]
    InvalidTimeRange {
        table: String,
        segment: String,
        start_ms: i64,
        end_ms: i64,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Cannot allocate location for segment {} of table {}: {}",
        segment,
        table,
        reason
    ))]
    InvalidSegmentLocation {
        table: String,
        segment: String,
        reason: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Invalid location {} of segment {} in table {}: {}",
        path,
        segment,
        table,
        reason
    ))]
    InvalidLocation {
        table: String,
        segment: String,
        path: String,
        reason: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Another upload of segment {} in table {} is in progress, expect version {}, found {}, retry later",
        segment,
        table,
        expected,
        actual
    ))]
    VersionConflict {
        table: String,
        segment: String,
        expected: String,
        actual: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to copy segment {} of table {} to {}", segment, table, dst))]
    CopyFailed {
        table: String,
        segment: String,
        dst: String,
        #[snafu(source)]
        error: object_store::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid custom map modifier for segment {} of table {}", segment, table))]
    InvalidCustomMapModifier {
        table: String,
        segment: String,
        #[snafu(source)]
        error: common_meta::error::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to write metadata of segment {} in table {}", segment, table))]
    MetadataWriteFailed {
        table: String,
        segment: String,
        #[snafu(source)]
        error: common_meta::error::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to build storage backend {}", backend))]
    BuildStorage {
        backend: String,
        #[snafu(source)]
        error: object_store::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Internal error on segment {} of table {}", segment, table))]
    Internal {
        table: String,
        segment: String,
        #[snafu(source)]
        error: BoxedError,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl ErrorExt for Error {
    fn status_code(&self) -> StatusCode {
        use Error::*;
        match self {
            InvalidTimeRange { .. } => StatusCode::NotAcceptable,
            InvalidSegmentLocation { .. }
            | InvalidLocation { .. }
            | InvalidCustomMapModifier { .. } => StatusCode::InvalidArguments,
            VersionConflict { .. } => StatusCode::RequestOutdated,
            CopyFailed { .. } => StatusCode::StorageUnavailable,
            MetadataWriteFailed { error, .. } => error.status_code(),
            BuildStorage { error, .. } => error.status_code(),
            Internal { .. } => StatusCode::Internal,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use common_meta::error::KvBackendUnavailableSnafu;
    use snafu::IntoError;

    use super::*;

    #[test]
    fn test_status_code() {
        let err = VersionConflictSnafu {
            table: "t",
            segment: "s",
            expected: "v1",
            actual: "v2",
        }
        .build();
        assert_eq!(StatusCode::RequestOutdated, err.status_code());
        assert_eq!(409, err.status_code().http_status());
        assert!(err.status_code().is_retryable());

        let err = InvalidTimeRangeSnafu {
            table: "t",
            segment: "s",
            start_ms: 0i64,
            end_ms: 1i64,
        }
        .build();
        assert_eq!(406, err.status_code().http_status());

        let source = KvBackendUnavailableSnafu {
            name: "memory",
            reason: "closed",
        }
        .build();
        let err = MetadataWriteFailedSnafu {
            table: "t",
            segment: "s",
        }
        .into_error(source);
        assert_eq!(StatusCode::StorageUnavailable, err.status_code());
    }
}
