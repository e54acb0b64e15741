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

use chrono::DateTime;
use common_telemetry::error;
use snafu::ensure;

use crate::error::{InvalidTimeRangeSnafu, Result};
use crate::segment::SegmentMetadata;

/// 1971-01-01T00:00:00Z in epoch milliseconds.
pub const MIN_VALID_TIME_MS: i64 = 31_536_000_000;
/// 2071-01-01T00:00:00Z in epoch milliseconds.
pub const MAX_VALID_TIME_MS: i64 = 3_187_296_000_000;

pub fn is_valid_time_ms(ms: i64) -> bool {
    (MIN_VALID_TIME_MS..=MAX_VALID_TIME_MS).contains(&ms)
}

fn format_ms(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| format!("{ms}ms"))
}

/// Checks that both ends of the segment's time interval lie in the accepted window.
///
/// A segment without a time interval is always accepted.
pub fn validate_time_range(metadata: &SegmentMetadata) -> Result<()> {
    let Some(interval) = metadata.time_interval else {
        return Ok(());
    };

    let valid = is_valid_time_ms(interval.start_ms) && is_valid_time_ms(interval.end_ms);
    if !valid {
        error!(
            "Invalid start time '{}ms' or end time '{}ms' for segment {} of table {}, must be between '{}' and '{}' (time column {:?}, time unit {:?})",
            interval.start_ms,
            interval.end_ms,
            metadata.segment_name,
            metadata.table_name,
            format_ms(MIN_VALID_TIME_MS),
            format_ms(MAX_VALID_TIME_MS),
            metadata.time_column,
            metadata.time_unit,
        );
    }
    ensure!(
        valid,
        InvalidTimeRangeSnafu {
            table: &metadata.table_name,
            segment: &metadata.segment_name,
            start_ms: interval.start_ms,
            end_ms: interval.end_ms,
        }
    );

    Ok(())
}
