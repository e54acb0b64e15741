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

//! Placement of uploaded segments and reconciliation with their metadata records.

pub mod location;
pub mod refresh;
pub mod upload;
pub mod validate;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

/// Identifies one upload attempt of a segment.
///
/// Every allocated location gets a fresh token, so a token never names two
/// different attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken(Uuid);

impl VersionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for VersionToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Time covered by a segment, both ends inclusive, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Description of a built segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub table_name: String,
    pub segment_name: String,
    pub crc: u64,
    pub time_interval: Option<TimeInterval>,
    pub time_column: Option<String>,
    pub time_unit: Option<TimeUnit>,
}

impl SegmentMetadata {
    pub fn new(table_name: impl Into<String>, segment_name: impl Into<String>, crc: u64) -> Self {
        Self {
            table_name: table_name.into(),
            segment_name: segment_name.into(),
            crc,
            time_interval: None,
            time_column: None,
            time_unit: None,
        }
    }

    pub fn with_time_interval(
        mut self,
        start_ms: i64,
        end_ms: i64,
        time_column: impl Into<String>,
        time_unit: TimeUnit,
    ) -> Self {
        self.time_interval = Some(TimeInterval { start_ms, end_ms });
        self.time_column = Some(time_column.into());
        self.time_unit = Some(time_unit);
        self
    }
}
