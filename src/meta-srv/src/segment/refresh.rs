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

use std::sync::Arc;

use common_error::ext::BoxedError;
use common_meta::key::segment::SegmentMetadataValue;
use common_telemetry::info;

pub type SegmentRefreshNotifierRef = Arc<dyn SegmentRefreshNotifier>;

/// Tells the nodes serving a segment that its content was replaced.
pub trait SegmentRefreshNotifier: Send + Sync {
    fn notify_refreshed(&self, segment: &SegmentMetadataValue) -> Result<(), BoxedError>;
}

/// Notifier that only logs the refresh.
#[derive(Debug, Default)]
pub struct LoggingRefreshNotifier;

impl SegmentRefreshNotifier for LoggingRefreshNotifier {
    fn notify_refreshed(&self, segment: &SegmentMetadataValue) -> Result<(), BoxedError> {
        info!(
            "Segment {} of table {} refreshed to version {}",
            segment.segment_name, segment.table_name, segment.version_token
        );
        Ok(())
    }
}
