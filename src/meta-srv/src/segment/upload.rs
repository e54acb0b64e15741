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

use std::fmt;

use chrono::Utc;
use common_error::ext::{BoxedError, ErrorExt, PlainError};
use common_error::status_code::StatusCode;
use common_meta::custom_map::CustomMapModifier;
use common_meta::key::segment::{
    SegmentMetadataManager, SegmentMetadataValue, SegmentMetadataValueWithBytes,
};
use common_telemetry::{debug, error, info, warn};
use object_store::error::ObjectNotFoundSnafu;
use object_store::{ObjectStoreRef, StorageLocation};
use serde::{Deserialize, Serialize};
use snafu::{IntoError, ResultExt};

use crate::error::{
    CopyFailedSnafu, InternalSnafu, InvalidCustomMapModifierSnafu, MetadataWriteFailedSnafu,
    Result, VersionConflictSnafu,
};
use crate::segment::location::{
    segment_file_location, version_token_of, SegmentLocationAllocator,
};
use crate::segment::refresh::SegmentRefreshNotifierRef;
use crate::segment::validate::validate_time_range;
use crate::segment::{SegmentMetadata, VersionToken};

pub const DEFAULT_STORAGE_DIR: &str = "segments";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentUploaderOptions {
    /// Directory under the storage backend root that holds committed segments.
    pub storage_dir: String,
}

impl Default for SegmentUploaderOptions {
    fn default() -> Self {
        Self {
            storage_dir: DEFAULT_STORAGE_DIR.to_string(),
        }
    }
}

/// A segment staged on the storage backend, waiting to be committed.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub metadata: SegmentMetadata,
    /// Where the built segment currently lives.
    pub staging: StorageLocation,
    /// JSON [CustomMapModifier], applied when the segment already has a record.
    pub custom_map_modifier: Option<String>,
}

impl UploadRequest {
    pub fn new(metadata: SegmentMetadata, staging: StorageLocation) -> Self {
        Self {
            metadata,
            staging,
            custom_map_modifier: None,
        }
    }

    pub fn with_custom_map_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.custom_map_modifier = Some(modifier.into());
        self
    }
}

/// How an upload was reconciled with the segment's record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The segment had no record, a new one was committed.
    Created {
        location: StorageLocation,
        version_token: VersionToken,
    },
    /// The content is unchanged, only the record's custom map was modified.
    /// Carries the location and token that stay committed.
    MetadataUpdated {
        location: StorageLocation,
        version_token: VersionToken,
    },
    /// The content changed and the record now points at the new bytes.
    Refreshed {
        location: StorageLocation,
        version_token: VersionToken,
    },
}

impl UploadOutcome {
    pub fn location(&self) -> &StorageLocation {
        match self {
            UploadOutcome::Created { location, .. }
            | UploadOutcome::MetadataUpdated { location, .. }
            | UploadOutcome::Refreshed { location, .. } => location,
        }
    }

    pub fn version_token(&self) -> VersionToken {
        match self {
            UploadOutcome::Created { version_token, .. }
            | UploadOutcome::MetadataUpdated { version_token, .. }
            | UploadOutcome::Refreshed { version_token, .. } => *version_token,
        }
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            UploadOutcome::Created { .. } => "created",
            UploadOutcome::MetadataUpdated { .. } => "metadata updated",
            UploadOutcome::Refreshed { .. } => "refreshed",
        };
        write!(
            f,
            "{kind} at {}, version {}",
            self.location(),
            self.version_token()
        )
    }
}

/// Places uploaded segments into permanent storage and reconciles them with
/// their metadata records.
///
/// Concurrent attempts on the same segment are not serialized. Each attempt
/// copies its bytes to a location of its own, then commits with a
/// compare-and-put against the record it read. Losers fail with
/// [crate::error::Error::VersionConflict] and leave their copy orphaned.
pub struct SegmentUploader {
    store: ObjectStoreRef,
    metadata_manager: SegmentMetadataManager,
    notifier: SegmentRefreshNotifierRef,
    allocator: SegmentLocationAllocator,
}

impl SegmentUploader {
    pub fn new(
        store: ObjectStoreRef,
        metadata_manager: SegmentMetadataManager,
        notifier: SegmentRefreshNotifierRef,
        options: &SegmentUploaderOptions,
    ) -> Self {
        Self {
            store,
            metadata_manager,
            notifier,
            allocator: SegmentLocationAllocator::new(&options.storage_dir),
        }
    }

    pub fn allocator(&self) -> &SegmentLocationAllocator {
        &self.allocator
    }

    /// Validates the staged segment, copies it to a freshly allocated location
    /// and commits it.
    pub fn upload(&self, request: UploadRequest) -> Result<UploadOutcome> {
        let UploadRequest {
            metadata,
            staging,
            custom_map_modifier,
        } = request;
        info!(
            "Uploading segment {} of table {} from {}",
            metadata.segment_name, metadata.table_name, staging
        );

        let result = self.do_upload(&metadata, &staging, custom_map_modifier.as_deref());
        log_result(&metadata, &result);
        result
    }

    /// Commits a segment whose bytes are already at `location`.
    ///
    /// If the segment has a record, `location` must hold the committed version.
    pub fn push_metadata(
        &self,
        metadata: &SegmentMetadata,
        location: &StorageLocation,
        custom_map_modifier: Option<&str>,
    ) -> Result<UploadOutcome> {
        let result = self.token_of(metadata, location).and_then(|token| {
            self.reconcile(metadata, location, Some(token), custom_map_modifier)
        });
        log_result(metadata, &result);
        result
    }

    fn do_upload(
        &self,
        metadata: &SegmentMetadata,
        staging: &StorageLocation,
        custom_map_modifier: Option<&str>,
    ) -> Result<UploadOutcome> {
        validate_time_range(metadata)?;

        // The version this attempt replaces, if the segment is already committed.
        let base_token = self
            .load(metadata)?
            .map(|current| self.stored_token(metadata, &current))
            .transpose()?;

        let (version_dir, _) = self
            .allocator
            .allocate(&metadata.table_name, &metadata.segment_name)?;
        let file = segment_file_location(&version_dir, &metadata.segment_name);
        self.copy_segment(metadata, staging, &file)?;

        self.reconcile(metadata, &file, base_token, custom_map_modifier)
    }

    fn copy_segment(
        &self,
        metadata: &SegmentMetadata,
        staging: &StorageLocation,
        dst: &StorageLocation,
    ) -> Result<()> {
        self.store
            .copy(staging, dst)
            .and_then(|copied| {
                if copied {
                    Ok(())
                } else {
                    ObjectNotFoundSnafu {
                        path: staging.as_str(),
                    }
                    .fail()
                }
            })
            .context(CopyFailedSnafu {
                table: &metadata.table_name,
                segment: &metadata.segment_name,
                dst: dst.as_str(),
            })?;
        debug!(
            "Copied segment {} of table {} from {} to {}",
            metadata.segment_name, metadata.table_name, staging, dst
        );

        Ok(())
    }

    fn reconcile(
        &self,
        metadata: &SegmentMetadata,
        file: &StorageLocation,
        base_token: Option<VersionToken>,
        custom_map_modifier: Option<&str>,
    ) -> Result<UploadOutcome> {
        let token = self.token_of(metadata, file)?;

        let Some(current) = self.load(metadata)? else {
            return self.create(metadata, file, token);
        };

        let stored = self.stored_token(metadata, &current)?;
        if base_token != Some(stored) {
            return VersionConflictSnafu {
                table: &metadata.table_name,
                segment: &metadata.segment_name,
                expected: display_token(base_token),
                actual: stored.to_string(),
            }
            .fail();
        }

        self.update(metadata, file, token, stored, &current, custom_map_modifier)
    }

    fn create(
        &self,
        metadata: &SegmentMetadata,
        file: &StorageLocation,
        token: VersionToken,
    ) -> Result<UploadOutcome> {
        let (start_time_ms, end_time_ms) = time_range_of(metadata);
        let value = SegmentMetadataValue {
            table_name: metadata.table_name.clone(),
            segment_name: metadata.segment_name.clone(),
            crc: metadata.crc,
            version_token: token.to_string(),
            location: file.to_string(),
            start_time_ms,
            end_time_ms,
            time_unit: metadata.time_unit.map(|unit| unit.to_string()),
            push_time_ms: Utc::now().timestamp_millis(),
            refresh_time_ms: None,
            custom_map: None,
        };

        let created = self
            .metadata_manager
            .create(&value)
            .context(MetadataWriteFailedSnafu {
                table: &metadata.table_name,
                segment: &metadata.segment_name,
            })?;
        if !created {
            return self.conflict_with_latest(metadata, None);
        }

        Ok(UploadOutcome::Created {
            location: file.clone(),
            version_token: token,
        })
    }

    fn update(
        &self,
        metadata: &SegmentMetadata,
        file: &StorageLocation,
        token: VersionToken,
        stored: VersionToken,
        current: &SegmentMetadataValueWithBytes,
        custom_map_modifier: Option<&str>,
    ) -> Result<UploadOutcome> {
        let modifier = match custom_map_modifier {
            Some(modifier) => {
                modifier
                    .parse::<CustomMapModifier>()
                    .context(InvalidCustomMapModifierSnafu {
                        table: &metadata.table_name,
                        segment: &metadata.segment_name,
                    })?
            }
            None => CustomMapModifier::default(),
        };

        let mut updated = current.get_inner_ref().clone();
        updated.custom_map = modifier.modify_map(updated.custom_map.take());

        let refresh = updated.crc != metadata.crc;
        let outcome = if refresh {
            let (start_time_ms, end_time_ms) = time_range_of(metadata);
            updated.crc = metadata.crc;
            updated.version_token = token.to_string();
            updated.location = file.to_string();
            updated.start_time_ms = start_time_ms;
            updated.end_time_ms = end_time_ms;
            updated.time_unit = metadata.time_unit.map(|unit| unit.to_string());
            updated.refresh_time_ms = Some(Utc::now().timestamp_millis());
            UploadOutcome::Refreshed {
                location: file.clone(),
                version_token: token,
            }
        } else {
            UploadOutcome::MetadataUpdated {
                location: StorageLocation::new(&updated.location),
                version_token: stored,
            }
        };

        let updated = SegmentMetadataValueWithBytes::from_inner(updated).context(
            MetadataWriteFailedSnafu {
                table: &metadata.table_name,
                segment: &metadata.segment_name,
            },
        )?;
        let committed = match self.metadata_manager.update(current, &updated) {
            Ok(committed) => committed,
            Err(e) => {
                // The write may have landed before the failure surfaced.
                self.rollback(&updated, current);
                return Err(e).context(MetadataWriteFailedSnafu {
                    table: &metadata.table_name,
                    segment: &metadata.segment_name,
                });
            }
        };
        if !committed {
            return self.conflict_with_latest(metadata, Some(stored));
        }

        if refresh {
            if let Err(e) = self.notifier.notify_refreshed(updated.get_inner_ref()) {
                warn!(
                    "Failed to notify refresh of segment {} in table {}: {:?}",
                    metadata.segment_name, metadata.table_name, e
                );
            }
        }

        Ok(outcome)
    }

    /// Puts `previous` back unless the record moved past what this attempt wrote.
    fn rollback(
        &self,
        written: &SegmentMetadataValueWithBytes,
        previous: &SegmentMetadataValueWithBytes,
    ) {
        match self.metadata_manager.restore(written, previous) {
            Ok(true) => info!(
                "Rolled back metadata of segment {} in table {} to version {}",
                previous.segment_name, previous.table_name, previous.version_token
            ),
            Ok(false) => debug!(
                "Skip rolling back metadata of segment {} in table {}, it moved on",
                previous.segment_name, previous.table_name
            ),
            Err(e) => error!(
                "Failed to roll back metadata of segment {} in table {}: {:?}",
                previous.segment_name, previous.table_name, e
            ),
        }
    }

    fn conflict_with_latest<T>(
        &self,
        metadata: &SegmentMetadata,
        expected: Option<VersionToken>,
    ) -> Result<T> {
        let actual = self
            .load(metadata)?
            .map(|latest| latest.version_token.clone())
            .unwrap_or_else(|| "none".to_string());

        VersionConflictSnafu {
            table: &metadata.table_name,
            segment: &metadata.segment_name,
            expected: display_token(expected),
            actual,
        }
        .fail()
    }

    fn load(&self, metadata: &SegmentMetadata) -> Result<Option<SegmentMetadataValueWithBytes>> {
        self.metadata_manager
            .get(&metadata.table_name, &metadata.segment_name)
            .map_err(BoxedError::new)
            .context(InternalSnafu {
                table: &metadata.table_name,
                segment: &metadata.segment_name,
            })
    }

    fn token_of(&self, metadata: &SegmentMetadata, file: &StorageLocation) -> Result<VersionToken> {
        version_token_of(
            self.store.as_ref(),
            &metadata.table_name,
            &metadata.segment_name,
            file,
        )
    }

    fn stored_token(
        &self,
        metadata: &SegmentMetadata,
        current: &SegmentMetadataValue,
    ) -> Result<VersionToken> {
        current.version_token.parse().map_err(|e| {
            let source = PlainError::new(
                format!(
                    "Stored version token {} is malformed: {}",
                    current.version_token, e
                ),
                StatusCode::Unexpected,
            );
            InternalSnafu {
                table: &metadata.table_name,
                segment: &metadata.segment_name,
            }
            .into_error(BoxedError::new(source))
        })
    }
}

fn display_token(token: Option<VersionToken>) -> String {
    token
        .map(|t| t.to_string())
        .unwrap_or_else(|| "none".to_string())
}

fn time_range_of(metadata: &SegmentMetadata) -> (Option<i64>, Option<i64>) {
    match metadata.time_interval {
        Some(interval) => (Some(interval.start_ms), Some(interval.end_ms)),
        None => (None, None),
    }
}

fn log_result(metadata: &SegmentMetadata, result: &Result<UploadOutcome>) {
    match result {
        Ok(outcome) => info!(
            "Segment {} of table {} {}",
            metadata.segment_name, metadata.table_name, outcome
        ),
        Err(e) if e.status_code().should_log_error() => error!(
            "Failed to upload segment {} of table {}: {:?}",
            metadata.segment_name, metadata.table_name, e
        ),
        Err(e) => warn!(
            "Rejected segment {} of table {}: {}",
            metadata.segment_name,
            metadata.table_name,
            e.output_msg()
        ),
    }
}
