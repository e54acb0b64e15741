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

use std::fmt::Display;

use common_telemetry::debug;
use serde::{Deserialize, Serialize};

use crate::custom_map::CustomMap;
use crate::error::Result;
use crate::key::{DeserializedValueWithBytes, MetadataKey, MetadataValue, SEGMENT_KEY_PREFIX};
use crate::kv_backend::KvBackendRef;
use crate::rpc::store::{CompareAndPutRequest, DeleteRequest, RangeRequest};

/// The key of a segment record: `__segment/{table_name}/{segment_name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentKey<'a> {
    pub table_name: &'a str,
    pub segment_name: &'a str,
}

impl<'a> SegmentKey<'a> {
    pub fn new(table_name: &'a str, segment_name: &'a str) -> Self {
        Self {
            table_name,
            segment_name,
        }
    }

    /// Prefix shared by every segment record of `table_name`.
    pub fn table_prefix(table_name: &str) -> String {
        format!("{SEGMENT_KEY_PREFIX}/{table_name}/")
    }
}

impl Display for SegmentKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            Self::table_prefix(self.table_name),
            self.segment_name
        )
    }
}

impl MetadataKey for SegmentKey<'_> {
    fn as_raw_key(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

/// The committed state of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMetadataValue {
    pub table_name: String,
    pub segment_name: String,
    /// Checksum of the segment content.
    pub crc: u64,
    /// Token of the upload attempt whose bytes `location` points to.
    pub version_token: String,
    /// Where the committed bytes live on the storage backend.
    pub location: String,
    #[serde(default)]
    pub start_time_ms: Option<i64>,
    #[serde(default)]
    pub end_time_ms: Option<i64>,
    #[serde(default)]
    pub time_unit: Option<String>,
    /// When the segment was first committed.
    pub push_time_ms: i64,
    /// When the segment content was last replaced.
    #[serde(default)]
    pub refresh_time_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_map: Option<CustomMap>,
}

impl SegmentMetadataValue {
    pub fn key(&self) -> SegmentKey<'_> {
        SegmentKey::new(&self.table_name, &self.segment_name)
    }
}

pub type SegmentMetadataValueWithBytes = DeserializedValueWithBytes<SegmentMetadataValue>;

/// Typed access to segment records on top of a [KvBackend](crate::kv_backend::KvBackend).
#[derive(Clone)]
pub struct SegmentMetadataManager {
    kv_backend: KvBackendRef,
}

impl SegmentMetadataManager {
    pub fn new(kv_backend: KvBackendRef) -> Self {
        Self { kv_backend }
    }

    pub fn kv_backend(&self) -> &KvBackendRef {
        &self.kv_backend
    }

    pub fn get(
        &self,
        table_name: &str,
        segment_name: &str,
    ) -> Result<Option<SegmentMetadataValueWithBytes>> {
        let key = SegmentKey::new(table_name, segment_name);
        self.kv_backend
            .get(&key.as_raw_key())?
            .map(|kv| SegmentMetadataValueWithBytes::from_inner_slice(&kv.value))
            .transpose()
    }

    /// Creates the record if the segment has none yet.
    ///
    /// Returns false if another writer created it first.
    pub fn create(&self, value: &SegmentMetadataValue) -> Result<bool> {
        let key = value.key();
        let req = CompareAndPutRequest::new()
            .with_key(key.as_raw_key())
            .with_value(value.try_as_raw_value()?);
        let resp = self.kv_backend.compare_and_put(req)?;
        debug!("Create segment record {}, success: {}", key, resp.success);

        Ok(resp.success)
    }

    /// Replaces `current` with `new`.
    ///
    /// Returns false if the stored record no longer equals `current`.
    pub fn update(
        &self,
        current: &SegmentMetadataValueWithBytes,
        new: &SegmentMetadataValueWithBytes,
    ) -> Result<bool> {
        let key = current.key();
        let req = CompareAndPutRequest::new()
            .with_key(key.as_raw_key())
            .with_expect(current.get_raw_bytes())
            .with_value(new.get_raw_bytes());
        let resp = self.kv_backend.compare_and_put(req)?;
        debug!("Update segment record {}, success: {}", key, resp.success);

        Ok(resp.success)
    }

    /// Puts `previous` back if the stored record is still `written`.
    ///
    /// Returns false if `written` never landed or was replaced since.
    pub fn restore(
        &self,
        written: &SegmentMetadataValueWithBytes,
        previous: &SegmentMetadataValueWithBytes,
    ) -> Result<bool> {
        let key = previous.key();
        let req = CompareAndPutRequest::new()
            .with_key(key.as_raw_key())
            .with_expect(written.get_raw_bytes())
            .with_value(previous.get_raw_bytes());
        let resp = self.kv_backend.compare_and_put(req)?;
        debug!("Restore segment record {}, success: {}", key, resp.success);

        Ok(resp.success)
    }

    pub fn delete(&self, table_name: &str, segment_name: &str) -> Result<bool> {
        let key = SegmentKey::new(table_name, segment_name);
        let resp = self.kv_backend.delete(DeleteRequest {
            key: key.as_raw_key(),
            prev_kv: false,
        })?;

        Ok(resp.deleted)
    }

    /// Lists the records of every segment of `table_name`.
    pub fn list(&self, table_name: &str) -> Result<Vec<SegmentMetadataValue>> {
        let resp = self
            .kv_backend
            .range(RangeRequest::new().with_prefix(SegmentKey::table_prefix(table_name)))?;

        resp.kvs
            .iter()
            .map(|kv| SegmentMetadataValue::try_from_raw_value(&kv.value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::kv_backend::memory::MemoryKvBackend;

    fn new_value(table_name: &str, segment_name: &str, crc: u64) -> SegmentMetadataValue {
        SegmentMetadataValue {
            table_name: table_name.to_string(),
            segment_name: segment_name.to_string(),
            crc,
            version_token: "5ad3c2e1-4a7e-4c6f-9d3e-0e8c1d2b3a4f".to_string(),
            location: format!("{table_name}/{segment_name}/5ad3c2e1-4a7e-4c6f-9d3e-0e8c1d2b3a4f/{segment_name}"),
            start_time_ms: Some(1_600_000_000_000),
            end_time_ms: Some(1_600_000_360_000),
            time_unit: Some("MILLISECONDS".to_string()),
            push_time_ms: 1_700_000_000_000,
            refresh_time_ms: None,
            custom_map: None,
        }
    }

    fn new_manager() -> SegmentMetadataManager {
        SegmentMetadataManager::new(Arc::new(MemoryKvBackend::new()))
    }

    #[test]
    fn test_segment_key() {
        let key = SegmentKey::new("events", "events_0");
        assert_eq!("__segment/events/events_0", key.to_string());
        assert_eq!(b"__segment/events/events_0".to_vec(), key.as_raw_key());
    }

    #[test]
    fn test_create_and_get() {
        let manager = new_manager();
        assert!(manager.get("events", "events_0").unwrap().is_none());

        let value = new_value("events", "events_0", 100);
        assert!(manager.create(&value).unwrap());
        // The second creation loses.
        assert!(!manager.create(&new_value("events", "events_0", 200)).unwrap());

        let got = manager.get("events", "events_0").unwrap().unwrap();
        assert_eq!(&value, got.get_inner_ref());
        assert_eq!(100, got.crc);
    }

    #[test]
    fn test_update_compares_bytes() {
        let manager = new_manager();
        let value = new_value("events", "events_0", 100);
        assert!(manager.create(&value).unwrap());

        let current = manager.get("events", "events_0").unwrap().unwrap();
        let mut updated = current.get_inner_ref().clone();
        updated.crc = 200;
        let updated = SegmentMetadataValueWithBytes::from_inner(updated).unwrap();
        assert!(manager.update(&current, &updated).unwrap());

        // `current` is stale now.
        let mut again = current.get_inner_ref().clone();
        again.crc = 300;
        let again = SegmentMetadataValueWithBytes::from_inner(again).unwrap();
        assert!(!manager.update(&current, &again).unwrap());
        assert_eq!(200, manager.get("events", "events_0").unwrap().unwrap().crc);
    }

    #[test]
    fn test_restore_only_own_write() {
        let manager = new_manager();
        assert!(manager.create(&new_value("events", "events_0", 100)).unwrap());
        let previous = manager.get("events", "events_0").unwrap().unwrap();

        let written =
            SegmentMetadataValueWithBytes::from_inner(new_value("events", "events_0", 200))
                .unwrap();
        // Nothing was written, nothing is restored.
        assert!(!manager.restore(&written, &previous).unwrap());
        assert_eq!(100, manager.get("events", "events_0").unwrap().unwrap().crc);

        assert!(manager.update(&previous, &written).unwrap());
        assert!(manager.restore(&written, &previous).unwrap());
        assert_eq!(
            previous.get_raw_bytes(),
            manager
                .get("events", "events_0")
                .unwrap()
                .unwrap()
                .get_raw_bytes()
        );

        // Another writer replaced the record after `written` landed.
        assert!(manager.update(&previous, &written).unwrap());
        let winner =
            SegmentMetadataValueWithBytes::from_inner(new_value("events", "events_0", 999))
                .unwrap();
        assert!(manager.update(&written, &winner).unwrap());
        assert!(!manager.restore(&written, &previous).unwrap());
        assert_eq!(999, manager.get("events", "events_0").unwrap().unwrap().crc);
    }

    #[test]
    fn test_list_and_delete() {
        let manager = new_manager();
        assert!(manager.create(&new_value("events", "events_0", 1)).unwrap());
        assert!(manager.create(&new_value("events", "events_1", 2)).unwrap());
        assert!(manager.create(&new_value("events2", "events2_0", 3)).unwrap());

        let listed = manager.list("events").unwrap();
        assert_eq!(2, listed.len());
        assert_eq!("events_0", listed[0].segment_name);
        assert_eq!("events_1", listed[1].segment_name);

        assert!(manager.delete("events", "events_0").unwrap());
        assert!(!manager.delete("events", "events_0").unwrap());
        assert_eq!(1, manager.list("events").unwrap().len());
    }

    #[test]
    fn test_decode_without_optional_fields() {
        let raw = br#"{"table_name":"t","segment_name":"s","crc":7,"version_token":"v","location":"t/s/v/s","push_time_ms":1}"#;
        let value = SegmentMetadataValue::try_from_raw_value(raw).unwrap();
        assert_eq!(None, value.custom_map);
        assert_eq!(None, value.refresh_time_ms);
        assert_eq!(7, value.crc);
    }
}
