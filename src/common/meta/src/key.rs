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

//! Keys and values stored in the metadata store.
//!
//! Every segment committed by an upload owns a single record:
//! `__segment/{table_name}/{segment_name}` -> [SegmentMetadataValue] (json).

pub mod segment;

use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::ResultExt;

use crate::error::{Result, SerdeJsonSnafu};

pub const SEGMENT_KEY_PREFIX: &str = "__segment";

pub trait MetadataKey {
    fn as_raw_key(&self) -> Vec<u8>;
}

pub trait MetadataValue: Sized {
    fn try_from_raw_value(raw_value: &[u8]) -> Result<Self>;

    fn try_as_raw_value(&self) -> Result<Vec<u8>>;
}

impl<T: Serialize + DeserializeOwned> MetadataValue for T {
    fn try_from_raw_value(raw_value: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw_value).context(SerdeJsonSnafu)
    }

    fn try_as_raw_value(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context(SerdeJsonSnafu)
    }
}

/// A deserialized value together with the exact bytes it was decoded from.
///
/// The bytes are the `expect` of a later compare-and-put, so an update only
/// lands if nobody changed the record in between.
#[derive(Debug, Clone, PartialEq)]
pub struct DeserializedValueWithBytes<T> {
    bytes: Vec<u8>,
    inner: T,
}

impl<T: MetadataValue> DeserializedValueWithBytes<T> {
    pub fn from_inner_slice(bytes: &[u8]) -> Result<Self> {
        let inner = T::try_from_raw_value(bytes)?;
        Ok(Self {
            bytes: bytes.to_vec(),
            inner,
        })
    }

    /// Encodes `inner` and keeps the encoded bytes.
    pub fn from_inner(inner: T) -> Result<Self> {
        let bytes = inner.try_as_raw_value()?;
        Ok(Self { bytes, inner })
    }

    pub fn get_raw_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn get_inner_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for DeserializedValueWithBytes<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
