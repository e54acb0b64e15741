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

use crate::rpc::KeyValue;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutRequest {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    /// If prev_kv is set, gets the previous key-value pair before changing it.
    pub prev_kv: bool,
}

impl PutRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_prev_kv(mut self) -> Self {
        self.prev_kv = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutResponse {
    pub prev_kv: Option<KeyValue>,
}

/// Puts `value` only if the current value of `key` equals `expect`.
///
/// An empty `expect` means the key must not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareAndPutRequest {
    pub key: Vec<u8>,
    pub expect: Vec<u8>,
    pub value: Vec<u8>,
}

impl CompareAndPutRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_expect(mut self, expect: impl Into<Vec<u8>>) -> Self {
        self.expect = expect.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = value.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareAndPutResponse {
    pub success: bool,
    /// The current value when the comparison failed.
    pub prev_kv: Option<KeyValue>,
}

impl CompareAndPutResponse {
    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn take_prev_kv(&mut self) -> Option<KeyValue> {
        self.prev_kv.take()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeRequest {
    /// Lists every key starting with `prefix`; an empty prefix lists all keys.
    pub prefix: Vec<u8>,
    /// Zero means no limit.
    pub limit: usize,
}

impl RangeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeResponse {
    pub kvs: Vec<KeyValue>,
    pub more: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteRequest {
    pub key: Vec<u8>,
    pub prev_kv: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub prev_kv: Option<KeyValue>,
}
