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
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::RwLock;

use snafu::ensure;

use crate::error::{EmptyKeySnafu, Result};
use crate::kv_backend::KvBackend;
use crate::rpc::store::{
    CompareAndPutRequest, CompareAndPutResponse, DeleteRequest, DeleteResponse, PutRequest,
    PutResponse, RangeRequest, RangeResponse,
};
use crate::rpc::KeyValue;

#[derive(Default)]
pub struct MemoryKvBackend {
    kvs: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl Display for MemoryKvBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kvs = self.kvs.read().unwrap();
        for (k, v) in kvs.iter() {
            writeln!(
                f,
                "{} -> {}",
                String::from_utf8_lossy(k),
                String::from_utf8_lossy(v)
            )?;
        }
        Ok(())
    }
}

impl MemoryKvBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        let mut kvs = self.kvs.write().unwrap();
        kvs.clear();
    }

    pub fn len(&self) -> usize {
        self.kvs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvBackend for MemoryKvBackend {
    fn name(&self) -> &str {
        "Memory"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn range(&self, req: RangeRequest) -> Result<RangeResponse> {
        let RangeRequest { prefix, limit } = req;

        let kvs = self.kvs.read().unwrap();
        let mut values = kvs
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: v.clone(),
            });

        let kvs = if limit == 0 {
            values.by_ref().collect::<Vec<_>>()
        } else {
            values.by_ref().take(limit).collect::<Vec<_>>()
        };
        let more = values.next().is_some();

        Ok(RangeResponse { kvs, more })
    }

    fn put(&self, req: PutRequest) -> Result<PutResponse> {
        let PutRequest {
            key,
            value,
            prev_kv,
        } = req;
        ensure!(!key.is_empty(), EmptyKeySnafu);

        let mut kvs = self.kvs.write().unwrap();

        let prev_kv = if prev_kv {
            kvs.insert(key.clone(), value)
                .map(|value| KeyValue { key, value })
        } else {
            kvs.insert(key, value);
            None
        };

        Ok(PutResponse { prev_kv })
    }

    fn compare_and_put(&self, req: CompareAndPutRequest) -> Result<CompareAndPutResponse> {
        let CompareAndPutRequest { key, expect, value } = req;
        ensure!(!key.is_empty(), EmptyKeySnafu);

        let mut kvs = self.kvs.write().unwrap();

        let existed = kvs.entry(key);
        let (success, prev_kv) = match existed {
            Entry::Vacant(e) => {
                let expected = expect.is_empty();
                if expected {
                    let _ = e.insert(value);
                }
                (expected, None)
            }
            Entry::Occupied(mut existed) => {
                let expected = existed.get() == &expect;
                let prev_kv = if expected {
                    let _ = existed.insert(value);
                    None
                } else {
                    Some(KeyValue {
                        key: existed.key().clone(),
                        value: existed.get().clone(),
                    })
                };
                (expected, prev_kv)
            }
        };

        Ok(CompareAndPutResponse { success, prev_kv })
    }

    fn delete(&self, req: DeleteRequest) -> Result<DeleteResponse> {
        let DeleteRequest { key, prev_kv } = req;

        let mut kvs = self.kvs.write().unwrap();
        let removed = kvs.remove(&key);
        let deleted = removed.is_some();
        let prev_kv = if prev_kv {
            removed.map(|value| KeyValue { key, value })
        } else {
            None
        };

        Ok(DeleteResponse { deleted, prev_kv })
    }
}
