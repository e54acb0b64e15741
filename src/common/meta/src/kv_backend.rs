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

pub mod memory;

use std::any::Any;
use std::sync::Arc;

use crate::error::Result;
use crate::rpc::store::{
    CompareAndPutRequest, CompareAndPutResponse, DeleteRequest, DeleteResponse, PutRequest,
    PutResponse, RangeRequest, RangeResponse,
};
use crate::rpc::KeyValue;

pub type KvBackendRef = Arc<dyn KvBackend>;

/// The authoritative metadata store.
///
/// All calls block the caller until the backend answers; none of them retry.
pub trait KvBackend: Send + Sync {
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn range(&self, req: RangeRequest) -> Result<RangeResponse>;

    fn put(&self, req: PutRequest) -> Result<PutResponse>;

    /// Compare and put value of key.
    ///
    /// - If the backend's current value of the key equals `expect` (an empty `expect`
    ///   matches an absent key), the value is replaced and `success` is true.
    /// - Otherwise nothing is written and `prev_kv` carries the current value, if any.
    fn compare_and_put(&self, req: CompareAndPutRequest) -> Result<CompareAndPutResponse>;

    fn delete(&self, req: DeleteRequest) -> Result<DeleteResponse>;

    /// Default get is implemented based on `range` method.
    fn get(&self, key: &[u8]) -> Result<Option<KeyValue>> {
        let resp = self.range(RangeRequest::new().with_prefix(key))?;
        Ok(resp.kvs.into_iter().find(|kv| kv.key == key))
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}
