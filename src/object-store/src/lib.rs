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

pub mod config;
pub mod error;
mod location;
pub mod registry;
pub mod services;
pub mod util;

use std::any::Any;
use std::sync::Arc;

pub use crate::config::StorageOptions;
pub use crate::error::{Error, Result};
pub use crate::location::StorageLocation;
pub use crate::registry::BackendRegistry;

pub type ObjectStoreRef = Arc<dyn ObjectStore>;

/// Where segment bytes live.
///
/// Every operation is blocking and executes exactly once; callers own any
/// retry or deadline policy.
pub trait ObjectStore: Send + Sync {
    /// Name the backend is registered under.
    fn backend_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    /// Removes the object at `loc`, or the whole tree if `loc` is a directory.
    ///
    /// Returns false if nothing existed.
    fn delete(&self, loc: &StorageLocation) -> Result<bool>;

    /// Relocates `src` to `dst`, creating the missing parents of `dst`.
    ///
    /// Afterwards either `dst` holds all the bytes and `src` is gone, or `dst`
    /// does not exist. Returns false if `src` does not exist.
    fn move_to(&self, src: &StorageLocation, dst: &StorageLocation) -> Result<bool>;

    /// Duplicates `src` into `dst`, creating the missing parents of `dst`.
    ///
    /// A partially written `dst` is removed on failure. Returns false if `src`
    /// does not exist.
    fn copy(&self, src: &StorageLocation, dst: &StorageLocation) -> Result<bool>;

    fn exists(&self, loc: &StorageLocation) -> Result<bool>;

    /// Size in bytes of the object at `loc`.
    fn length(&self, loc: &StorageLocation) -> Result<u64>;

    /// Names of the direct children of `loc`, sorted, or `None` if `loc` is
    /// not a directory.
    fn list_files(&self, loc: &StorageLocation) -> Result<Option<Vec<String>>>;

    /// Writes `bytes` as the whole content of `loc`.
    fn write(&self, loc: &StorageLocation, bytes: &[u8]) -> Result<()>;

    fn read(&self, loc: &StorageLocation) -> Result<Vec<u8>>;

    fn parent(&self, loc: &StorageLocation) -> Option<StorageLocation> {
        loc.parent()
    }

    fn name(&self, loc: &StorageLocation) -> String {
        loc.name().to_string()
    }
}
