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

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use common_telemetry::info;
use snafu::OptionExt;

use crate::error::{Result, UnknownBackendSnafu};
use crate::services::{LocalFs, MemoryStore};
use crate::util::normalize_dir;
use crate::{ObjectStoreRef, StorageOptions};

/// Builds a backend from the storage options.
pub type BackendBuilder = fn(&StorageOptions) -> Result<ObjectStoreRef>;

/// Maps backend names to their builders.
///
/// Names are matched case-insensitively. `file` and `memory` are always
/// registered; more backends can be added at startup.
#[derive(Clone)]
pub struct BackendRegistry {
    builders: HashMap<String, BackendBuilder>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.builders.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("BackendRegistry")
            .field("backends", &names)
            .finish()
    }
}

fn build_local_fs(options: &StorageOptions) -> Result<ObjectStoreRef> {
    Ok(Arc::new(LocalFs::new(&options.data_home)?))
}

fn build_memory(_options: &StorageOptions) -> Result<ObjectStoreRef> {
    Ok(Arc::new(MemoryStore::new()?))
}

impl Default for BackendRegistry {
    fn default() -> Self {
        let mut registry = Self {
            builders: HashMap::new(),
        };
        let _ = registry.register(LocalFs::NAME, build_local_fs);
        let _ = registry.register(MemoryStore::NAME, build_memory);
        registry
    }
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `builder` under `name`, returning the builder it replaces.
    pub fn register(&mut self, name: &str, builder: BackendBuilder) -> Option<BackendBuilder> {
        self.builders.insert(name.to_ascii_lowercase(), builder)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(&name.to_ascii_lowercase())
    }

    /// Builds the backend named by `options.backend`.
    pub fn build(&self, options: &StorageOptions) -> Result<ObjectStoreRef> {
        let builder = self
            .builders
            .get(&options.backend.to_ascii_lowercase())
            .context(UnknownBackendSnafu {
                name: &options.backend,
            })?;
        let store = builder(options)?;
        info!(
            "Storage backend {} initialized, data home: {}",
            store.backend_name(),
            normalize_dir(&options.data_home)
        );

        Ok(store)
    }
}
