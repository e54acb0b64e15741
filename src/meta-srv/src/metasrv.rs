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

use common_meta::key::segment::SegmentMetadataManager;
use common_meta::kv_backend::KvBackendRef;
use common_telemetry::info;
use object_store::{BackendRegistry, ObjectStoreRef};
use snafu::ResultExt;

use crate::error::{BuildStorageSnafu, Result};
use crate::options::MetasrvOptions;
use crate::segment::refresh::SegmentRefreshNotifierRef;
use crate::segment::upload::SegmentUploader;

/// Wires the storage backend, the metadata store and the uploader together.
#[derive(Clone)]
pub struct Metasrv {
    options: MetasrvOptions,
    store: ObjectStoreRef,
    metadata_manager: SegmentMetadataManager,
    uploader: Arc<SegmentUploader>,
}

impl Metasrv {
    /// Builds the storage backend named in `options` from `registry`.
    pub fn new(
        options: MetasrvOptions,
        kv_backend: KvBackendRef,
        registry: &BackendRegistry,
        notifier: SegmentRefreshNotifierRef,
    ) -> Result<Self> {
        let store = registry
            .build(&options.storage)
            .context(BuildStorageSnafu {
                backend: &options.storage.backend,
            })?;
        let metadata_manager = SegmentMetadataManager::new(kv_backend);
        let uploader = Arc::new(SegmentUploader::new(
            store.clone(),
            metadata_manager.clone(),
            notifier,
            &options.upload,
        ));
        info!(
            "Metasrv uses storage backend {}, segments under {}, metadata in {}",
            store.backend_name(),
            options.upload.storage_dir,
            metadata_manager.kv_backend().name()
        );

        Ok(Self {
            options,
            store,
            metadata_manager,
            uploader,
        })
    }

    pub fn options(&self) -> &MetasrvOptions {
        &self.options
    }

    pub fn store(&self) -> &ObjectStoreRef {
        &self.store
    }

    pub fn metadata_manager(&self) -> &SegmentMetadataManager {
        &self.metadata_manager
    }

    pub fn uploader(&self) -> &Arc<SegmentUploader> {
        &self.uploader
    }
}
