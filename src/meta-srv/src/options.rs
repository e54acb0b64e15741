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

use common_config::error::{InvalidConfigSnafu, Result as ConfigResult};
use common_config::Configurable;
use common_telemetry::logging::LoggingOptions;
use object_store::StorageOptions;
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::segment::upload::SegmentUploaderOptions;

/// Prefix of the environment variables overriding [MetasrvOptions].
pub const METASRV_ENV_PREFIX: &str = "METASRV";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetasrvOptions {
    /// The storage backend segments are uploaded to.
    pub storage: StorageOptions,
    pub upload: SegmentUploaderOptions,
    pub logging: LoggingOptions,
}

impl Configurable for MetasrvOptions {
    fn validate_sanitize(&mut self) -> ConfigResult<()> {
        let backend = self.storage.backend.trim();
        ensure!(
            !backend.is_empty(),
            InvalidConfigSnafu {
                reason: "storage backend must not be empty",
            }
        );
        self.storage.backend = backend.to_ascii_lowercase();

        Ok(())
    }
}
