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

use serde::{Deserialize, Serialize};

pub const DEFAULT_DATA_HOME: &str = "./segment_data";

/// Selects and configures the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Registered name of the backend, case-insensitive.
    pub backend: String,
    /// Root directory of the `file` backend.
    pub data_home: String,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            backend: crate::services::LocalFs::NAME.to_string(),
            data_home: DEFAULT_DATA_HOME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options() {
        let options: StorageOptions = toml::from_str("backend = \"memory\"").unwrap();
        assert_eq!("memory", options.backend);
        assert_eq!(DEFAULT_DATA_HOME, options.data_home);
    }
}
