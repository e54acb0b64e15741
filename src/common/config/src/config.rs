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

use config::{Environment, File, FileFormat};
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::ResultExt;

use crate::error::{LoadLayeredConfigSnafu, Result, SerdeJsonSnafu, TomlFormatSnafu};

/// Separator for environment variables. For example, `METASRV__STORAGE__DATA_HOME`.
pub const ENV_VAR_SEP: &str = "__";

/// Separator for list values in environment variables.
pub const ENV_LIST_SEP: &str = ",";

/// Configuration trait defines the common interface for configuration that can be loaded from multiple sources and serialized to TOML.
pub trait Configurable: Serialize + DeserializeOwned + Default + Sized {
    /// Load the configuration from multiple sources and merge them.
    /// The precedence order is: config file > environment variables > default values.
    /// `env_prefix` is the prefix of environment variables, e.g. "METASRV__xxx".
    /// The function will use dunder(double underscore) `__` as the separator for environment variables, for example:
    /// `METASRV__STORAGE__BACKEND` will be mapped to `MetasrvOptions.storage.backend` field in the configuration.
    fn load_layered_options(config_file: Option<&str>, env_prefix: &str) -> Result<Self> {
        let default_opts = Self::default();

        let env_source = {
            let mut env = Environment::default();

            if !env_prefix.is_empty() {
                env = env.prefix(env_prefix);
            }

            if let Some(list_keys) = Self::env_list_keys() {
                env = env.list_separator(ENV_LIST_SEP);
                for key in list_keys {
                    env = env.with_list_parse_key(key);
                }
            }

            env.try_parsing(true)
                .separator(ENV_VAR_SEP)
                .ignore_empty(true)
        };

        // Workaround: Replacement for `Config::try_from(&default_opts)` due to
        // `ConfigSerializer` cannot handle the case of an empty struct contained
        // within an iterative structure.
        // See: https://github.com/mehcode/config-rs/issues/461
        let json_str = serde_json::to_string(&default_opts).context(SerdeJsonSnafu)?;
        let default_config = File::from_str(&json_str, FileFormat::Json);

        // Add default values and environment variables as the sources of the configuration.
        let mut layered_config = config::Config::builder()
            .add_source(default_config)
            .add_source(env_source);

        // Add config file as the source of the configuration if it is specified.
        if let Some(config_file) = config_file {
            layered_config = layered_config.add_source(File::new(config_file, FileFormat::Toml));
        }

        let mut opts: Self = layered_config
            .build()
            .and_then(|x| x.try_deserialize())
            .context(LoadLayeredConfigSnafu)?;

        opts.validate_sanitize()?;

        Ok(opts)
    }

    /// Validate(and possibly sanitize) the configuration.
    fn validate_sanitize(&mut self) -> Result<()> {
        Ok(())
    }

    /// List of toml keys that should be parsed as a list.
    fn env_list_keys() -> Option<&'static [&'static str]> {
        None
    }

    /// Serialize the configuration to a TOML string.
    fn to_toml(&self) -> Result<String> {
        toml::to_string(&self).context(TomlFormatSnafu)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use common_telemetry::logging::LoggingOptions;
    use common_test_util::temp_dir::create_named_temp_file;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(default)]
    struct TestStorageConfig {
        backend: String,
        data_home: String,
    }

    impl Default for TestStorageConfig {
        fn default() -> Self {
            Self {
                backend: "file".to_string(),
                data_home: "./segment_data".to_string(),
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize, Default)]
    #[serde(default)]
    struct TestMetasrvConfig {
        node_id: Option<u64>,
        storage: TestStorageConfig,
        logging: LoggingOptions,
    }

    impl Configurable for TestMetasrvConfig {}

    fn env_key(prefix: &str, parts: &[&str]) -> String {
        std::iter::once(prefix.to_string())
            .chain(parts.iter().map(|p| p.to_uppercase()))
            .collect::<Vec<_>>()
            .join(ENV_VAR_SEP)
    }

    #[test]
    fn test_load_layered_options() {
        let mut file = create_named_temp_file();
        let toml_str = r#"
            [storage]
            data_home = "/data/segments"

            [logging]
            level = "debug"
            dir = "/data/logs"
        "#;
        write!(file, "{}", toml_str).unwrap();

        let env_prefix = "METASRV_UT";
        temp_env::with_vars(
            [
                (
                    // storage.backend = memory
                    env_key(env_prefix, &["storage", "backend"]),
                    Some("memory"),
                ),
                (
                    // storage.data_home is also set in the file, the file wins.
                    env_key(env_prefix, &["storage", "data_home"]),
                    Some("/other/segments"),
                ),
            ],
            || {
                let opts = TestMetasrvConfig::load_layered_options(
                    Some(file.path().to_str().unwrap()),
                    env_prefix,
                )
                .unwrap();

                // From environment variables.
                assert_eq!("memory", opts.storage.backend);
                // From the config file.
                assert_eq!("/data/segments", opts.storage.data_home);
                assert_eq!(Some("debug".to_string()), opts.logging.level);
                assert_eq!("/data/logs", opts.logging.dir);
                // Default values.
                assert_eq!(None, opts.node_id);
                assert!(opts.logging.append_stdout);
            },
        );
    }

    #[test]
    fn test_to_toml() {
        let opts = TestMetasrvConfig::default();
        let toml_str = opts.to_toml().unwrap();
        let parsed: TestMetasrvConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts.storage, parsed.storage);
        assert_eq!(opts.logging, parsed.logging);
    }
}
