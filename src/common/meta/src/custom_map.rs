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

//! Directive that rewrites the custom attribute map of a segment record.
//!
//! The directive is a small json document, e.g.
//! `{"modifyMode": "MERGE", "customMap": {"owner": "ads", "stale": null}}`.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::{Error, InvalidCustomMapModifierSnafu, Result};

pub type CustomMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModifyMode {
    /// Drops the existing map and installs the new one.
    Replace,
    /// Overlays the new keys onto the existing map. A `null` value removes the key.
    Merge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMapModifier {
    pub modify_mode: ModifyMode,
    #[serde(default)]
    pub custom_map: Option<BTreeMap<String, Option<String>>>,
}

impl Default for CustomMapModifier {
    /// Replaces the map with nothing.
    fn default() -> Self {
        Self {
            modify_mode: ModifyMode::Replace,
            custom_map: None,
        }
    }
}

impl CustomMapModifier {
    pub fn new(modify_mode: ModifyMode, custom_map: Option<CustomMap>) -> Self {
        Self {
            modify_mode,
            custom_map: custom_map.map(|m| m.into_iter().map(|(k, v)| (k, Some(v))).collect()),
        }
    }

    /// Applies the directive to `existing`, returns the map the record should hold.
    ///
    /// An empty result is normalized to `None`.
    pub fn modify_map(&self, existing: Option<CustomMap>) -> Option<CustomMap> {
        let modified = match self.modify_mode {
            ModifyMode::Replace => self.custom_map.as_ref().map(|new_map| {
                new_map
                    .iter()
                    .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
                    .collect::<CustomMap>()
            }),
            ModifyMode::Merge => {
                let mut merged = existing.unwrap_or_default();
                for (k, v) in self.custom_map.iter().flatten() {
                    match v {
                        Some(v) => {
                            merged.insert(k.clone(), v.clone());
                        }
                        None => {
                            merged.remove(k);
                        }
                    }
                }
                Some(merged)
            }
        };

        modified.filter(|m| !m.is_empty())
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).context(crate::error::SerdeJsonSnafu)
    }
}

impl FromStr for CustomMapModifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context(InvalidCustomMapModifierSnafu { modifier: s })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(kvs: &[(&str, &str)]) -> CustomMap {
        kvs.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_modifier() {
        let modifier: CustomMapModifier =
            r#"{"modifyMode": "MERGE", "customMap": {"owner": "ads", "stale": null}}"#
                .parse()
                .unwrap();
        assert_eq!(ModifyMode::Merge, modifier.modify_mode);
        let custom_map = modifier.custom_map.unwrap();
        assert_eq!(Some("ads".to_string()), custom_map["owner"]);
        assert_eq!(None, custom_map["stale"]);

        let modifier: CustomMapModifier = r#"{"modifyMode": "REPLACE"}"#.parse().unwrap();
        assert_eq!(CustomMapModifier::default(), modifier);
    }

    #[test]
    fn test_parse_malformed_modifier() {
        assert!("not json".parse::<CustomMapModifier>().is_err());
        assert!(r#"{"modifyMode": "APPEND"}"#
            .parse::<CustomMapModifier>()
            .is_err());
        assert!(r#"{"customMap": {}}"#.parse::<CustomMapModifier>().is_err());
    }

    #[test]
    fn test_replace() {
        let modifier = CustomMapModifier::new(ModifyMode::Replace, Some(map(&[("a", "1")])));
        assert_eq!(
            Some(map(&[("a", "1")])),
            modifier.modify_map(Some(map(&[("b", "2")])))
        );

        let modifier = CustomMapModifier::default();
        assert_eq!(None, modifier.modify_map(Some(map(&[("b", "2")]))));
    }

    #[test]
    fn test_merge() {
        let modifier: CustomMapModifier =
            r#"{"modifyMode": "MERGE", "customMap": {"a": "10", "c": "3", "b": null}}"#
                .parse()
                .unwrap();
        assert_eq!(
            Some(map(&[("a", "10"), ("c", "3")])),
            modifier.modify_map(Some(map(&[("a", "1"), ("b", "2")])))
        );
        assert_eq!(
            Some(map(&[("a", "10"), ("c", "3")])),
            modifier.modify_map(None)
        );

        // Merging nothing keeps the existing map.
        let modifier = CustomMapModifier::new(ModifyMode::Merge, None);
        assert_eq!(
            Some(map(&[("a", "1")])),
            modifier.modify_map(Some(map(&[("a", "1")])))
        );
    }

    #[test]
    fn test_merge_to_empty() {
        let modifier: CustomMapModifier =
            r#"{"modifyMode": "MERGE", "customMap": {"a": null}}"#
                .parse()
                .unwrap();
        assert_eq!(None, modifier.modify_map(Some(map(&[("a", "1")]))));
    }

    #[test]
    fn test_json_round_trip() {
        let modifier = CustomMapModifier::new(ModifyMode::Merge, Some(map(&[("a", "1")])));
        let json = modifier.to_json_string().unwrap();
        assert_eq!(
            r#"{"modifyMode":"MERGE","customMap":{"a":"1"}}"#,
            json
        );
        assert_eq!(modifier, json.parse::<CustomMapModifier>().unwrap());
    }
}
