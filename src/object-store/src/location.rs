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

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `/`-separated path relative to the root of an [ObjectStore](crate::ObjectStore).
///
/// Repeated, leading and trailing separators are dropped on construction, so
/// `"a//b/"` and `"/a/b"` denote the same location. The empty location is the
/// backend root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StorageLocation(String);

impl StorageLocation {
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalized = path
            .as_ref()
            .split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self(normalized)
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Returns true if any component refers to a parent directory.
    pub fn has_parent_reference(&self) -> bool {
        self.components().any(|c| c == "..")
    }

    /// Appends `child` (itself possibly several components).
    pub fn join(&self, child: impl AsRef<str>) -> Self {
        Self::new(format!("{}/{}", self.0, child.as_ref()))
    }

    /// Returns the location one level up, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => Some(Self::root()),
        }
    }

    /// The last component, empty for the root.
    pub fn name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StorageLocation {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StorageLocation {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<StorageLocation> for String {
    fn from(value: StorageLocation) -> Self {
        value.0
    }
}

impl AsRef<str> for StorageLocation {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!("a/b/c", StorageLocation::new("/a//b/c/").as_str());
        assert_eq!("a/b", StorageLocation::new("./a/./b").as_str());
        assert!(StorageLocation::new("/").is_root());
        assert!(StorageLocation::new("").is_root());
    }

    #[test]
    fn test_parent_and_name() {
        let loc = StorageLocation::new("root/events/events_0/token");
        assert_eq!("token", loc.name());
        let parent = loc.parent().unwrap();
        assert_eq!("root/events/events_0", parent.as_str());
        assert_eq!("events_0", parent.name());

        let top = StorageLocation::new("root");
        assert!(top.parent().unwrap().is_root());
        assert_eq!(None, StorageLocation::root().parent());
        assert_eq!("", StorageLocation::root().name());
    }

    #[test]
    fn test_join() {
        let loc = StorageLocation::new("a/b");
        assert_eq!("a/b/c", loc.join("c").as_str());
        assert_eq!("a/b/c/d", loc.join("/c//d/").as_str());
        assert_eq!("c", StorageLocation::root().join("c").as_str());
    }

    #[test]
    fn test_parent_reference() {
        assert!(StorageLocation::new("a/../b").has_parent_reference());
        assert!(!StorageLocation::new("a/..b").has_parent_reference());
    }

    #[test]
    fn test_serde() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Holder {
            loc: StorageLocation,
        }

        let decoded: Holder = toml::from_str("loc = \"/a//b/\"").unwrap();
        assert_eq!(StorageLocation::new("a/b"), decoded.loc);
        assert_eq!("loc = \"a/b\"\n", toml::to_string(&decoded).unwrap());
    }
}
