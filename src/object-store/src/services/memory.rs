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


use opendal::services::Memory;
use opendal::Operator;
use snafu::ResultExt;

use crate::error::{InitBackendSnafu, Result};
use crate::services::operator::OperatorStore;

/// Backend keeping objects in memory.
///
/// Directories are implied by the paths of the stored objects: a location is a
/// directory if it is the root or some object lives below it.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: OperatorStore,
}

impl MemoryStore {
    pub const NAME: &'static str = "memory";

    pub fn new() -> Result<Self> {
        let op = Operator::new(Memory::default())
            .context(InitBackendSnafu { name: Self::NAME })?
            .finish();

        Ok(Self {
            inner: OperatorStore::new(Self::NAME, op, false),
        })
    }
}

impl_object_store!(MemoryStore);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::{ObjectStore, StorageLocation};

    #[test]
    fn test_directory_semantics() {
        let store = MemoryStore::new().unwrap();
        store.write(&"t/s/v1/s".into(), b"abc").unwrap();
        store.write(&"t/s/v2/s".into(), b"abcd").unwrap();
        store.write(&"t/other".into(), b"x").unwrap();

        assert!(store.exists(&"t".into()).unwrap());
        assert!(store.exists(&"t/s/v1".into()).unwrap());
        assert!(!store.exists(&"t/s/v3".into()).unwrap());
        // A name prefix is not a directory.
        assert!(!store.exists(&"t/s/v".into()).unwrap());

        assert_eq!(
            Some(vec!["other".to_string(), "s".to_string()]),
            store.list_files(&"t".into()).unwrap()
        );
        assert_eq!(
            Some(vec!["t".to_string()]),
            store.list_files(&StorageLocation::root()).unwrap()
        );
        assert_eq!(None, store.list_files(&"t/other".into()).unwrap());
        assert_eq!(None, store.list_files(&"nope".into()).unwrap());
    }

    #[test]
    fn test_delete_tree() {
        let store = MemoryStore::new().unwrap();
        store.write(&"t/s/v1/s".into(), b"abc").unwrap();
        store.write(&"t/s/v2/s".into(), b"abc").unwrap();
        store.write(&"t/sx".into(), b"abc").unwrap();

        assert!(store.delete(&"t/s".into()).unwrap());
        assert!(!store.delete(&"t/s".into()).unwrap());
        assert_eq!(
            Some(vec!["sx".to_string()]),
            store.list_files(&"t".into()).unwrap()
        );
    }

    #[test]
    fn test_write_to_directory() {
        let store = MemoryStore::new().unwrap();
        store.write(&"a/b".into(), b"x").unwrap();

        let err = store.write(&"a".into(), b"y").unwrap_err();
        assert!(matches!(err, Error::InvalidLocation { .. }), "{err:?}");
        let err = store.write(&StorageLocation::root(), b"y").unwrap_err();
        assert!(matches!(err, Error::InvalidLocation { .. }), "{err:?}");
    }

    #[test]
    fn test_length_of_directory() {
        let store = MemoryStore::new().unwrap();
        store.write(&"a/b".into(), b"x").unwrap();

        assert_eq!(1, store.length(&"a/b".into()).unwrap());
        assert!(matches!(
            store.length(&"a".into()).unwrap_err(),
            Error::InvalidLocation { .. }
        ));
    }

    #[test]
    fn test_copy_directory_tree() {
        let store = MemoryStore::new().unwrap();
        store.write(&"src/a".into(), b"a").unwrap();
        store.write(&"src/sub/b".into(), b"b").unwrap();

        assert!(store.copy(&"src".into(), &"dst/copy".into()).unwrap());
        assert_eq!(b"b".to_vec(), store.read(&"dst/copy/sub/b".into()).unwrap());
        assert!(store.exists(&"src/sub/b".into()).unwrap());

        assert!(store.move_to(&"src/a".into(), &"moved/a".into()).unwrap());
        assert!(!store.exists(&"src/a".into()).unwrap());
        assert_eq!(b"a".to_vec(), store.read(&"moved/a".into()).unwrap());
    }
}
