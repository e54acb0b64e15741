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


use std::path::{Path, PathBuf};

use common_telemetry::debug;
use opendal::services::Fs;
use opendal::Operator;
use snafu::ResultExt;

use crate::error::{InitBackendSnafu, Result};
use crate::services::operator::OperatorStore;

/// Backend keeping objects as files under a root directory.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
    inner: OperatorStore,
}

impl LocalFs {
    pub const NAME: &'static str = "file";

    /// Creates the backend, creating `root` if it is missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let builder = Fs::default().root(&root.to_string_lossy());
        let op = Operator::new(builder)
            .context(InitBackendSnafu { name: Self::NAME })?
            .finish();
        debug!("Local storage backend rooted at {}", root.display());

        Ok(Self {
            root,
            inner: OperatorStore::new(Self::NAME, op, true),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl_object_store!(LocalFs);

#[cfg(test)]
mod tests {
    use common_test_util::temp_dir::create_temp_dir;

    use super::*;
    use crate::error::Error;
    use crate::{ObjectStore, StorageLocation};

    #[test]
    fn test_reject_parent_reference() {
        let dir = create_temp_dir("test_reject_parent_reference");
        let store = LocalFs::new(dir.path()).unwrap();

        let err = store
            .exists(&StorageLocation::new("a/../../etc/passwd"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidLocation { .. }), "{err:?}");
        let err = store
            .copy(&"a".into(), &StorageLocation::new("../b"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidLocation { .. }), "{err:?}");
    }

    #[test]
    fn test_length_and_missing_objects() {
        let dir = create_temp_dir("test_length_and_missing_objects");
        let store = LocalFs::new(dir.path()).unwrap();
        let loc = StorageLocation::new("t/s/file");

        assert!(!store.exists(&loc).unwrap());
        assert!(matches!(
            store.length(&loc).unwrap_err(),
            Error::ObjectNotFound { .. }
        ));
        assert!(matches!(
            store.read(&loc).unwrap_err(),
            Error::ObjectNotFound { .. }
        ));
        assert!(!store.delete(&loc).unwrap());

        store.write(&loc, b"0123456789").unwrap();
        assert_eq!(10, store.length(&loc).unwrap());
        assert!(dir.path().join("t").join("s").join("file").is_file());
        // Directories have no length.
        assert!(matches!(
            store.length(&StorageLocation::new("t/s")).unwrap_err(),
            Error::InvalidLocation { .. }
        ));
    }

    #[test]
    fn test_move_directory_tree() {
        let dir = create_temp_dir("test_move_directory_tree");
        let store = LocalFs::new(dir.path()).unwrap();
        store.write(&"staging/seg/a".into(), b"a").unwrap();
        store.write(&"staging/seg/sub/b".into(), b"b").unwrap();

        let dst = StorageLocation::new("x/y/z/seg");
        assert!(store
            .move_to(&StorageLocation::new("staging/seg"), &dst)
            .unwrap());
        assert!(!store.exists(&"staging/seg".into()).unwrap());
        assert!(!dir.path().join("staging").join("seg").exists());
        assert_eq!(
            Some(vec!["a".to_string(), "sub".to_string()]),
            store.list_files(&dst).unwrap()
        );
        assert_eq!(b"b".to_vec(), store.read(&dst.join("sub/b")).unwrap());
        assert!(!store.move_to(&"staging/seg".into(), &dst).unwrap());
    }

    #[test]
    fn test_empty_directory_exists() {
        let dir = create_temp_dir("test_empty_directory_exists");
        std::fs::create_dir_all(dir.path().join("t").join("empty")).unwrap();
        let store = LocalFs::new(dir.path()).unwrap();

        let empty = StorageLocation::new("t/empty");
        assert!(store.exists(&empty).unwrap());
        assert_eq!(Some(vec![]), store.list_files(&empty).unwrap());
        assert!(store.delete(&empty).unwrap());
        assert!(!dir.path().join("t").join("empty").exists());
    }
}
