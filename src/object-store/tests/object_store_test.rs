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

use anyhow::Result;
use common_test_util::temp_dir::create_temp_dir;
use object_store::services::{LocalFs, MemoryStore};
use object_store::{BackendRegistry, ObjectStore, StorageLocation, StorageOptions};

fn test_object_crud(store: &dyn ObjectStore) -> Result<()> {
    let file = StorageLocation::new("test_file");
    assert!(store.read(&file).is_err());
    assert!(!store.exists(&file)?);

    store.write(&file, b"Hello, World!")?;
    assert_eq!(b"Hello, World!".to_vec(), store.read(&file)?);
    assert_eq!(13, store.length(&file)?);
    assert_eq!("test_file", store.name(&file));
    assert_eq!(Some(StorageLocation::root()), store.parent(&file));

    assert!(store.delete(&file)?);
    assert!(store.read(&file).is_err());
    assert!(!store.delete(&file)?);
    Ok(())
}

fn test_object_list(store: &dyn ObjectStore) -> Result<()> {
    let dir = StorageLocation::new("list");
    let p1 = dir.join("test_file1");
    let p2 = dir.join("test_file2");
    let p3 = dir.join("test_file3");
    store.write(&p1, b"Hello, object1!")?;
    store.write(&p2, b"Hello, object2!")?;
    store.write(&p3, b"Hello, object3!")?;

    assert_eq!(
        Some(vec![
            "test_file1".to_string(),
            "test_file2".to_string(),
            "test_file3".to_string()
        ]),
        store.list_files(&dir)?
    );
    // A file is not a directory.
    assert_eq!(None, store.list_files(&p1)?);

    assert!(store.delete(&p1)?);
    assert!(store.delete(&p3)?);
    assert_eq!(Some(vec!["test_file2".to_string()]), store.list_files(&dir)?);

    assert!(store.delete(&dir)?);
    assert!(!store.exists(&p2)?);
    Ok(())
}

fn test_create_parent_directories(store: &dyn ObjectStore) -> Result<()> {
    let staged = StorageLocation::new("staging/segment_0");
    store.write(&staged, b"segment bytes")?;

    let copied = StorageLocation::new("root/table/segment_0/v1/segment_0");
    assert!(store.copy(&staged, &copied)?);
    assert!(store.exists(&staged)?);
    assert_eq!(b"segment bytes".to_vec(), store.read(&copied)?);

    let moved = StorageLocation::new("root/table/segment_0/v2/segment_0");
    assert!(store.move_to(&staged, &moved)?);
    assert!(!store.exists(&staged)?);
    assert_eq!(b"segment bytes".to_vec(), store.read(&moved)?);
    assert_eq!(
        Some(vec!["v1".to_string(), "v2".to_string()]),
        store.list_files(&StorageLocation::new("root/table/segment_0"))?
    );

    // Nothing to move or copy.
    assert!(!store.move_to(&staged, &moved)?);
    assert!(!store.copy(&staged, &copied)?);
    Ok(())
}

fn run_all(store: &dyn ObjectStore) -> Result<()> {
    test_object_crud(store)?;
    test_object_list(store)?;
    test_create_parent_directories(store)?;
    Ok(())
}

#[test]
fn test_fs_backend() -> Result<()> {
    let data_dir = create_temp_dir("test_fs_backend");
    let store = LocalFs::new(data_dir.path())?;

    run_all(&store)?;

    Ok(())
}

#[test]
fn test_memory_backend() -> Result<()> {
    let store = MemoryStore::new()?;

    run_all(&store)?;
    // The copied and the moved segment remain.
    assert_eq!(
        Some(vec!["root".to_string()]),
        store.list_files(&StorageLocation::root())?
    );

    Ok(())
}

#[test]
fn test_backend_from_options() -> Result<()> {
    let data_dir = create_temp_dir("test_backend_from_options");
    let options = StorageOptions {
        backend: "FILE".to_string(),
        data_home: data_dir.path().to_string_lossy().to_string(),
    };
    let store = BackendRegistry::new().build(&options)?;
    assert_eq!(LocalFs::NAME, store.backend_name());

    store.write(&StorageLocation::new("a/b"), b"x")?;
    assert!(data_dir.path().join("a").join("b").is_file());

    Ok(())
}
