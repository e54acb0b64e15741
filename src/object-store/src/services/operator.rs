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


use std::any::Any;

use common_telemetry::{debug, warn};
use opendal::{BlockingOperator, Buffer, EntryMode, ErrorKind, Operator};
use snafu::{ensure, ResultExt};

use crate::error::{InvalidLocationSnafu, ObjectNotFoundSnafu, OpenDalSnafu, Result};
use crate::{ObjectStore, StorageLocation};

/// [ObjectStore] over a blocking opendal operator.
#[derive(Debug, Clone)]
pub(crate) struct OperatorStore {
    name: &'static str,
    op: BlockingOperator,
    /// Whether the service keeps directories as entries of their own. Services
    /// without them only know a directory through the objects below it.
    explicit_dirs: bool,
}

fn dir_path(loc: &StorageLocation) -> String {
    if loc.is_root() {
        "/".to_string()
    } else {
        format!("{}/", loc)
    }
}

fn is_not_found(e: &opendal::Error) -> bool {
    e.kind() == ErrorKind::NotFound
}

impl OperatorStore {
    pub(crate) fn new(name: &'static str, op: Operator, explicit_dirs: bool) -> Self {
        Self {
            name,
            op: op.blocking(),
            explicit_dirs,
        }
    }

    fn io<T>(&self, op: &'static str, path: &str, result: opendal::Result<T>) -> Result<T> {
        result.context(OpenDalSnafu {
            op,
            path,
            backend: self.name,
        })
    }

    fn check(&self, loc: &StorageLocation) -> Result<()> {
        ensure!(
            !loc.has_parent_reference(),
            InvalidLocationSnafu {
                path: loc.as_str(),
                reason: "parent directory references are not allowed",
            }
        );
        Ok(())
    }

    fn entry_mode(&self, loc: &StorageLocation) -> Result<Option<EntryMode>> {
        if loc.is_root() {
            return Ok(Some(EntryMode::DIR));
        }
        match self.op.stat(loc.as_str()) {
            Ok(meta) if meta.is_dir() => return Ok(Some(EntryMode::DIR)),
            Ok(_) => return Ok(Some(EntryMode::FILE)),
            Err(e) if is_not_found(&e) => {}
            Err(e) => return self.io("stat", loc.as_str(), Err(e)),
        }

        if !self.children(loc)?.is_empty() {
            return Ok(Some(EntryMode::DIR));
        }
        if self.explicit_dirs {
            match self.op.stat(&dir_path(loc)) {
                Ok(meta) if meta.is_dir() => return Ok(Some(EntryMode::DIR)),
                Ok(_) => {}
                Err(e) if is_not_found(&e) => {}
                Err(e) => return self.io("stat", loc.as_str(), Err(e)),
            }
        }
        Ok(None)
    }

    /// Sorted names of the direct children of `loc`.
    fn children(&self, loc: &StorageLocation) -> Result<Vec<String>> {
        let dir = dir_path(loc);
        let entries = match self.op.list(&dir) {
            Ok(entries) => entries,
            Err(e) if is_not_found(&e) => return Ok(vec![]),
            Err(e) => return self.io("list", loc.as_str(), Err(e)),
        };

        let prefix = if loc.is_root() { "" } else { dir.as_str() };
        let mut names = entries
            .iter()
            .filter_map(|entry| {
                // The listed directory shows up as an entry of its own.
                let name = entry.path().strip_prefix(prefix)?.trim_matches('/');
                (!name.is_empty()).then(|| name.to_string())
            })
            .collect::<Vec<_>>();
        names.sort();
        names.dedup();

        Ok(names)
    }

    fn create_parent(&self, loc: &StorageLocation) -> Result<()> {
        if !self.explicit_dirs {
            return Ok(());
        }
        match loc.parent() {
            Some(parent) if !parent.is_root() => {
                let dir = dir_path(&parent);
                self.io("create parent of", loc.as_str(), self.op.create_dir(&dir))
            }
            _ => Ok(()),
        }
    }

    fn remove_tree(&self, loc: &StorageLocation) -> Result<()> {
        let dir = dir_path(loc);
        self.io("remove", loc.as_str(), self.op.remove_all(&dir))?;
        if self.explicit_dirs && !loc.is_root() {
            match self.op.delete(&dir) {
                Ok(_) => {}
                Err(e) if is_not_found(&e) => {}
                Err(e) => return self.io("remove", loc.as_str(), Err(e)),
            }
        }
        Ok(())
    }

    fn copy_file(&self, src: &StorageLocation, dst: &StorageLocation) -> Result<()> {
        self.create_parent(dst)?;
        if self.op.info().full_capability().copy {
            self.io("copy", src.as_str(), self.op.copy(src.as_str(), dst.as_str()))
                .map(|_| ())
        } else {
            let bytes: Buffer = self.io("read", src.as_str(), self.op.read(src.as_str()))?;
            self.io("write", dst.as_str(), self.op.write(dst.as_str(), bytes))
                .map(|_| ())
        }
    }

    fn copy_tree(&self, src: &StorageLocation, dst: &StorageLocation) -> Result<()> {
        let src_dir = dir_path(src);
        let entries = self.io(
            "list",
            src.as_str(),
            self.op.list_with(&src_dir).recursive(true).call(),
        )?;
        if self.explicit_dirs {
            self.create_parent(dst)?;
            self.io("create", dst.as_str(), self.op.create_dir(&dir_path(dst)))?;
        }

        for entry in entries {
            let path = entry.path();
            if path.ends_with('/') {
                continue;
            }
            let Some(rest) = path.strip_prefix(src_dir.as_str()) else {
                continue;
            };
            self.copy_file(&StorageLocation::new(path), &dst.join(rest))?;
        }
        Ok(())
    }

    /// Copies `src` to `dst`, removing whatever was written to `dst` on failure.
    fn copy_or_clean(
        &self,
        src: &StorageLocation,
        dst: &StorageLocation,
        dir: bool,
    ) -> Result<()> {
        let result = if dir {
            self.copy_tree(src, dst)
        } else {
            self.copy_file(src, dst)
        };
        if result.is_err() {
            if let Err(e) = self.delete(dst) {
                warn!(
                    "Failed to clean partially copied {} on backend {}: {:?}",
                    dst, self.name, e
                );
            }
        }
        result
    }
}

impl ObjectStore for OperatorStore {
    fn backend_name(&self) -> &str {
        self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn delete(&self, loc: &StorageLocation) -> Result<bool> {
        self.check(loc)?;
        let Some(mode) = self.entry_mode(loc)? else {
            return Ok(false);
        };
        if mode.is_dir() {
            self.remove_tree(loc)?;
        } else {
            self.io("delete", loc.as_str(), self.op.delete(loc.as_str()))?;
        }
        debug!("Deleted {} from backend {}", loc, self.name);

        Ok(true)
    }

    fn move_to(&self, src: &StorageLocation, dst: &StorageLocation) -> Result<bool> {
        self.check(src)?;
        self.check(dst)?;
        let Some(mode) = self.entry_mode(src)? else {
            return Ok(false);
        };

        if !mode.is_dir() && self.op.info().full_capability().rename {
            self.create_parent(dst)?;
            match self.op.rename(src.as_str(), dst.as_str()) {
                Ok(_) => {
                    debug!("Renamed {} to {} on backend {}", src, dst, self.name);
                    return Ok(true);
                }
                // Renaming across devices is not possible, fall back to copying.
                Err(e) => warn!(
                    "Failed to rename {} to {} on backend {}, copying instead: {:?}",
                    src, dst, self.name, e
                ),
            }
        }

        self.copy_or_clean(src, dst, mode.is_dir())?;
        if mode.is_dir() {
            self.remove_tree(src)?;
        } else {
            self.io("delete", src.as_str(), self.op.delete(src.as_str()))?;
        }
        debug!("Moved {} to {} on backend {}", src, dst, self.name);

        Ok(true)
    }

    fn copy(&self, src: &StorageLocation, dst: &StorageLocation) -> Result<bool> {
        self.check(src)?;
        self.check(dst)?;
        let Some(mode) = self.entry_mode(src)? else {
            return Ok(false);
        };
        self.copy_or_clean(src, dst, mode.is_dir())?;
        debug!("Copied {} to {} on backend {}", src, dst, self.name);

        Ok(true)
    }

    fn exists(&self, loc: &StorageLocation) -> Result<bool> {
        self.check(loc)?;
        Ok(self.entry_mode(loc)?.is_some())
    }

    fn length(&self, loc: &StorageLocation) -> Result<u64> {
        self.check(loc)?;
        match self.entry_mode(loc)? {
            None => ObjectNotFoundSnafu {
                path: loc.as_str(),
            }
            .fail(),
            Some(mode) if mode.is_dir() => InvalidLocationSnafu {
                path: loc.as_str(),
                reason: "not a file",
            }
            .fail(),
            Some(_) => {
                let meta = self.io("stat", loc.as_str(), self.op.stat(loc.as_str()))?;
                Ok(meta.content_length())
            }
        }
    }

    fn list_files(&self, loc: &StorageLocation) -> Result<Option<Vec<String>>> {
        self.check(loc)?;
        match self.entry_mode(loc)? {
            Some(mode) if mode.is_dir() => Ok(Some(self.children(loc)?)),
            _ => Ok(None),
        }
    }

    fn write(&self, loc: &StorageLocation, bytes: &[u8]) -> Result<()> {
        self.check(loc)?;
        ensure!(
            !loc.is_root(),
            InvalidLocationSnafu {
                path: loc.as_str(),
                reason: "cannot write to the root",
            }
        );
        ensure!(
            !self.entry_mode(loc)?.is_some_and(|mode| mode.is_dir()),
            InvalidLocationSnafu {
                path: loc.as_str(),
                reason: "is a directory",
            }
        );

        self.io("write", loc.as_str(), self.op.write(loc.as_str(), bytes.to_vec()))
            .map(|_| ())
    }

    fn read(&self, loc: &StorageLocation) -> Result<Vec<u8>> {
        self.check(loc)?;
        match self.op.read(loc.as_str()) {
            Ok(buffer) => Ok(buffer.to_vec()),
            Err(e) if is_not_found(&e) => ObjectNotFoundSnafu {
                path: loc.as_str(),
            }
            .fail(),
            Err(e) => self.io("read", loc.as_str(), Err(e)),
        }
    }
}
