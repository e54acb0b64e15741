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

use object_store::util::join_path;
use object_store::{ObjectStore, StorageLocation};
use snafu::{ensure, OptionExt};

use crate::error::{InvalidLocationSnafu, InvalidSegmentLocationSnafu, Result};
use crate::segment::VersionToken;

/// Derives the permanent home of each upload attempt.
///
/// Allocated locations have the form `<root>/<table>/<segment>/<token>`. The
/// segment bytes are stored inside it as `<token>/<segment>`, so the token is
/// the name of the directory holding the segment file.
#[derive(Debug, Clone)]
pub struct SegmentLocationAllocator {
    storage_root: String,
}

fn check_name(table: &str, segment: &str, kind: &str, name: &str) -> Result<()> {
    ensure!(
        !name.is_empty(),
        InvalidSegmentLocationSnafu {
            table,
            segment,
            reason: format!("empty {kind} name"),
        }
    );
    ensure!(
        !name.contains('/') && name != "." && name != "..",
        InvalidSegmentLocationSnafu {
            table,
            segment,
            reason: format!("{kind} name {name} is not a single path component"),
        }
    );
    Ok(())
}

impl SegmentLocationAllocator {
    pub fn new(storage_root: impl Into<String>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    pub fn storage_root(&self) -> &str {
        &self.storage_root
    }

    /// Returns a location no other attempt has been or will be given.
    ///
    /// Never inspects the storage backend.
    pub fn allocate(&self, table: &str, segment: &str) -> Result<(StorageLocation, VersionToken)> {
        check_name(table, segment, "table", table)?;
        check_name(table, segment, "segment", segment)?;

        let token = VersionToken::generate();
        let path = join_path(
            &self.storage_root,
            &format!("{table}/{segment}/{token}"),
        );

        Ok((StorageLocation::new(path), token))
    }
}

/// Location of the segment file inside the version directory `version_dir`.
pub fn segment_file_location(version_dir: &StorageLocation, segment: &str) -> StorageLocation {
    version_dir.join(segment)
}

/// Reads the version token of the segment file at `file`, which is the name of
/// its parent directory.
pub fn version_token_of(
    store: &dyn ObjectStore,
    table: &str,
    segment: &str,
    file: &StorageLocation,
) -> Result<VersionToken> {
    let parent = store.parent(file).context(InvalidLocationSnafu {
        table,
        segment,
        path: file.as_str(),
        reason: "no parent directory",
    })?;
    let name = store.name(&parent);

    name.parse().ok().context(InvalidLocationSnafu {
        table,
        segment,
        path: file.as_str(),
        reason: format!("{name} is not a version token"),
    })
}
