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

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::{Mmap, MmapMut, MmapOptions};
use snafu::{ensure, ResultExt};

use crate::error::{BufferTooSmallSnafu, FlushSnafu, MapFileSnafu, OpenFileSnafu, Result};

/// Writable region a [BitPackedWriter](crate::BitPackedWriter) packs into.
pub trait PackedBuffer: AsRef<[u8]> + AsMut<[u8]> {
    /// Makes the written bytes durable.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl PackedBuffer for Vec<u8> {}

impl PackedBuffer for &mut [u8] {}

/// A file mapped read/write.
///
/// An empty file is never mapped, since zero-length mappings are not portable.
#[derive(Debug)]
pub struct MmapBuffer {
    path: String,
    mmap: Option<MmapMut>,
    // Keeps the descriptor alive for as long as the mapping.
    _file: File,
}

impl MmapBuffer {
    /// Creates or truncates the file at `path` and extends it to `len` zero bytes.
    pub fn create(path: &Path, len: usize) -> Result<Self> {
        let path_str = path.display().to_string();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .context(OpenFileSnafu { path: &path_str })?;
        file.set_len(len as u64)
            .context(OpenFileSnafu { path: &path_str })?;

        let mmap = if len == 0 {
            None
        } else {
            // Safety: the file was just created by us and is only mutated
            // through this mapping while the buffer lives.
            Some(unsafe { MmapMut::map_mut(&file) }.context(MapFileSnafu { path: &path_str })?)
        };

        Ok(Self {
            path: path_str,
            mmap,
            _file: file,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl AsRef<[u8]> for MmapBuffer {
    fn as_ref(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }
}

impl AsMut<[u8]> for MmapBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        self.mmap.as_deref_mut().unwrap_or(&mut [])
    }
}

impl PackedBuffer for MmapBuffer {
    fn flush(&mut self) -> Result<()> {
        if let Some(mmap) = &self.mmap {
            mmap.flush().context(FlushSnafu { path: &self.path })?;
        }
        Ok(())
    }
}

/// A file mapped read-only.
#[derive(Debug)]
pub struct MappedFile {
    mmap: Option<Mmap>,
}

impl MappedFile {
    /// Maps the first `len` bytes of the file at `path`.
    pub fn open(path: &Path, len: usize) -> Result<Self> {
        let path_str = path.display().to_string();
        let file = File::open(path).context(OpenFileSnafu { path: &path_str })?;
        let actual = file
            .metadata()
            .context(OpenFileSnafu { path: &path_str })?
            .len();
        ensure!(
            actual >= len as u64,
            BufferTooSmallSnafu {
                expected: len,
                // Shorter than `len`, so it fits.
                actual: actual as usize,
            }
        );

        let mmap = if len == 0 {
            None
        } else {
            // Safety: segment files are immutable once written.
            let mmap = unsafe { MmapOptions::new().len(len).map(&file) };
            Some(mmap.context(MapFileSnafu { path: &path_str })?)
        };

        Ok(Self { mmap })
    }
}

impl AsRef<[u8]> for MappedFile {
    fn as_ref(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }
}
