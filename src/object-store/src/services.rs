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


macro_rules! impl_object_store {
    ($backend:ty) => {
        impl $crate::ObjectStore for $backend {
            fn backend_name(&self) -> &str {
                self.inner.backend_name()
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn delete(&self, loc: &$crate::StorageLocation) -> $crate::Result<bool> {
                self.inner.delete(loc)
            }

            fn move_to(
                &self,
                src: &$crate::StorageLocation,
                dst: &$crate::StorageLocation,
            ) -> $crate::Result<bool> {
                self.inner.move_to(src, dst)
            }

            fn copy(
                &self,
                src: &$crate::StorageLocation,
                dst: &$crate::StorageLocation,
            ) -> $crate::Result<bool> {
                self.inner.copy(src, dst)
            }

            fn exists(&self, loc: &$crate::StorageLocation) -> $crate::Result<bool> {
                self.inner.exists(loc)
            }

            fn length(&self, loc: &$crate::StorageLocation) -> $crate::Result<u64> {
                self.inner.length(loc)
            }

            fn list_files(
                &self,
                loc: &$crate::StorageLocation,
            ) -> $crate::Result<Option<Vec<String>>> {
                self.inner.list_files(loc)
            }

            fn write(&self, loc: &$crate::StorageLocation, bytes: &[u8]) -> $crate::Result<()> {
                self.inner.write(loc, bytes)
            }

            fn read(&self, loc: &$crate::StorageLocation) -> $crate::Result<Vec<u8>> {
                self.inner.read(loc)
            }
        }
    };
}

mod fs;
mod memory;
mod operator;

pub use fs::LocalFs;
pub use memory::MemoryStore;
