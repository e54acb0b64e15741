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

/// Collapses repeated `/` and makes the path absolute.
fn normalize(path: &str) -> String {
    let joined = path
        .split('/')
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

/// Normalize a directory path, ensure it is ends with '/'
pub fn normalize_dir(dir: &str) -> String {
    let mut dir = dir.to_string();
    if !dir.ends_with('/') {
        dir.push('/')
    }

    dir
}

/// Push `child` to `parent` dir and normalize the output path.
///
/// - Path endswith `/` means it's a dir path.
/// - Otherwise, it's a file path.
///
/// The output never starts with `/`, matching how [StorageLocation](crate::StorageLocation)
/// renders relative paths.
pub fn join_path(parent: &str, child: &str) -> String {
    let output = format!("{parent}/{child}");
    let normalized = normalize(&output);
    let trimmed = normalized.trim_start_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if output.ends_with('/') {
        format!("{trimmed}/")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dir() {
        assert_eq!("/", normalize_dir("/"));
        assert_eq!("/", normalize_dir(""));
        assert_eq!("/test/", normalize_dir("/test"));
    }

    #[test]
    fn test_join_path() {
        assert_eq!("/", join_path("", ""));
        assert_eq!("/", join_path("/", ""));
        assert_eq!("/", join_path("", "/"));
        assert_eq!("/", join_path("/", "/"));
        assert_eq!("a/", join_path("a", ""));
        assert_eq!("a/b/c.txt", join_path("a/b", "c.txt"));
        assert_eq!("a/b/c.txt", join_path("/a/b", "c.txt"));
        assert_eq!("a/b/c/", join_path("/a/b", "c/"));
        assert_eq!("a/b/c/", join_path("/a/b", "/c/"));
        assert_eq!("a/b/c.txt", join_path("/a/b", "//c.txt"));
        assert_eq!("root/t/s/v", join_path("root//t", "s/v"));
    }
}
