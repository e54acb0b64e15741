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

use common_error::ext::ErrorExt;
use common_error::status_code::StatusCode;
use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid storage location {}: {}", path, reason))]
    InvalidLocation {
        path: String,
        reason: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Object not found: {}", path))]
    ObjectNotFound {
        path: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to {} {} on backend {}", op, path, backend))]
    OpenDal {
        op: &'static str,
        path: String,
        backend: String,
        #[snafu(source)]
        error: opendal::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Unknown storage backend: {}", name))]
    UnknownBackend {
        name: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to initialize storage backend {}", name))]
    InitBackend {
        name: String,
        #[snafu(source)]
        error: opendal::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl ErrorExt for Error {
    fn status_code(&self) -> StatusCode {
        use Error::*;
        match self {
            InvalidLocation { .. } | UnknownBackend { .. } => StatusCode::InvalidArguments,
            ObjectNotFound { .. } => StatusCode::ObjectNotFound,
            OpenDal { .. } | InitBackend { .. } => StatusCode::StorageUnavailable,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
