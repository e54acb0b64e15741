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
use serde_json::error::Error as JsonError;
use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Empty key is not allowed"))]
    EmptyKey {
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to serde json"))]
    SerdeJson {
        #[snafu(source)]
        error: JsonError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid custom map modifier: {}", modifier))]
    InvalidCustomMapModifier {
        modifier: String,
        #[snafu(source)]
        error: JsonError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Kv backend {} is unavailable: {}", name, reason))]
    KvBackendUnavailable {
        name: String,
        reason: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Unexpected: {}", err_msg))]
    Unexpected {
        err_msg: String,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl ErrorExt for Error {
    fn status_code(&self) -> StatusCode {
        use Error::*;
        match self {
            EmptyKey { .. } | InvalidCustomMapModifier { .. } => StatusCode::InvalidArguments,
            KvBackendUnavailable { .. } => StatusCode::StorageUnavailable,
            SerdeJson { .. } | Unexpected { .. } => StatusCode::Unexpected,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
