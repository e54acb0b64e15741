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

use std::fmt;

use strum::{AsRefStr, EnumIter, EnumString, FromRepr};

/// Common status code for public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, EnumIter, FromRepr)]
pub enum StatusCode {
    // ====== Begin of common status code ==============
    /// Success.
    Success = 0,

    /// Unknown error.
    Unknown = 1000,
    /// Unexpected error, maybe there is a BUG.
    Unexpected = 1002,
    /// Internal server error.
    Internal = 1003,
    /// Invalid arguments.
    InvalidArguments = 1004,
    /// The request is well formed but its content is refused, e.g. a segment
    /// whose time range is out of the accepted window.
    NotAcceptable = 1006,
    // ====== End of common status code ================

    // ====== Begin of object related status code ======
    /// No object lives at the requested storage location.
    ObjectNotFound = 4012,
    // ====== End of object related status code ========

    // ====== Begin of storage related status code =====
    /// Storage is temporarily unable to handle the request
    StorageUnavailable = 5000,
    /// Request is outdated, e.g., version mismatch
    RequestOutdated = 5001,
    // ====== End of storage related status code =======
}

impl StatusCode {
    /// Returns `true` if `code` is success.
    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Returns `true` if the error with this code is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            StatusCode::StorageUnavailable
            | StatusCode::Internal
            | StatusCode::RequestOutdated => true,

            StatusCode::Success
            | StatusCode::Unknown
            | StatusCode::Unexpected
            | StatusCode::InvalidArguments
            | StatusCode::NotAcceptable
            | StatusCode::ObjectNotFound => false,
        }
    }

    /// Returns `true` if we should print an error log for an error with
    /// this status code.
    pub fn should_log_error(&self) -> bool {
        match self {
            StatusCode::Unknown
            | StatusCode::Unexpected
            | StatusCode::Internal
            | StatusCode::StorageUnavailable => true,
            StatusCode::Success
            | StatusCode::InvalidArguments
            | StatusCode::NotAcceptable
            | StatusCode::ObjectNotFound
            | StatusCode::RequestOutdated => false,
        }
    }

    /// Maps the code to the status an HTTP front end should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            StatusCode::Success => 200,
            StatusCode::InvalidArguments => 400,
            StatusCode::ObjectNotFound => 404,
            StatusCode::NotAcceptable => 406,
            StatusCode::RequestOutdated => 409,
            StatusCode::StorageUnavailable => 503,
            StatusCode::Unknown | StatusCode::Unexpected | StatusCode::Internal => 500,
        }
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        StatusCode::from_repr(value as usize)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The current debug format is suitable to display.
        write!(f, "{self:?}")
    }
}
