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
use std::sync::Arc;

use crate::status_code::StatusCode;

/// Extension to [`Error`](std::error::Error) in std.
pub trait ErrorExt: std::error::Error {
    /// Map this error to [StatusCode].
    fn status_code(&self) -> StatusCode {
        StatusCode::Unknown
    }

    /// Returns the error as [Any](std::any::Any) so that it can be
    /// downcast to a specific implementation.
    fn as_any(&self) -> &dyn Any;

    /// Message that is safe to return to a caller.
    fn output_msg(&self) -> String
    where
        Self: Sized,
    {
        match self.status_code() {
            StatusCode::Unknown | StatusCode::Internal => {
                // masks internal error from end user
                format!("Internal error: {}", self.status_code() as u32)
            }
            _ => match self.root_cause() {
                Some(root) => format!("{self}: {root}"),
                None => format!("{self}"),
            },
        }
    }

    /// Find out root level error for nested error
    fn root_cause(&self) -> Option<&dyn std::error::Error>
    where
        Self: Sized,
    {
        let mut cause = self.source()?;
        while let Some(next) = cause.source() {
            cause = next;
        }
        Some(cause)
    }
}

impl<T: ?Sized + ErrorExt> ErrorExt for Arc<T> {
    fn status_code(&self) -> StatusCode {
        self.as_ref().status_code()
    }

    fn as_any(&self) -> &dyn Any {
        self.as_ref().as_any()
    }
}

/// An opaque boxed error based on errors that implement [ErrorExt] trait.
pub struct BoxedError {
    inner: Box<dyn ErrorExt + Send + Sync>,
}

impl BoxedError {
    pub fn new<E: ErrorExt + Send + Sync + 'static>(err: E) -> Self {
        Self {
            inner: Box::new(err),
        }
    }

    pub fn into_inner(self) -> Box<dyn ErrorExt + Send + Sync> {
        self.inner
    }
}

impl std::fmt::Debug for BoxedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.inner)
    }
}

impl std::fmt::Display for BoxedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for BoxedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl ErrorExt for BoxedError {
    fn status_code(&self) -> StatusCode {
        self.inner.status_code()
    }

    fn as_any(&self) -> &dyn Any {
        self.inner.as_any()
    }
}

// Implement ErrorCompat for this opaque error so the backtrace is also available
// via `ErrorCompat::backtrace()`.
impl crate::snafu::ErrorCompat for BoxedError {
    fn backtrace(&self) -> Option<&crate::snafu::Backtrace> {
        None
    }
}

/// Error type with plain error message
#[derive(Debug)]
pub struct PlainError {
    msg: String,
    status_code: StatusCode,
}

impl PlainError {
    pub fn new(msg: String, status_code: StatusCode) -> Self {
        Self { msg, status_code }
    }
}

impl std::fmt::Display for PlainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for PlainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl ErrorExt for PlainError {
    fn status_code(&self) -> StatusCode {
        self.status_code
    }

    fn as_any(&self) -> &dyn Any {
        self as _
    }
}

#[cfg(test)]
mod tests {
    use snafu::{Location, ResultExt, Snafu};

    use super::*;
    use crate::mock::MockError;

    #[derive(Debug, Snafu)]
    enum OuterError {
        #[snafu(display("Failed to commit segment"))]
        Commit {
            source: MockError,
            #[snafu(implicit)]
            location: Location,
        },
    }

    impl ErrorExt for OuterError {
        fn status_code(&self) -> StatusCode {
            match self {
                OuterError::Commit { source, .. } => source.status_code(),
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn commit(code: StatusCode) -> Result<(), OuterError> {
        Err(MockError::new(code)).context(CommitSnafu)
    }

    #[test]
    fn test_output_msg_masks_internal() {
        let err = commit(StatusCode::Internal).unwrap_err();
        assert_eq!("Internal error: 1003", err.output_msg());
    }

    #[test]
    fn test_output_msg_with_root_cause() {
        let err = commit(StatusCode::RequestOutdated).unwrap_err();
        assert_eq!(
            "Failed to commit segment: RequestOutdated",
            err.output_msg()
        );
        assert_eq!("RequestOutdated", err.root_cause().unwrap().to_string());
    }

    #[test]
    fn test_boxed_error() {
        let boxed = BoxedError::new(commit(StatusCode::NotAcceptable).unwrap_err());
        assert_eq!(StatusCode::NotAcceptable, boxed.status_code());
        assert!(boxed.as_any().downcast_ref::<OuterError>().is_some());
    }

    #[test]
    fn test_plain_error() {
        let err = PlainError::new("disk full".to_string(), StatusCode::StorageUnavailable);
        assert_eq!(StatusCode::StorageUnavailable, err.status_code());
        assert_eq!("disk full", err.output_msg());
    }
}
