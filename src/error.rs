// Copyright 2025 coScene
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

// Error taxonomy shared by the storage backends and the ingestion service

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the gateway.
///
/// Backends translate engine-native failures into one of these variants so
/// that callers never have to know which engine is selected.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown backend name or invalid settings. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Backend unreachable or the call exceeded its timeout.
    #[error("connection error: {0}")]
    Connection(String),

    /// Backend reachable but the schema could not be created.
    #[error("schema error: {0}")]
    Schema(String),

    /// Backend rejected the data being written.
    #[error("write error: {0}")]
    Write(String),

    /// Inbound payload is malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any other backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// True when the failure was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Write(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(Error::Validation("bad".into()).is_client_error());
        assert!(Error::Write("rejected".into()).is_client_error());
        assert!(!Error::Connection("down".into()).is_client_error());
        assert!(!Error::Storage("boom".into()).is_client_error());
    }

    #[test]
    fn test_display_includes_kind() {
        let err = Error::Configuration("Unknown storage backend: 'couch'".into());
        assert_eq!(
            err.to_string(),
            "configuration error: Unknown storage backend: 'couch'"
        );
    }
}
