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

// Shared pieces of the relational backends

use crate::error::Error;
use sqlx::error::DatabaseError;

/// Columns selected from the record table, in record field order
pub(crate) type RecordRow = (i64, String, String, String, String, rust_decimal::Decimal);

/// SQL text for one relational dialect, built once from validated identifiers
#[derive(Debug, Clone)]
pub(crate) struct SqlStatements {
    pub create_namespace: String,
    pub create_table: String,
    pub insert: String,
    pub select: String,
    pub purge: String,
}

/// How a dialect classifies a database-side error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DbFailure {
    /// The object being created is already there
    AlreadyExists,
    /// The row was rejected (out of range, too long, null)
    BadData,
    Other,
}

pub(crate) type Classifier = fn(&dyn DatabaseError) -> DbFailure;

pub(crate) fn is_already_exists(err: &sqlx::Error, classify: Classifier) -> bool {
    match err {
        sqlx::Error::Database(db) => classify(db.as_ref()) == DbFailure::AlreadyExists,
        _ => false,
    }
}

/// Translate a sqlx error. Transport failures become [`Error::Connection`],
/// rejected rows become [`Error::Write`], everything else goes to `fallback`.
pub(crate) fn map_sqlx_error(
    engine: &str,
    operation: &str,
    err: sqlx::Error,
    classify: Classifier,
    fallback: fn(String) -> Error,
) -> Error {
    let message = format!("{} {} failed: {}", engine, operation, err);
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => Error::Connection(message),
        sqlx::Error::Database(db) if classify(db.as_ref()) == DbFailure::BadData => {
            Error::Write(message)
        }
        _ => fallback(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &dyn DatabaseError) -> DbFailure {
        DbFailure::Other
    }

    #[test]
    fn test_transport_errors_are_connection_errors() {
        let err = map_sqlx_error("PostgreSQL", "insert", sqlx::Error::PoolTimedOut, never, Error::Storage);
        assert!(matches!(err, Error::Connection(_)));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = map_sqlx_error("MySQL", "select", sqlx::Error::Io(io), never, Error::Storage);
        assert!(matches!(err, Error::Connection(_)));
    }

    #[test]
    fn test_other_errors_use_fallback() {
        let err = map_sqlx_error("MySQL", "create table", sqlx::Error::RowNotFound, never, Error::Schema);
        match err {
            Error::Schema(msg) => assert!(msg.starts_with("MySQL create table failed")),
            other => panic!("expected schema error, got {:?}", other),
        }
        assert!(!is_already_exists(&sqlx::Error::RowNotFound, never));
    }
}
