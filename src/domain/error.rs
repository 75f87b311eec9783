use thiserror::Error;

/// A table spec that cannot be synchronised at all.
///
/// Raised by the normalizer before any database access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("table has no name")]
    MissingName,

    #[error("table `{0}` has no columns specified")]
    NoColumns(String),

    #[error("invalid {kind} identifier `{value}`: only [A-Za-z0-9_$] up to 64 characters is allowed")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("column `{column}` on table `{table}` clashes with the implicit primary key")]
    ReservedColumn { table: String, column: String },
}
