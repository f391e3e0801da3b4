//! Error types for the value layer.
//!
//! The reactive core never fails on its own: reentrant runs are reported as
//! `None` and panics inside computations propagate to the caller unchanged.
//! The errors here come from converting between [`Value`](crate::value::Value)
//! and Rust or JSON types.

use thiserror::Error;

/// Errors produced when converting values in or out of observed state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// A value did not have the type the caller asked for.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// The requested type.
        expected: &'static str,
        /// The kind of value actually stored.
        found: &'static str,
    },

    /// A JSON number fits neither `i64` nor `f64`.
    #[error("unsupported JSON number: {0}")]
    UnsupportedNumber(String),

    /// Only JSON objects and arrays can become observed records.
    #[error("cannot observe a JSON {0}: expected an object or array")]
    NotAKeyedStructure(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_both_sides() {
        let err = ValueError::TypeMismatch {
            expected: "int",
            found: "string",
        };
        assert_eq!(err.to_string(), "expected int, found string");
    }
}
