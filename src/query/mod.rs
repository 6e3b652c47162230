#![forbid(unsafe_code)]

//! Statement construction and result decoding.
//!
//! This module turns editor inputs into parameter-bound statements and turns
//! gateway rows back into typed records.

/// Structured statement shapes.
pub mod ast;

/// Builders mapping editor inputs to [`Query`] values.
pub mod builder;

/// Fixed-width row decoding.
pub mod decode;

/// Values bound into statements and returned in rows.
pub mod value;

pub use ast::Statement;
pub use builder::Query;
pub use value::Value;
