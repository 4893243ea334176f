//! Field specifications.
//!
//! Callers describe the columns the matcher should compare with a compact
//! list: a bare name (`"name"`), a name and a type (`["price", "Price"]`), or
//! a name, a type and one modifier (`["phone", "String", "has missing"]`).
//! [`compile`] turns that list into [`FieldSpec`]s, rejecting anything it does
//! not recognise before the matcher is ever touched.
//!
//! Output order always equals input order. The engine serializes its field
//! list into the settings blob, so a stable order keeps settings files
//! reproducible.

mod error;
mod spec;

pub use crate::error::FieldError;
pub use crate::spec::{compile, FieldSpec, FieldType, Modifier, RawFieldSpec};
