//! Cell normalization for the recordlink pipeline.
//!
//! Turns a raw caller table into the table the matcher sees: same columns,
//! same rows, same order, but every cell is either missing or a canonical
//! string, with Price and LatLong fields parsed into typed values.
//!
//! ## What we do
//!
//! - Strip currency symbols and punctuation outside `. - ( ) , : /`
//! - Transliterate to ASCII so diacritic variants compare equal
//! - Lower-case, collapse whitespace, trim
//! - Map `nan` / `none` / `nat` (any case) to missing
//! - Parse Price cells to floats and LatLong cells to coordinate pairs
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock-dependent output, no locale dependence. Normalizing an
//! already-normalized table returns it unchanged.

mod config;
mod error;
mod pipeline;
mod text;
mod typed;
mod whitespace;

pub use crate::config::{NormalizeConfig, RETAINED_PUNCTUATION};
pub use crate::error::NormalizeError;
pub use crate::pipeline::{normalize_cell, normalize_table};
pub use crate::text::normalize_text;
pub use crate::typed::{parse_lat_long, parse_price};
pub use crate::whitespace::collapse_whitespace;
