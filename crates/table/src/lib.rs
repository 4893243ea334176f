//! Table layer shared by every recordlink stage.
//!
//! A [`Table`] is what callers hand in and get back: named columns, a row
//! index of [`RecordId`]s, and [`Value`] cells. A [`RecordSet`] is what the
//! matching engine sees: the same rows as ordered `field → value` maps.
//!
//! Row order is significant everywhere. Engines enumerate records in
//! insertion order, cluster ids are assigned in enumeration order, and the
//! reconciler returns rows in the caller's original order.

mod error;
mod frame;
mod io;
mod record;
mod value;

pub use crate::error::TableError;
pub use crate::frame::Table;
pub use crate::io::{read_csv, read_csv_path, write_csv};
pub use crate::record::{Record, RecordSet};
pub use crate::value::{RecordId, Value};
