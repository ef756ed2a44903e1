//! Registration bookkeeping for jnibridge.
//!
//! - [`EntryPointRegistry`]: the run-owned accumulator of claimed entry-point
//!   names, used for cross-target collision checks
//! - [`RegistrationTableBuilder`] / [`RegistrationTable`]: the ordered,
//!   stamped list of every binding to register at load time
//! - [`render_registration_unit`]: the C++ unit exposing
//!   `jnibridge_register_natives`

pub mod entry_points;
pub mod render;
pub mod table;

pub use entry_points::{Claim, Conflict, EntryPointRegistry};
pub use render::{JniVersion, RegistrationOptions, render_registration_unit, string_literal};
pub use table::{
    NativeFunction, RegistrationEntry, RegistrationTable, RegistrationTableBuilder, TableStamp,
};
