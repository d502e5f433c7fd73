//! sampgdk SDK prelude.
//!
//! Exports the types most natives and call sites need.
//!

pub use crate::{
    Amx, AmxNative, Cell, GdkEnv, InteropError, NativeArg, PublicCallFilter, CELL_SIZE,
};
pub use sampgdk_common::{cell_from_f32, f32_from_cell, AmxError};
