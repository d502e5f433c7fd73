//! sampgdk Rust SDK
//!
//! Calls AMX natives from host code with ordinary Rust values. Arguments are
//! described by a short format string, marshaled onto the VM heap, handed to
//! the native and copied back out for the output specifiers.
//!
//! ## Example
//!
//! ```
//! use sampgdk::{invoke_native, prelude::*};
//!
//! fn get_player_name(amx: &mut Amx, params: &[Cell]) -> Cell {
//!     let name = b"Kalcor";
//!     let _ = amx.set_string(params[2], name, params[3] as usize);
//!     name.len() as Cell
//! }
//!
//! let mut env = GdkEnv::new();
//! env.register_natives(&[("GetPlayerName", get_player_name)]);
//!
//! let native = env.find_native("GetPlayerName").unwrap();
//! let mut name = [0u8; 24];
//! let len = invoke_native!(env, native, "iS[*3]i", 0, &mut name, 24).unwrap();
//!
//! assert_eq!(&name[..len as usize], b"Kalcor");
//! env.log().debug(format!("got {} bytes", len), None);
//! ```
//!

pub mod amx;
mod args;
mod callbacks;
mod config;
mod env;
pub mod format;
pub mod invoke;
mod logger;
pub mod marshal;
mod natives;
pub mod output;

pub mod prelude;

use sampgdk_common::AmxError;
use thiserror::Error;

pub use amx::Amx;
pub use args::NativeArg;
pub use callbacks::{PublicCallFilter, PublicFilters};
pub use config::Config;
pub use env::GdkEnv;
pub use format::{ArgKind, ArgSize, ArgSpec, FormatCache, FormatError};
pub use logger::{EnvLogger, LogSink};
pub use natives::{AmxNative, NativeInfo, NativeRegistry};
pub use sampgdk_common::{self as common, log::LogLevel, Cell, UCell, CELL_SIZE};

/// Errors raised while preparing a native call.
///
/// None of these reach the native: when one is returned the native was not
/// called and no heap memory is left allotted.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum InteropError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("cannot stage argument {index}: {source}")]
    Staging { index: usize, source: AmxError },

    #[error("argument {index} does not fit specifier '{specifier}'")]
    ArgumentMismatch { index: usize, specifier: char },

    #[error("argument {source_index} cannot size argument {index}")]
    SizeArgument { index: usize, source_index: usize },

    #[error("argument {index} has non-positive size {size}")]
    InvalidSize { index: usize, size: i64 },

    #[error("native function not found: {0}")]
    NativeNotFound(String),
}

/// Variadic form of [`GdkEnv::invoke_native_array`].
///
/// Every argument after the format goes through `NativeArg::from`.
///
/// ```
/// use sampgdk::{invoke_native, prelude::*};
///
/// fn add(_amx: &mut Amx, params: &[Cell]) -> Cell {
///     params[1] + params[2]
/// }
///
/// let mut env = GdkEnv::new();
/// assert_eq!(invoke_native!(env, add, "ii", 2, 3), Ok(5));
/// ```
#[macro_export]
macro_rules! invoke_native {
    ($env:expr, $native:expr, $format:expr $(, $arg:expr)* $(,)?) => {
        $env.invoke_native_array(
            $native,
            $format,
            &mut [$($crate::NativeArg::from($arg)),*],
        )
    };
}
