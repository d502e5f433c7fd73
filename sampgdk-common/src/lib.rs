//! Common structures between the interop layer and the AMX host.
//!
//! Everything in here is plain data: the cell type and its float
//! reinterpretation, the AMX status codes and the log records relayed to
//! the host's log sink.

pub mod log;

use thiserror::Error;

/// The AMX word. Every value on the VM stack and heap is one cell.
pub type Cell = i32;

/// Unsigned view of a [`Cell`].
pub type UCell = u32;

/// Size of a cell in bytes. Cell addresses are byte offsets.
pub const CELL_SIZE: usize = std::mem::size_of::<Cell>();

/// Reinterprets the bits of a float as a cell (`amx_ftoc`).
#[inline]
pub fn cell_from_f32(value: f32) -> Cell {
    value.to_bits() as Cell
}

/// Reinterprets the bits of a cell as a float (`amx_ctof`).
#[inline]
pub fn f32_from_cell(cell: Cell) -> f32 {
    f32::from_bits(cell as UCell)
}

/// AMX status codes, as reported by `amx_RaiseError` and friends.
///
/// `AMX_ERR_NONE` (0) is not an error and has no variant, see
/// [`AmxError::check`].
#[repr(u32)]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmxError {
    #[error("forced exit")]
    Exit = 1,

    #[error("assertion failed")]
    Assert = 2,

    #[error("stack/heap collision")]
    StackErr = 3,

    #[error("index out of bounds")]
    Bounds = 4,

    #[error("invalid memory access")]
    MemAccess = 5,

    #[error("invalid instruction")]
    InvInstr = 6,

    #[error("stack underflow")]
    StackLow = 7,

    #[error("heap underflow")]
    HeapLow = 8,

    #[error("no callback, or invalid callback")]
    Callback = 9,

    #[error("native function failed")]
    Native = 10,

    #[error("divide by zero")]
    Divide = 11,

    #[error("go into sleepmode - code can be restarted")]
    Sleep = 12,

    #[error("invalid state for this access")]
    InvState = 13,

    #[error("out of memory")]
    Memory = 16,

    #[error("invalid file format")]
    Format = 17,

    #[error("file is for a newer version of the AMX")]
    Version = 18,

    #[error("function not found")]
    NotFound = 19,

    #[error("invalid index parameter (bad entry point)")]
    Index = 20,

    #[error("debugger cannot run")]
    Debug = 21,

    #[error("AMX not initialized (or doubly initialized)")]
    Init = 22,

    #[error("unable to set user data field (table full)")]
    UserData = 23,

    #[error("cannot initialize the JIT")]
    InitJit = 24,

    #[error("parameter error")]
    Params = 25,

    #[error("domain error, expression result does not fit in range")]
    Domain = 26,

    #[error("general error (unknown or unspecific error)")]
    General = 27,
}

impl AmxError {
    /// Numeric `AMX_ERR_*` value.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Maps a raw status code, `0` being success.
    pub fn check(code: u32) -> Result<(), AmxError> {
        if code == 0 {
            Ok(())
        } else {
            Err(AmxError::from(code))
        }
    }
}

impl From<u32> for AmxError {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Exit,
            2 => Self::Assert,
            3 => Self::StackErr,
            4 => Self::Bounds,
            5 => Self::MemAccess,
            6 => Self::InvInstr,
            7 => Self::StackLow,
            8 => Self::HeapLow,
            9 => Self::Callback,
            10 => Self::Native,
            11 => Self::Divide,
            12 => Self::Sleep,
            13 => Self::InvState,
            16 => Self::Memory,
            17 => Self::Format,
            18 => Self::Version,
            19 => Self::NotFound,
            20 => Self::Index,
            21 => Self::Debug,
            22 => Self::Init,
            23 => Self::UserData,
            24 => Self::InitJit,
            25 => Self::Params,
            26 => Self::Domain,
            // codes 14, 15 are reserved and anything past 27 is not defined
            _ => Self::General,
        }
    }
}
