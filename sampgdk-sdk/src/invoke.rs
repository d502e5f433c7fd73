//! Calling natives.

use std::panic::{self, AssertUnwindSafe};

use sampgdk_common::Cell;

use crate::{
    amx::Amx, args::NativeArg, format::ArgSpec, marshal::marshal, natives::AmxNative,
    output::write_back, InteropError,
};

/// Raw pass-through: `params[0]` must already hold the argument count
/// multiplied by `CELL_SIZE`.
pub fn call_native(amx: &mut Amx, native: AmxNative, params: &[Cell]) -> Cell {
    native(amx, params)
}

/// Marshals `args`, calls `native` and writes outputs back.
///
/// Errors are only ever about marshaling, in which case `native` is not
/// called. If the native raises a VM error the call still returns its
/// value and the error is left on `amx` for the caller to find. A panic
/// inside the native keeps unwinding once the staged buffers are released.
pub fn invoke_native(
    amx: &mut Amx,
    native: AmxNative,
    specs: &[ArgSpec],
    args: &mut [NativeArg<'_>],
) -> Result<Cell, InteropError> {
    let marshaled = marshal(amx, specs, args)?;

    let retval = match panic::catch_unwind(AssertUnwindSafe(|| {
        call_native(amx, native, &marshaled.params)
    })) {
        Ok(retval) => retval,
        Err(payload) => {
            marshaled.release(amx);
            panic::resume_unwind(payload);
        }
    };

    write_back(amx, marshaled, args);

    Ok(retval)
}
