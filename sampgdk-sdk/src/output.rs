//! Copies outputs back to the caller and frees the call's heap buffers.

use sampgdk_common::Cell;

use crate::{amx::Amx, args::NativeArg, marshal::Marshaled};

/// Runs after every invocation, whatever the native returned or raised.
///
/// `R`, `S` and `A` arguments are refreshed from VM memory, then every
/// staged buffer is released exactly once, newest first.
pub fn write_back(amx: &mut Amx, marshaled: Marshaled, args: &mut [NativeArg<'_>]) {
    for staged in marshaled.staged.iter().rev() {
        if staged.kind.is_output() {
            if let (Ok(cells), Some(arg)) =
                (amx.cells(staged.addr, staged.cells), args.get_mut(staged.index))
            {
                copy_out(cells, arg);
            }
        }

        amx.release(staged.addr);
    }
}

fn copy_out(cells: &[Cell], arg: &mut NativeArg<'_>) {
    match arg {
        NativeArg::RefMut(value) => {
            if let Some(&cell) = cells.first() {
                **value = cell;
            }
        }

        NativeArg::StrMut(buf) => {
            let cap = buf.len().min(cells.len());
            if cap == 0 {
                return;
            }

            let len = cells[..cap - 1]
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(cap - 1);

            for (byte, &cell) in buf.iter_mut().zip(&cells[..len]) {
                *byte = cell as u8;
            }
            buf[len] = 0;
        }

        NativeArg::ArrayMut(buf) => {
            let len = buf.len().min(cells.len());
            buf[..len].copy_from_slice(&cells[..len]);
        }

        _ => {}
    }
}
