//! Argument marshaling: typed arguments in, AMX parameter cells out.
//!
//! Scalars become one cell each. References, strings and arrays are copied
//! into buffers allotted on the VM heap and the parameter cell holds the
//! buffer's address.

use std::iter;

use sampgdk_common::{cell_from_f32, AmxError, Cell, CELL_SIZE};

use crate::{
    amx::Amx,
    args::NativeArg,
    format::{ArgKind, ArgSize, ArgSpec, FormatError},
    InteropError,
};

/// A heap buffer holding one argument for the duration of a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Staged {
    /// Position of the argument it belongs to.
    pub index: usize,
    pub kind: ArgKind,
    pub addr: Cell,
    /// Effective length, in cells.
    pub cells: usize,
}

/// A call ready to go: the parameter array and the buffers backing it.
#[derive(Debug)]
pub struct Marshaled {
    /// `[argc * CELL_SIZE, arg1, arg2, ...]`.
    pub params: Vec<Cell>,
    /// In allocation order.
    pub staged: Vec<Staged>,
}

impl Marshaled {
    /// Frees every staged buffer, newest first.
    pub fn release(&self, amx: &mut Amx) {
        release_all(amx, &self.staged);
    }
}

fn release_all(amx: &mut Amx, staged: &[Staged]) {
    for buffer in staged.iter().rev() {
        amx.release(buffer.addr);
    }
}

/// Converts `args` according to `specs`.
///
/// On failure nothing stays allotted: buffers staged for earlier arguments
/// are released before the error is returned.
pub fn marshal(
    amx: &mut Amx,
    specs: &[ArgSpec],
    args: &[NativeArg<'_>],
) -> Result<Marshaled, InteropError> {
    if specs.len() != args.len() {
        return Err(FormatError::ArgumentCount {
            expected: specs.len(),
            actual: args.len(),
        }
        .into());
    }

    let mut params = Vec::with_capacity(args.len() + 1);
    params.push((args.len() * CELL_SIZE) as Cell);

    let mut staged = Vec::new();

    for (index, (spec, arg)) in specs.iter().zip(args).enumerate() {
        match marshal_one(amx, index, spec, arg, args, &mut staged) {
            Ok(cell) => params.push(cell),
            Err(err) => {
                release_all(amx, &staged);
                return Err(err);
            }
        }
    }

    Ok(Marshaled { params, staged })
}

fn marshal_one(
    amx: &mut Amx,
    index: usize,
    spec: &ArgSpec,
    arg: &NativeArg<'_>,
    args: &[NativeArg<'_>],
    staged: &mut Vec<Staged>,
) -> Result<Cell, InteropError> {
    let mismatch = || InteropError::ArgumentMismatch {
        index,
        specifier: spec.kind.specifier(),
    };

    match spec.kind {
        ArgKind::Int => match arg {
            NativeArg::Int(value) => Ok(*value),
            NativeArg::Bool(value) => Ok(*value as Cell),
            _ => Err(mismatch()),
        },

        ArgKind::Bool => match arg {
            NativeArg::Bool(value) => Ok(*value as Cell),
            NativeArg::Int(value) => Ok((*value != 0) as Cell),
            _ => Err(mismatch()),
        },

        ArgKind::Float => match arg {
            NativeArg::Float(value) => Ok(cell_from_f32(*value)),
            _ => Err(mismatch()),
        },

        ArgKind::Ref | ArgKind::RefMut => {
            let value = match (spec.kind, arg) {
                (ArgKind::Ref, NativeArg::Ref(value)) => *value,
                (_, NativeArg::RefMut(value)) => **value,
                _ => return Err(mismatch()),
            };

            let addr = stage(amx, index, spec.kind, 1, staged)?;
            amx.set_cell(addr, value)
                .map_err(|source| InteropError::Staging { index, source })?;

            Ok(addr)
        }

        ArgKind::Str | ArgKind::StrMut => {
            let bytes: &[u8] = match (spec.kind, arg) {
                (ArgKind::Str, NativeArg::Str(bytes)) => *bytes,
                (_, NativeArg::StrMut(bytes)) => &**bytes,
                _ => return Err(mismatch()),
            };

            let text = &bytes[..c_strlen(bytes)];
            let natural = match spec.kind {
                ArgKind::StrMut => bytes.len(),
                _ => text.len() + 1,
            };

            let len = effective_len(index, spec.size, natural, args)?;
            let addr = stage(amx, index, spec.kind, len, staged)?;
            let cells = amx
                .cells_mut(addr, len)
                .map_err(|source| InteropError::Staging { index, source })?;

            // at most len - 1 characters, the rest is terminator
            let chars = text.iter().take(len - 1).map(|&byte| byte as Cell);
            for (cell, value) in cells.iter_mut().zip(chars.chain(iter::repeat(0))) {
                *cell = value;
            }

            Ok(addr)
        }

        ArgKind::Array | ArgKind::ArrayMut => {
            let values: &[Cell] = match (spec.kind, arg) {
                (ArgKind::Array, NativeArg::Array(values)) => *values,
                (_, NativeArg::ArrayMut(values)) => &**values,
                _ => return Err(mismatch()),
            };

            let len = effective_len(index, spec.size, values.len(), args)?;
            let addr = stage(amx, index, spec.kind, len, staged)?;
            let cells = amx
                .cells_mut(addr, len)
                .map_err(|source| InteropError::Staging { index, source })?;

            for (cell, &value) in cells.iter_mut().zip(values.iter().chain(iter::repeat(&0))) {
                *cell = value;
            }

            Ok(addr)
        }
    }
}

fn stage(
    amx: &mut Amx,
    index: usize,
    kind: ArgKind,
    cells: usize,
    staged: &mut Vec<Staged>,
) -> Result<Cell, InteropError> {
    let addr = amx
        .allot(cells)
        .map_err(|source| InteropError::Staging { index, source })?;

    staged.push(Staged {
        index,
        kind,
        addr,
        cells,
    });

    Ok(addr)
}

/// Length in cells of a string or array argument.
fn effective_len(
    index: usize,
    size: ArgSize,
    natural: usize,
    args: &[NativeArg<'_>],
) -> Result<usize, InteropError> {
    let size = match size {
        ArgSize::Unbounded => natural as i64,
        ArgSize::Fixed(size) => size as i64,
        ArgSize::Indirect(source_index) => args
            .get(source_index)
            .and_then(NativeArg::as_size)
            .map(i64::from)
            .ok_or(InteropError::SizeArgument {
                index,
                source_index,
            })?,
    };

    if size <= 0 {
        return Err(InteropError::InvalidSize { index, size });
    }

    usize::try_from(size).map_err(|_| InteropError::Staging {
        index,
        source: AmxError::Memory,
    })
}

/// Length up to the first NUL, or the whole slice.
fn c_strlen(bytes: &[u8]) -> usize {
    bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len())
}

#[cfg(test)]
mod test {
    use sampgdk_common::f32_from_cell;

    use super::*;
    use crate::format::parse;

    fn specs(format: &str, argc: usize) -> Vec<ArgSpec> {
        parse(format, argc).unwrap()
    }

    #[test]
    fn scalars_are_bit_patterns() {
        let mut amx = Amx::new(16, 0);
        let args = [
            NativeArg::Int(-7),
            NativeArg::Bool(true),
            NativeArg::Float(3.14),
            NativeArg::Int(42),
        ];

        let marshaled = marshal(&mut amx, &specs("ibfd", 4), &args).unwrap();

        assert_eq!(marshaled.params[0], 16);
        assert_eq!(marshaled.params[1], -7);
        assert_eq!(marshaled.params[2], 1);
        assert_eq!(f32_from_cell(marshaled.params[3]), 3.14f32);
        assert_eq!(marshaled.params[4], 42);
        assert!(marshaled.staged.is_empty());
        assert_eq!(amx.heap_used(), 0);
    }

    #[test]
    fn bool_normalizes_integers() {
        let mut amx = Amx::new(16, 0);
        let args = [NativeArg::Int(9), NativeArg::Int(0), NativeArg::Bool(true)];

        let marshaled = marshal(&mut amx, &specs("bbi", 3), &args).unwrap();
        assert_eq!(&marshaled.params[1..], &[1, 0, 1]);
    }

    #[test]
    fn references_pass_addresses() {
        let mut amx = Amx::new(16, 0);
        let mut out = 11;
        let args = [NativeArg::Ref(5), NativeArg::RefMut(&mut out)];

        let marshaled = marshal(&mut amx, &specs("rR", 2), &args).unwrap();

        assert_eq!(amx.get_cell(marshaled.params[1]).unwrap(), 5);
        assert_eq!(amx.get_cell(marshaled.params[2]).unwrap(), 11);
        assert_eq!(marshaled.staged.len(), 2);
        assert_eq!(amx.heap_used(), 2);

        marshaled.release(&mut amx);
        assert_eq!(amx.heap_used(), 0);
    }

    #[test]
    fn unbounded_string_includes_terminator() {
        let mut amx = Amx::new(16, 0);
        let args = [NativeArg::Str(b"abc")];

        let marshaled = marshal(&mut amx, &specs("s", 1), &args).unwrap();

        assert_eq!(marshaled.staged[0].cells, 4);
        assert_eq!(amx.cells(marshaled.params[1], 4).unwrap(), &[97, 98, 99, 0]);
    }

    #[test]
    fn fixed_strings_truncate_and_pad() {
        let mut amx = Amx::new(32, 0);
        let args = [NativeArg::Str(b"abcdef"), NativeArg::Str(b"xy")];

        let marshaled = marshal(&mut amx, &specs("s[4]s[5]", 2), &args).unwrap();

        assert_eq!(amx.cells(marshaled.params[1], 4).unwrap(), &[97, 98, 99, 0]);
        assert_eq!(amx.cells(marshaled.params[2], 5).unwrap(), &[120, 121, 0, 0, 0]);
    }

    #[test]
    fn strings_stop_at_embedded_nul() {
        let mut amx = Amx::new(16, 0);
        let args = [NativeArg::Str(b"ab\0cd")];

        let marshaled = marshal(&mut amx, &specs("s", 1), &args).unwrap();
        assert_eq!(marshaled.staged[0].cells, 3);
    }

    #[test]
    fn high_bytes_are_unsigned() {
        let mut amx = Amx::new(16, 0);
        let args = [NativeArg::Str(&[0xff, 0x80])];

        let marshaled = marshal(&mut amx, &specs("s", 1), &args).unwrap();
        assert_eq!(amx.cells(marshaled.params[1], 3).unwrap(), &[255, 128, 0]);
    }

    #[test]
    fn indirect_size_uses_the_argument_value() {
        let mut amx = Amx::new(64, 0);
        let values = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let args = [NativeArg::Array(&values), NativeArg::Int(5)];

        let marshaled = marshal(&mut amx, &specs("a[*2]i", 2), &args).unwrap();

        assert_eq!(marshaled.staged[0].cells, 5);
        assert_eq!(amx.heap_used(), 5);
        assert_eq!(amx.cells(marshaled.params[1], 5).unwrap(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn references_can_size_buffers() {
        let mut amx = Amx::new(64, 0);
        let values = [1, 2, 3, 4, 5, 6];

        let args = [NativeArg::Array(&values), NativeArg::Ref(3)];
        let marshaled = marshal(&mut amx, &specs("a[*2]r", 2), &args).unwrap();

        assert_eq!(marshaled.staged[0].cells, 3);
        assert_eq!(amx.cells(marshaled.params[1], 3).unwrap(), &[1, 2, 3]);
        // three array cells plus the reference cell
        assert_eq!(amx.heap_used(), 4);
        marshaled.release(&mut amx);

        let mut size = 2;
        let args = [NativeArg::Array(&values), NativeArg::RefMut(&mut size)];
        let marshaled = marshal(&mut amx, &specs("a[*2]R", 2), &args).unwrap();

        assert_eq!(marshaled.staged[0].cells, 2);
        assert_eq!(amx.heap_used(), 3);
        marshaled.release(&mut amx);
        assert_eq!(amx.heap_used(), 0);
    }

    #[test]
    fn short_arrays_are_zero_padded() {
        let mut amx = Amx::new(16, 0);
        let values = [4, 5];
        let args = [NativeArg::Array(&values)];

        let marshaled = marshal(&mut amx, &specs("a[4]", 1), &args).unwrap();
        assert_eq!(amx.cells(marshaled.params[1], 4).unwrap(), &[4, 5, 0, 0]);
    }

    #[test]
    fn mismatched_arguments_release_earlier_buffers() {
        let mut amx = Amx::new(16, 0);
        let args = [NativeArg::Str(b"abc"), NativeArg::Ref(1), NativeArg::Int(1)];

        let err = marshal(&mut amx, &specs("srf", 3), &args).unwrap_err();

        assert_eq!(err, InteropError::ArgumentMismatch { index: 2, specifier: 'f' });
        assert_eq!(amx.heap_used(), 0);
    }

    #[test]
    fn mutable_specifiers_need_mutable_arguments() {
        let mut amx = Amx::new(16, 0);

        let err = marshal(&mut amx, &specs("R", 1), &[NativeArg::Ref(1)]).unwrap_err();
        assert_eq!(err, InteropError::ArgumentMismatch { index: 0, specifier: 'R' });

        let err = marshal(&mut amx, &specs("S[4]", 1), &[NativeArg::Str(b"x")]).unwrap_err();
        assert_eq!(err, InteropError::ArgumentMismatch { index: 0, specifier: 'S' });
    }

    #[test]
    fn heap_exhaustion_releases_everything() {
        let mut amx = Amx::new(8, 0);
        let values = [0; 16];
        let args = [NativeArg::Str(b"abc"), NativeArg::Array(&values)];

        let err = marshal(&mut amx, &specs("sa", 2), &args).unwrap_err();

        assert_eq!(err, InteropError::Staging { index: 1, source: AmxError::Memory });
        assert_eq!(amx.heap_used(), 0);
    }

    #[test]
    fn invalid_indirect_sizes() {
        let mut amx = Amx::new(16, 0);
        let values = [1, 2];

        let args = [NativeArg::Array(&values), NativeArg::Int(0)];
        let err = marshal(&mut amx, &specs("a[*2]i", 2), &args).unwrap_err();
        assert_eq!(err, InteropError::InvalidSize { index: 0, size: 0 });

        let args = [NativeArg::Array(&values), NativeArg::Float(2.0)];
        let err = marshal(&mut amx, &specs("a[*2]f", 2), &args).unwrap_err();
        assert_eq!(err, InteropError::SizeArgument { index: 0, source_index: 1 });

        assert_eq!(amx.heap_used(), 0);
    }

    #[test]
    fn specifier_and_argument_counts_must_agree() {
        let mut amx = Amx::new(16, 0);
        let specs = [ArgSpec::new(ArgKind::Int)];

        let err = marshal(&mut amx, &specs, &[]).unwrap_err();
        assert_eq!(
            err,
            InteropError::Format(FormatError::ArgumentCount { expected: 1, actual: 0 })
        );
    }
}
