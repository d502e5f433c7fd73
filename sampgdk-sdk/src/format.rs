//! Format strings.
//!
//! One character per argument:
//!
//! Specifier | Rust argument            | Description
//! :-------- | :----------------------- | :-------------------------------------
//! `i`, `d`  | `i32`                    | integer value
//! `b`       | `bool`                   | boolean value
//! `f`       | `f32`                    | floating-point value
//! `r`       | `&Cell`                  | const reference (input only)
//! `R`       | `&mut Cell`              | non-const reference (input and output)
//! `s`       | `&str`, `&[u8]`          | const string (input only)
//! `S`       | `&mut [u8]`              | non-const string (input and output)
//! `a`       | `&[Cell]`                | const array (input only)
//! `A`       | `&mut [Cell]`            | non-const array (input and output)
//!
//! Strings and arrays may be followed by `[N]` (fixed size, in cells) or
//! `[*K]` (size taken at call time from the K-th argument, counting from 1).

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::CharIndices;
use std::sync::Arc;

use thiserror::Error;

/// Upper bound on the number of arguments a single call may carry.
pub const MAX_NATIVE_ARGS: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Int,
    Bool,
    Float,
    Ref,
    RefMut,
    Str,
    StrMut,
    Array,
    ArrayMut,
}

impl ArgKind {
    pub fn from_specifier(specifier: char) -> Option<Self> {
        let kind = match specifier {
            'i' | 'd' => Self::Int,
            'b' => Self::Bool,
            'f' => Self::Float,
            'r' => Self::Ref,
            'R' => Self::RefMut,
            's' => Self::Str,
            'S' => Self::StrMut,
            'a' => Self::Array,
            'A' => Self::ArrayMut,
            _ => return None,
        };

        Some(kind)
    }

    pub fn specifier(self) -> char {
        match self {
            Self::Int => 'i',
            Self::Bool => 'b',
            Self::Float => 'f',
            Self::Ref => 'r',
            Self::RefMut => 'R',
            Self::Str => 's',
            Self::StrMut => 'S',
            Self::Array => 'a',
            Self::ArrayMut => 'A',
        }
    }

    /// Whether the argument is copied back to the caller after the call
    /// (`R`, `S`, `A`).
    pub fn is_output(self) -> bool {
        matches!(self, Self::RefMut | Self::StrMut | Self::ArrayMut)
    }

    /// Strings and arrays, the only kinds that accept a size suffix.
    pub fn is_buffer(self) -> bool {
        matches!(self, Self::Str | Self::StrMut | Self::Array | Self::ArrayMut)
    }
}

/// Where the length of a string or array argument comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArgSize {
    /// No suffix: the length of the value itself.
    Unbounded,
    /// `[N]`, in cells.
    Fixed(usize),
    /// `[*K]`, holding the zero-based position of the argument whose value
    /// is the length.
    Indirect(usize),
}

/// Parsed form of one specifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArgSpec {
    pub kind: ArgKind,
    pub size: ArgSize,
}

impl ArgSpec {
    pub fn new(kind: ArgKind) -> Self {
        Self {
            kind,
            size: ArgSize::Unbounded,
        }
    }

    pub fn sized(kind: ArgKind, size: ArgSize) -> Self {
        Self { kind, size }
    }
}

/// Malformed format strings. Positions are byte offsets into the format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unrecognized type specifier '{specifier}' at position {position}")]
    UnknownSpecifier { specifier: char, position: usize },

    #[error("specifier '{specifier}' at position {position} does not take a size")]
    UnexpectedSize { specifier: char, position: usize },

    #[error("malformed size suffix at position {position}")]
    MalformedSize { position: usize },

    #[error("invalid buffer size 0 at position {position}")]
    ZeroSize { position: usize },

    #[error("size argument {index} at position {position} is out of range (1..={argc})")]
    SizeIndex {
        index: usize,
        argc: usize,
        position: usize,
    },

    #[error("format describes {expected} arguments but {actual} were supplied")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("too many arguments (at most {} are supported)", MAX_NATIVE_ARGS)]
    TooManyArguments,
}

/// Parses `format` for a call carrying `argc` arguments.
pub fn parse(format: &str, argc: usize) -> Result<Vec<ArgSpec>, FormatError> {
    let mut specs = Vec::with_capacity(argc.min(MAX_NATIVE_ARGS));
    let mut chars = format.char_indices().peekable();

    while let Some((position, specifier)) = chars.next() {
        if specs.len() == MAX_NATIVE_ARGS {
            return Err(FormatError::TooManyArguments);
        }

        let kind = ArgKind::from_specifier(specifier)
            .ok_or(FormatError::UnknownSpecifier { specifier, position })?;

        let size = match chars.peek() {
            Some(&(bracket, '[')) => {
                if !kind.is_buffer() {
                    return Err(FormatError::UnexpectedSize { specifier, position });
                }

                chars.next();
                parse_size(&mut chars, bracket, argc)?
            }
            _ => ArgSize::Unbounded,
        };

        specs.push(ArgSpec { kind, size });
    }

    if specs.len() != argc {
        return Err(FormatError::ArgumentCount {
            expected: specs.len(),
            actual: argc,
        });
    }

    Ok(specs)
}

// Consumes everything after `[` up to and including `]`.
fn parse_size(
    chars: &mut Peekable<CharIndices<'_>>,
    position: usize,
    argc: usize,
) -> Result<ArgSize, FormatError> {
    let indirect = chars.next_if(|&(_, c)| c == '*').is_some();

    let mut digits = String::new();
    loop {
        match chars.next() {
            Some((_, ']')) => break,
            Some((_, c)) if c.is_ascii_digit() => digits.push(c),
            _ => return Err(FormatError::MalformedSize { position }),
        }
    }

    let value: usize = digits
        .parse()
        .map_err(|_| FormatError::MalformedSize { position })?;

    if indirect {
        if value == 0 || value > argc {
            return Err(FormatError::SizeIndex {
                index: value,
                argc,
                position,
            });
        }

        Ok(ArgSize::Indirect(value - 1))
    } else {
        if value == 0 {
            return Err(FormatError::ZeroSize { position });
        }

        Ok(ArgSize::Fixed(value))
    }
}

/// Parsed formats keyed by their exact text.
///
/// An entry is written once, on the first successful parse, and only read
/// afterwards. Failed parses are never cached.
#[derive(Clone, Debug, Default)]
pub struct FormatCache {
    entries: HashMap<String, Arc<[ArgSpec]>>,
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, format: &str, argc: usize) -> Result<Arc<[ArgSpec]>, FormatError> {
        // a successful parse always has one spec per argument, so a cached
        // entry with another length would fail the count check anyway
        if let Some(specs) = self.entries.get(format) {
            if specs.len() == argc {
                return Ok(Arc::clone(specs));
            }
        }

        let specs: Arc<[ArgSpec]> = parse(format, argc)?.into();
        self.entries.insert(format.to_string(), Arc::clone(&specs));

        Ok(specs)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
