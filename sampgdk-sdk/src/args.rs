use sampgdk_common::Cell;

/// One argument of a format-driven native call.
///
/// Build these with `From` (or let [`invoke_native!`](crate::invoke_native)
/// do it): `5i32`, `true`, `1.5f32`, `&cell`, `&mut cell`, `"text"`,
/// `&mut bytes[..]`, `&cells[..]`, `&mut cells[..]`.
#[derive(Debug)]
pub enum NativeArg<'a> {
    Int(i32),
    Bool(bool),
    Float(f32),
    Ref(Cell),
    RefMut(&'a mut Cell),
    Str(&'a [u8]),
    StrMut(&'a mut [u8]),
    Array(&'a [Cell]),
    ArrayMut(&'a mut [Cell]),
}

impl NativeArg<'_> {
    /// Value used when this argument supplies the size of another one
    /// through a `[*K]` suffix.
    pub fn as_size(&self) -> Option<Cell> {
        match self {
            NativeArg::Int(value) => Some(*value),
            NativeArg::Bool(value) => Some(*value as Cell),
            NativeArg::Ref(value) => Some(*value),
            NativeArg::RefMut(value) => Some(**value),
            _ => None,
        }
    }
}

macro_rules! impl_native_arg_from {
    ($variant:ident, $inner:ty) => {
        impl<'a> From<$inner> for NativeArg<'a> {
            fn from(value: $inner) -> Self {
                NativeArg::$variant(value)
            }
        }
    };
}

macro_rules! impl_native_arg_from_fixed {
    ($variant:ident, $inner:ty) => {
        impl<'a, const N: usize> From<$inner> for NativeArg<'a> {
            fn from(value: $inner) -> Self {
                NativeArg::$variant(value)
            }
        }
    };
}

impl_native_arg_from!(Int, i32);
impl_native_arg_from!(Bool, bool);
impl_native_arg_from!(Float, f32);
impl_native_arg_from!(RefMut, &'a mut Cell);
impl_native_arg_from!(Str, &'a [u8]);
impl_native_arg_from!(StrMut, &'a mut [u8]);
impl_native_arg_from!(Array, &'a [Cell]);
impl_native_arg_from!(ArrayMut, &'a mut [Cell]);

impl_native_arg_from_fixed!(Str, &'a [u8; N]);
impl_native_arg_from_fixed!(StrMut, &'a mut [u8; N]);
impl_native_arg_from_fixed!(Array, &'a [Cell; N]);
impl_native_arg_from_fixed!(ArrayMut, &'a mut [Cell; N]);

impl<'a> From<&'a Cell> for NativeArg<'a> {
    fn from(value: &'a Cell) -> Self {
        NativeArg::Ref(*value)
    }
}

impl<'a> From<&'a str> for NativeArg<'a> {
    fn from(value: &'a str) -> Self {
        NativeArg::Str(value.as_bytes())
    }
}

impl<'a> From<&'a String> for NativeArg<'a> {
    fn from(value: &'a String) -> Self {
        NativeArg::Str(value.as_bytes())
    }
}

#[cfg(test)]
mod test {
    use super::NativeArg;

    #[test]
    fn conversions() {
        let cell = 7;
        let mut out = 0;
        let mut buf = [0u8; 4];
        let cells = [1, 2, 3];

        assert!(matches!(NativeArg::from(5i32), NativeArg::Int(5)));
        assert!(matches!(NativeArg::from(&cell), NativeArg::Ref(7)));
        assert!(matches!(NativeArg::from(&mut out), NativeArg::RefMut(_)));
        assert!(matches!(NativeArg::from("hi"), NativeArg::Str(b"hi")));
        assert!(matches!(NativeArg::from(&mut buf), NativeArg::StrMut(b) if b.len() == 4));
        assert!(matches!(NativeArg::from(&cells), NativeArg::Array(c) if c.len() == 3));
    }

    #[test]
    fn size_sources() {
        let mut size = 9;

        assert_eq!(NativeArg::Int(5).as_size(), Some(5));
        assert_eq!(NativeArg::Bool(true).as_size(), Some(1));
        assert_eq!(NativeArg::Ref(3).as_size(), Some(3));
        assert_eq!(NativeArg::RefMut(&mut size).as_size(), Some(9));
        assert_eq!(NativeArg::Float(2.0).as_size(), None);
        assert_eq!(NativeArg::Str(b"x").as_size(), None);
    }
}
