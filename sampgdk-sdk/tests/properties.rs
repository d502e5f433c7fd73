use proptest::prelude::*;
use sampgdk::{format, invoke_native, prelude::*};

fn echo_float(_amx: &mut Amx, params: &[Cell]) -> Cell {
    params[1]
}

fn copy_string(amx: &mut Amx, params: &[Cell]) -> Cell {
    match amx.get_string(params[1]) {
        Ok(text) => match amx.set_string(params[2], &text, params[3] as usize) {
            Ok(()) => text.len() as Cell,
            Err(_) => -1,
        },
        Err(_) => -1,
    }
}

fn fill_array(amx: &mut Amx, params: &[Cell]) -> Cell {
    let len = params[2] as usize;

    match amx.cells_mut(params[1], len) {
        Ok(cells) => {
            for (i, cell) in cells.iter_mut().enumerate() {
                *cell = i as Cell * 2;
            }
            len as Cell
        }
        Err(_) => -1,
    }
}

proptest! {
    #[test]
    fn floats_keep_their_bits(value in any::<f32>()) {
        let mut env = GdkEnv::new();
        let ret = invoke_native!(env, echo_float, "f", value).unwrap();

        prop_assert_eq!(f32_from_cell(ret).to_bits(), value.to_bits());
    }

    #[test]
    fn strings_fit_their_buffer(text in "[a-zA-Z0-9 ]{0,40}", size in 1usize..48) {
        let mut env = GdkEnv::new();
        let mut out = vec![0u8; size];

        let len = invoke_native!(env, copy_string, "sS[*3]i", text.as_str(), &mut out[..], size as Cell)
            .unwrap();

        let kept = text.len().min(size - 1);
        prop_assert_eq!(len as usize, text.len());
        prop_assert_eq!(&out[..kept], &text.as_bytes()[..kept]);
        prop_assert_eq!(out[kept], 0);
        prop_assert_eq!(env.amx().heap_used(), 0);
    }

    #[test]
    fn arrays_come_back_whole(len in 1usize..64) {
        let mut env = GdkEnv::new();
        let mut cells = vec![-1; len];

        let ret = invoke_native!(env, fill_array, "A[*2]i", &mut cells[..], len as Cell).unwrap();

        prop_assert_eq!(ret as usize, len);
        for (i, cell) in cells.iter().enumerate() {
            prop_assert_eq!(*cell, i as Cell * 2);
        }
        prop_assert_eq!(env.amx().heap_used(), 0);
    }

    #[test]
    fn parsing_never_panics(format in "[idbfrRsSaAxz\\[\\]\\*0-9]{0,12}", argc in 0usize..40) {
        let _ = format::parse(&format, argc);
    }
}
