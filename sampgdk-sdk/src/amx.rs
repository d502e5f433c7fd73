//! The slice of an AMX instance that natives and the marshaler touch.
//!
//! Memory is a flat run of cells addressed by byte offset. The heap starts
//! at the bottom and grows up towards the stack reserve; staged arguments
//! are allotted from it and released in LIFO order, the same way
//! `amx_Allot` and `amx_Release` behave.

use std::ops::Range;

use sampgdk_common::{AmxError, Cell, CELL_SIZE};

use crate::Config;

/// Most cells a context can hold with every byte address still fitting in a
/// [`Cell`].
pub const MAX_CELLS: usize = Cell::MAX as usize / CELL_SIZE;

// Heap first, the stack reserve gets what is left of the address space.
fn clamp_sizes(heap_cells: usize, stack_cells: usize) -> (usize, usize) {
    let heap_cells = heap_cells.min(MAX_CELLS);
    (heap_cells, stack_cells.min(MAX_CELLS - heap_cells))
}

/// AMX context handle.
///
/// Every operation that touches VM memory takes this explicitly, so several
/// contexts can live side by side.
#[derive(Clone, Debug)]
pub struct Amx {
    memory: Vec<Cell>,
    /// Heap base, in bytes.
    hlw: usize,
    /// Heap top, in bytes. Everything below it is addressable.
    hea: usize,
    /// First byte the heap may not grow into.
    heap_limit: usize,
    error: Option<AmxError>,
}

impl Amx {
    /// Creates a context with `heap_cells` of heap and `stack_cells` of
    /// stack reserve above it. Both are cut down to [`MAX_CELLS`] in total.
    pub fn new(heap_cells: usize, stack_cells: usize) -> Self {
        let (heap_cells, stack_cells) = clamp_sizes(heap_cells, stack_cells);
        let heap_limit = heap_cells * CELL_SIZE;

        Self {
            memory: vec![0; heap_cells + stack_cells],
            hlw: 0,
            hea: 0,
            heap_limit,
            error: None,
        }
    }

    pub fn with_config(config: &Config) -> Self {
        Self::new(config.heap_cells, config.stack_cells)
    }

    /// Reserves `cells` on the heap and returns the address of the first one.
    ///
    /// Fails with [`AmxError::Memory`] when the heap would run into the
    /// stack reserve. The contents of the new cells are unspecified.
    pub fn allot(&mut self, cells: usize) -> Result<Cell, AmxError> {
        let bytes = cells.checked_mul(CELL_SIZE).ok_or(AmxError::Memory)?;
        let top = self.hea.checked_add(bytes).ok_or(AmxError::Memory)?;

        if top > self.heap_limit {
            return Err(AmxError::Memory);
        }

        let addr = Cell::try_from(self.hea).map_err(|_| AmxError::Memory)?;
        self.hea = top;

        Ok(addr)
    }

    /// Frees everything allotted at or above `addr`.
    pub fn release(&mut self, addr: Cell) {
        let Ok(addr) = usize::try_from(addr) else {
            return;
        };

        if addr >= self.hlw && self.hea > addr {
            self.hea = addr;
        }
    }

    /// Heap base address.
    pub fn heap_base(&self) -> Cell {
        self.hlw as Cell
    }

    /// Current heap top address.
    pub fn heap_top(&self) -> Cell {
        self.hea as Cell
    }

    /// Number of cells currently allotted.
    pub fn heap_used(&self) -> usize {
        (self.hea - self.hlw) / CELL_SIZE
    }

    fn range(&self, addr: Cell, cells: usize) -> Result<Range<usize>, AmxError> {
        let addr = usize::try_from(addr).map_err(|_| AmxError::MemAccess)?;

        if addr % CELL_SIZE != 0 {
            return Err(AmxError::MemAccess);
        }

        let end = cells
            .checked_mul(CELL_SIZE)
            .and_then(|bytes| addr.checked_add(bytes))
            .ok_or(AmxError::MemAccess)?;

        if end > self.hea {
            return Err(AmxError::MemAccess);
        }

        Ok(addr / CELL_SIZE..end / CELL_SIZE)
    }

    pub fn get_cell(&self, addr: Cell) -> Result<Cell, AmxError> {
        let range = self.range(addr, 1)?;
        Ok(self.memory[range.start])
    }

    pub fn set_cell(&mut self, addr: Cell, value: Cell) -> Result<(), AmxError> {
        let range = self.range(addr, 1)?;
        self.memory[range.start] = value;

        Ok(())
    }

    /// Borrows `len` cells starting at `addr` (`amx_GetAddr`).
    pub fn cells(&self, addr: Cell, len: usize) -> Result<&[Cell], AmxError> {
        let range = self.range(addr, len)?;
        Ok(&self.memory[range])
    }

    pub fn cells_mut(&mut self, addr: Cell, len: usize) -> Result<&mut [Cell], AmxError> {
        let range = self.range(addr, len)?;
        Ok(&mut self.memory[range])
    }

    /// Reads an unpacked string (one character per cell) up to its
    /// terminator, like `amx_GetString`.
    pub fn get_string(&self, addr: Cell) -> Result<Vec<u8>, AmxError> {
        let start = self.range(addr, 0)?.start;
        let available = &self.memory[start..self.hea / CELL_SIZE];

        let len = available
            .iter()
            .position(|&c| c == 0)
            .ok_or(AmxError::MemAccess)?;

        Ok(available[..len].iter().map(|&c| c as u8).collect())
    }

    /// Writes `bytes` as an unpacked string into a buffer of `size` cells.
    /// At most `size - 1` characters are stored and the result is always
    /// terminated.
    pub fn set_string(&mut self, addr: Cell, bytes: &[u8], size: usize) -> Result<(), AmxError> {
        if size == 0 {
            return Err(AmxError::Params);
        }

        let cells = self.cells_mut(addr, size)?;
        let len = bytes.len().min(size - 1);

        for (cell, &byte) in cells.iter_mut().zip(&bytes[..len]) {
            *cell = byte as Cell;
        }
        cells[len] = 0;

        Ok(())
    }

    /// Records a VM-level error, as natives do with `amx_RaiseError`.
    ///
    /// The interop layer never clears or intercepts it: the error stays on
    /// the context until whoever drives the VM looks at it.
    pub fn raise_error(&mut self, error: AmxError) {
        self.error = Some(error);
    }

    /// Raw status code flavour of [`Amx::raise_error`]. `0` is a no-op.
    pub fn raise_error_code(&mut self, code: u32) {
        if let Err(error) = AmxError::check(code) {
            self.raise_error(error);
        }
    }

    pub fn error(&self) -> Option<AmxError> {
        self.error
    }

    /// Takes the pending error, leaving the context clean.
    pub fn clear_error(&mut self) -> Option<AmxError> {
        self.error.take()
    }
}

impl Default for Amx {
    fn default() -> Self {
        Self::with_config(&Config::default())
    }
}
