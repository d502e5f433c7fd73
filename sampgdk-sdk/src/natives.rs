//! Registered natives: enumeration and lookup.

use std::fmt;

use sampgdk_common::Cell;

use crate::amx::Amx;

/// A native function. `params[0]` holds the number of arguments multiplied
/// by `CELL_SIZE`, the arguments follow.
pub type AmxNative = fn(&mut Amx, &[Cell]) -> Cell;

/// Name and address of a registered native.
///
/// The entry with an empty name and no function terminates the table
/// returned by [`NativeRegistry::get_natives`].
#[derive(Clone)]
pub struct NativeInfo {
    pub name: String,
    pub func: Option<AmxNative>,
}

impl NativeInfo {
    fn sentinel() -> Self {
        Self {
            name: String::new(),
            func: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.func.is_none() && self.name.is_empty()
    }
}

impl fmt::Debug for NativeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeInfo")
            .field("name", &self.name)
            .field("func", &self.func.map(|func| func as usize as *const ()))
            .finish()
    }
}

/// Every native seen through `amx_Register`, sorted by name.
#[derive(Clone, Debug)]
pub struct NativeRegistry {
    // always ends with the sentinel
    entries: Vec<NativeInfo>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self {
            entries: vec![NativeInfo::sentinel()],
        }
    }

    fn registered(&self) -> &[NativeInfo] {
        &self.entries[..self.entries.len() - 1]
    }

    /// Records a batch of natives. The first registration of a name wins;
    /// returns how many names were new.
    pub fn register(&mut self, natives: &[(&str, AmxNative)]) -> usize {
        let mut added = 0;

        for &(name, func) in natives {
            if name.is_empty() {
                continue;
            }

            let position = self
                .registered()
                .binary_search_by(|entry| entry.name.as_str().cmp(name));

            if let Err(position) = position {
                self.entries.insert(
                    position,
                    NativeInfo {
                        name: name.to_string(),
                        func: Some(func),
                    },
                );
                added += 1;
            }
        }

        added
    }

    /// The sentinel-terminated table and the number of real entries in it.
    pub fn get_natives(&self) -> (&[NativeInfo], usize) {
        (&self.entries, self.len())
    }

    /// Exact-name lookup.
    pub fn find_native(&self, name: &str) -> Option<AmxNative> {
        let registered = self.registered();
        let position = registered
            .binary_search_by(|entry| entry.name.as_str().cmp(name))
            .ok()?;

        registered[position].func
    }

    pub fn iter(&self) -> impl Iterator<Item = &NativeInfo> {
        self.registered().iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NativeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
