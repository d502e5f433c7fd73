//! Public-call filters.
//!
//! These run on the VM's side of the fence: whenever the host is about to
//! execute a public function it asks the registered filters first. The
//! interop layer only carries the hooks, it never calls publics itself.

use sampgdk_common::Cell;

use crate::amx::Amx;

/// A generic catch-all hook run before any public function executes.
///
/// `params` is laid out like native parameters, `params[0]` being the
/// number of arguments multiplied by `CELL_SIZE`.
pub trait PublicCallFilter {
    /// Returns whether the public is allowed to execute.
    fn on_public_call(
        &mut self,
        _amx: &mut Amx,
        _name: &str,
        _params: &[Cell],
        _retval: &mut Cell,
    ) -> bool {
        true
    }

    /// Like [`PublicCallFilter::on_public_call`], but setting `stop`
    /// keeps the call from reaching the filters registered after this one.
    fn on_public_call2(
        &mut self,
        amx: &mut Amx,
        name: &str,
        params: &[Cell],
        retval: &mut Cell,
        _stop: &mut bool,
    ) -> bool {
        self.on_public_call(amx, name, params, retval)
    }
}

impl<F> PublicCallFilter for F
where
    F: FnMut(&mut Amx, &str, &[Cell], &mut Cell) -> bool,
{
    fn on_public_call(
        &mut self,
        amx: &mut Amx,
        name: &str,
        params: &[Cell],
        retval: &mut Cell,
    ) -> bool {
        self(amx, name, params, retval)
    }
}

/// Filters in registration order.
#[derive(Default)]
pub struct PublicFilters {
    filters: Vec<Box<dyn PublicCallFilter + Send>>,
}

impl PublicFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, filter: F)
    where
        F: PublicCallFilter + Send + 'static,
    {
        self.filters.push(Box::new(filter));
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Asks the filters whether `name` may run.
    ///
    /// The public is allowed only if every filter consulted allows it. A
    /// filter that sets `stop` is the last one consulted.
    pub fn dispatch(
        &mut self,
        amx: &mut Amx,
        name: &str,
        params: &[Cell],
        retval: Option<&mut Cell>,
    ) -> bool {
        let mut scratch = 0;
        let retval = retval.unwrap_or(&mut scratch);
        let mut allowed = true;

        for filter in self.filters.iter_mut() {
            let mut stop = false;

            if !filter.on_public_call2(amx, name, params, retval, &mut stop) {
                allowed = false;
            }

            if stop {
                break;
            }
        }

        allowed
    }
}
