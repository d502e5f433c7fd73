use std::sync::Arc;

use sampgdk_common::{log::GdkLog, Cell};

use crate::{
    amx::Amx,
    args::NativeArg,
    callbacks::{PublicCallFilter, PublicFilters},
    format::{self, ArgSpec, FormatCache},
    invoke,
    logger::{stderr_sink, EnvLogger},
    natives::{AmxNative, NativeInfo, NativeRegistry},
    Config, InteropError,
};

/// Interop environment client.
///
/// Owns one VM context together with the natives registered on it, the
/// format cache and the public-call filters. Nothing is shared between two
/// environments.
pub struct GdkEnv {
    amx: Amx,
    natives: NativeRegistry,
    formats: Option<FormatCache>,
    filters: PublicFilters,
    logger: EnvLogger,
}

impl GdkEnv {
    /// New environment with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            amx: Amx::with_config(&config),
            natives: NativeRegistry::new(),
            formats: config.cache_formats.then(FormatCache::new),
            filters: PublicFilters::new(),
            logger: EnvLogger::new(config.log_level, stderr_sink()),
        }
    }

    /// Returns the logger object.
    pub fn log(&self) -> EnvLogger {
        self.logger.clone()
    }

    /// Routes log records to `sink` instead of stderr.
    pub fn set_log_sink<F>(&mut self, sink: F)
    where
        F: Fn(&GdkLog) + Send + Sync + 'static,
    {
        self.logger.set_sink(Arc::new(sink));
    }

    pub fn amx(&self) -> &Amx {
        &self.amx
    }

    pub fn amx_mut(&mut self) -> &mut Amx {
        &mut self.amx
    }

    /// Records natives the way `amx_Register` would.
    pub fn register_natives(&mut self, natives: &[(&str, AmxNative)]) {
        let added = self.natives.register(natives);

        if added < natives.len() {
            self.log().debug(
                format!("ignored {} duplicate native registrations", natives.len() - added),
                None,
            );
        }
    }

    /// All registered natives, sentinel-terminated, and their count.
    pub fn get_natives(&self) -> (&[NativeInfo], usize) {
        self.natives.get_natives()
    }

    /// Finds a native by exact name.
    pub fn find_native(&self, name: &str) -> Option<AmxNative> {
        self.natives.find_native(name)
    }

    /// Calls a native with a parameter array laid out by the caller,
    /// `params[0]` included.
    pub fn call_native(&mut self, native: AmxNative, params: &[Cell]) -> Cell {
        invoke::call_native(&mut self.amx, native, params)
    }

    /// Calls a native with arguments described by `format`.
    ///
    /// See the [`format`](crate::format) module for the specifiers. Outputs
    /// (`R`, `S`, `A`) are written back into `args` before this returns.
    pub fn invoke_native_array(
        &mut self,
        native: AmxNative,
        format: &str,
        args: &mut [NativeArg<'_>],
    ) -> Result<Cell, InteropError> {
        let specs = match self.parse_format(format, args.len()) {
            Ok(specs) => specs,
            Err(error) => {
                self.log().error(format!("bad format \"{}\": {}", format, error), None);
                return Err(error.into());
            }
        };

        let pending = self.amx.error();
        let result = invoke::invoke_native(&mut self.amx, native, &specs, args);

        match &result {
            Ok(_) => {
                if let Some(error) = self.amx.error().filter(|_| pending.is_none()) {
                    self.log().warning(format!("native raised an AMX error: {}", error), None);
                }
            }
            Err(error) => self.log().error(format!("cannot call native: {}", error), None),
        }

        result
    }

    /// [`GdkEnv::invoke_native_array`] on a native looked up by name.
    pub fn invoke_native_by_name(
        &mut self,
        name: &str,
        format: &str,
        args: &mut [NativeArg<'_>],
    ) -> Result<Cell, InteropError> {
        let Some(native) = self.find_native(name) else {
            self.log().warning(format!("native function not found: {}", name), None);
            return Err(InteropError::NativeNotFound(name.to_string()));
        };

        self.invoke_native_array(native, format, args)
    }

    fn parse_format(
        &mut self,
        format: &str,
        argc: usize,
    ) -> Result<Arc<[ArgSpec]>, format::FormatError> {
        match self.formats.as_mut() {
            Some(cache) => cache.parse(format, argc),
            None => format::parse(format, argc).map(Arc::from),
        }
    }

    /// Number of formats parsed and kept so far.
    pub fn cached_formats(&self) -> usize {
        self.formats.as_ref().map_or(0, FormatCache::len)
    }

    pub fn add_public_filter<F>(&mut self, filter: F)
    where
        F: PublicCallFilter + Send + 'static,
    {
        self.filters.add(filter);
    }

    /// Entry point for the VM's public dispatch: returns whether `name` may
    /// execute.
    pub fn dispatch_public_call(
        &mut self,
        name: &str,
        params: &[Cell],
        retval: Option<&mut Cell>,
    ) -> bool {
        self.filters.dispatch(&mut self.amx, name, params, retval)
    }
}

impl Default for GdkEnv {
    fn default() -> Self {
        Self::new()
    }
}
