use super::*;

#[uniffi::export]
impl McnpCore {
    /// Create a new McnpCore instance.
    /// This is the entry point for the FFI API.
    #[uniffi::constructor]
    pub fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            services: Arc::new(RwLock::new(None)),
            event_callback: Arc::new(RwLock::new(None)),
            platform_callback: Arc::new(RwLock::new(None)),
        }
    }

    /// Open local storage and start the background session monitor.
    /// Must be called before other operations. Returns true on success.
    ///
    /// `data_dir` defaults to `MCNP_BASE_DIR`, else the platform data dir.
    pub fn init(&self, data_dir: Option<String>) -> bool {
        if self.initialized.load(Ordering::SeqCst) {
            tracing::debug!("ffi.init already initialized");
            return true;
        }
        crate::tracing_setup::init_tracing();

        let mut config = CoreConfig::from_env();
        config.data_dir = data_dir_or_default(data_dir);
        if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
            tracing::error!(dir = %config.data_dir.display(), error = %e, "failed to create data directory");
            return false;
        }

        let services = match self.build_services(config) {
            Ok(services) => services,
            Err(e) => {
                tracing::error!(error = %e, "ffi.init failed");
                return false;
            }
        };
        tracing::info!(dir = %services.config.data_dir.display(), "mcnp core initialized");

        match self.services.write() {
            Ok(mut guard) => *guard = Some(Arc::new(services)),
            Err(_) => return false,
        }
        self.initialized.store(true, Ordering::SeqCst);
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Stop background tasks and release storage. `init()` may be called again.
    pub fn shutdown(&self) {
        let services = match self.services.write() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(services) = services {
            if let Ok(mut handle) = services.monitor_handle.lock() {
                if let Some(handle) = handle.take() {
                    handle.stop();
                }
            }
            if let Ok(mut listener) = services.live_listener.lock() {
                if let Some(listener) = listener.take() {
                    listener.stop();
                }
            }
        }
        self.initialized.store(false, Ordering::SeqCst);
        tracing::info!("mcnp core shut down");
    }

    pub fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    pub fn data_dir(&self) -> Result<String, McnpError> {
        Ok(self.services()?.config.data_dir.display().to_string())
    }
}

impl Default for McnpCore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_core_errors() {
        let core = McnpCore::new();
        assert!(!core.is_initialized());
        assert!(matches!(core.data_dir(), Err(McnpError::CoreNotInitialized)));
    }

    #[test]
    fn test_init_and_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let core = McnpCore::new();

        assert!(core.init(Some(dir.path().display().to_string())));
        assert!(core.init(None));
        assert_eq!(core.data_dir().unwrap(), dir.path().display().to_string());

        core.shutdown();
        assert!(!core.is_initialized());
        assert!(core.data_dir().is_err());
    }
}
