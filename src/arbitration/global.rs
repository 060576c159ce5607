//! Process-wide registry instance.
//!
//! The hook trampolines and the exported C functions have no context argument, so they reach
//! the registry through this module. The instance is installed when the module is loaded into
//! the host and torn down when it is unloaded.

use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    arbitration::registry::{ArbitrationConfig, ArbitrationRegistry},
    Result,
};

static REGISTRY: RwLock<Option<Arc<ArbitrationRegistry>>> = RwLock::new(None);

/// Installs the process-wide registry, or returns the one already installed.
///
/// # Errors
///
/// - [`crate::Error::Configuration`] if `config` is invalid
/// - [`crate::Error::LockError`] if the global lock is poisoned
pub fn install(config: ArbitrationConfig) -> Result<Arc<ArbitrationRegistry>> {
    let mut installed = write_lock!(REGISTRY)?;
    if let Some(registry) = installed.as_ref() {
        return Ok(registry.clone());
    }

    let registry = Arc::new(ArbitrationRegistry::with_config(config)?);
    *installed = Some(registry.clone());
    log::debug!(
        "Arbitration registry installed with {} hook slots",
        registry.hook_capacity()
    );
    Ok(registry)
}

/// The installed registry, if any.
#[must_use]
pub fn current() -> Option<Arc<ArbitrationRegistry>> {
    read_lock_recover!(REGISTRY).clone()
}

/// The installed registry, installing a default one first if needed.
///
/// # Errors
///
/// Returns [`crate::Error::LockError`] if the global lock is poisoned.
pub fn current_or_install() -> Result<Arc<ArbitrationRegistry>> {
    match current() {
        Some(registry) => Ok(registry),
        None => install(ArbitrationConfig::default()),
    }
}

/// Removes the installed registry and returns it.
///
/// Hooks still installed afterwards leak every pointer they see.
pub fn teardown() -> Option<Arc<ArbitrationRegistry>> {
    let registry = REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if registry.is_some() {
        log::debug!("Arbitration registry torn down");
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::GLOBAL_REGISTRY_LOCK;

    #[test]
    fn test_install_is_idempotent() {
        let _guard = GLOBAL_REGISTRY_LOCK.lock().unwrap();
        teardown();

        let first = install(ArbitrationConfig::default().with_hook_capacity(4)).unwrap();
        let second = install(ArbitrationConfig::default()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.hook_capacity(), 4);

        let removed = teardown().unwrap();
        assert!(Arc::ptr_eq(&first, &removed));
        assert!(current().is_none());
        assert!(teardown().is_none());
    }

    #[test]
    fn test_current_or_install() {
        let _guard = GLOBAL_REGISTRY_LOCK.lock().unwrap();
        teardown();

        let registry = current_or_install().unwrap();
        assert!(Arc::ptr_eq(&registry, &current().unwrap()));
        teardown();
    }
}
