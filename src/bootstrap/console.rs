//! Scoped diagnostic console.

use crate::host::HostingPlatform;

/// Holds a diagnostic console for as long as it lives.
///
/// The console is only requested when enabled, and only freed if this guard allocated it.
/// Whether allocation worked never influences the orchestration outcome.
pub struct ConsoleGuard<'p, P: HostingPlatform + ?Sized> {
    platform: &'p P,
    allocated: bool,
}

impl<'p, P: HostingPlatform + ?Sized> ConsoleGuard<'p, P> {
    /// Allocates a console if `enabled`.
    pub fn acquire(platform: &'p P, enabled: bool) -> Self {
        let allocated = enabled && platform.allocate_console();
        if enabled && !allocated {
            log::debug!("Diagnostic console requested but not allocated");
        }
        ConsoleGuard {
            platform,
            allocated,
        }
    }

    /// Returns `true` if this guard owns a console.
    #[must_use]
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }
}

impl<P: HostingPlatform + ?Sized> Drop for ConsoleGuard<'_, P> {
    fn drop(&mut self) {
        if self.allocated {
            self.platform.free_console();
        }
    }
}
