//! Diagnostic log sink.
//!
//! An injected module has no console and no return channel, so diagnostics go to the debug
//! sink: `OutputDebugStringW` on Windows (visible in a debugger or DebugView), stderr
//! elsewhere. [`init`] installs an `env_logger` that pipes into [`DebugSink`] once per process.

use std::{io, sync::Once};

use env_logger::{Builder, Env, Target};

use crate::bootstrap::config::LOG_FILTER_ENV;

static INIT: Once = Once::new();

/// Installs the process-wide logger.
///
/// The filter comes from `CLRSHIM_LOG` (`env_logger` syntax) and defaults to `info`. Calling
/// this again, or after another logger was installed by the host, does nothing.
pub fn init() {
    INIT.call_once(|| {
        let result = Builder::from_env(Env::new().filter_or(LOG_FILTER_ENV, "info"))
            .target(Target::Pipe(Box::new(DebugSink::new())))
            .format_timestamp(None)
            .format_module_path(false)
            .try_init();

        if result.is_err() {
            log::debug!("A logger is already installed; keeping it");
        }
    });
}

/// Line-buffered writer into the platform debug sink.
///
/// Each complete line is emitted as one message; a trailing partial line is emitted on flush.
pub struct DebugSink {
    pending: Vec<u8>,
    emit: fn(&[u8]),
}

impl DebugSink {
    /// Creates a sink writing to the platform debug output.
    #[must_use]
    pub fn new() -> Self {
        Self::with_emitter(emit_platform)
    }

    /// Creates a sink handing each line to `emit`.
    #[must_use]
    pub fn with_emitter(emit: fn(&[u8])) -> Self {
        DebugSink {
            pending: Vec::new(),
            emit,
        }
    }
}

impl Default for DebugSink {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for DebugSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let rest = self.pending.split_off(pos + 1);
            let line = std::mem::replace(&mut self.pending, rest);
            (self.emit)(&line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            (self.emit)(&line);
        }
        Ok(())
    }
}

#[cfg(windows)]
fn emit_platform(line: &[u8]) {
    use widestring::U16CString;
    use windows::{core::PCWSTR, Win32::System::Diagnostics::Debug::OutputDebugStringW};

    let text = String::from_utf8_lossy(line);
    let wide = U16CString::from_str_truncate(text.as_ref());
    unsafe { OutputDebugStringW(PCWSTR::from_raw(wide.as_ptr())) };
}

#[cfg(not(windows))]
fn emit_platform(line: &[u8]) {
    use std::io::Write;

    let _ = io::stderr().write_all(line);
}
