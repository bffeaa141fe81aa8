//! Print handler for configurable output.
//!
//! `print()` and the interactive echo of `single` mode write through the
//! engine's print handler:
//! - Stdout: process stdout (default)
//! - Buffer: captured for tests
//! - Lines: complete lines forwarded to a callback (the host console)
//! - Silent: discarded
//!
//! Uses enum dispatch instead of trait objects on this frequently-used path.

use std::sync::Arc;

use parking_lot::Mutex;

/// Default print handler that writes to stdout.
#[derive(Default)]
pub struct StdoutPrintHandler;

impl StdoutPrintHandler {
    pub fn print(&self, msg: &str) {
        print!("{msg}");
    }
}

/// Print handler that captures output to a buffer.
#[derive(Default)]
pub struct BufferPrintHandler {
    buffer: Mutex<String>,
}

impl BufferPrintHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print(&self, msg: &str) {
        self.buffer.lock().push_str(msg);
    }

    pub fn get_output(&self) -> String {
        self.buffer.lock().clone()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

/// Callback receiving one line of output, without the trailing newline.
pub type LineSink = Box<dyn Fn(&str) + Send + Sync>;

/// Print handler that splits output into lines for a line-oriented sink.
///
/// Text after the last newline is held back until the line completes or
/// the handler is flushed.
pub struct LinePrintHandler {
    pending: Mutex<String>,
    sink: LineSink,
}

impl LinePrintHandler {
    pub fn new(sink: LineSink) -> Self {
        LinePrintHandler {
            pending: Mutex::new(String::new()),
            sink,
        }
    }

    pub fn print(&self, msg: &str) {
        let lines = {
            let mut pending = self.pending.lock();
            pending.push_str(msg);
            let Some(last_newline) = pending.rfind('\n') else {
                return;
            };
            let rest = pending.split_off(last_newline + 1);
            std::mem::replace(&mut *pending, rest)
        };
        // The sink runs without the lock held; it may print again.
        for line in lines.lines() {
            (self.sink)(line);
        }
    }

    /// Emit any incomplete trailing line.
    pub fn flush(&self) {
        let rest = std::mem::take(&mut *self.pending.lock());
        if !rest.is_empty() {
            (self.sink)(&rest);
        }
    }
}

/// Print handler implementation using enum dispatch.
pub enum PrintHandlerImpl {
    Stdout(StdoutPrintHandler),
    Buffer(BufferPrintHandler),
    Lines(LinePrintHandler),
    Silent,
}

impl PrintHandlerImpl {
    /// Print a line (with newline).
    pub fn println(&self, msg: &str) {
        self.print(msg);
        self.print("\n");
    }

    /// Print without newline.
    pub fn print(&self, msg: &str) {
        match self {
            Self::Stdout(h) => h.print(msg),
            Self::Buffer(h) => h.print(msg),
            Self::Lines(h) => h.print(msg),
            Self::Silent => {}
        }
    }

    /// Captured output; empty for handlers that don't capture.
    pub fn get_output(&self) -> String {
        match self {
            Self::Buffer(h) => h.get_output(),
            Self::Stdout(_) | Self::Lines(_) | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(h) = self {
            h.clear();
        }
    }

    /// Push out buffered partial lines.
    pub fn flush(&self) {
        if let Self::Lines(h) = self {
            h.flush();
        }
    }
}

impl std::fmt::Debug for PrintHandlerImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Stdout(_) => "Stdout",
            Self::Buffer(_) => "Buffer",
            Self::Lines(_) => "Lines",
            Self::Silent => "Silent",
        })
    }
}

/// Shared print handler that can be passed around.
pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout(StdoutPrintHandler))
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(BufferPrintHandler::new()))
}

pub fn line_handler(sink: impl Fn(&str) + Send + Sync + 'static) -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Lines(LinePrintHandler::new(Box::new(sink))))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}
