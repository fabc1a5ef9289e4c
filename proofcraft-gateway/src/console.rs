//! Console sink
//!
//! Progress and intermediate model output go to stdout, and every byte written
//! is mirrored into an optional log file. The file is opened (truncated) when
//! the console is created and flushed + closed when it is dropped.

use crate::error::{Error, Result};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

type Sink = Box<dyn Write + Send>;

struct Sinks {
    out: Sink,
    mirror: Option<Sink>,
}

impl Sinks {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)?;
        self.out.flush()?;
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.write_all(bytes)?;
            mirror.flush()?;
        }
        Ok(())
    }
}

/// Printing sink shared by the gateway and the solving loop
pub struct Console {
    sinks: Mutex<Sinks>,
}

impl Console {
    /// Print to stdout only
    pub fn stdout() -> Self {
        Self::from_writers(io::stdout(), None::<io::Sink>)
    }

    /// Discard everything
    pub fn silent() -> Self {
        Self::from_writers(io::sink(), None::<io::Sink>)
    }

    /// Print to stdout and mirror into `path`, truncating any existing file
    pub fn with_log_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| Error::io_at(path.display().to_string(), e))
            .map_err(|e| e.with_operation("console::open_log"))?;
        tracing::debug!(path = %path.display(), "mirroring console to log file");
        Ok(Self::from_writers(io::stdout(), Some(BufWriter::new(file))))
    }

    pub fn from_writers<W, M>(out: W, mirror: Option<M>) -> Self
    where
        W: Write + Send + 'static,
        M: Write + Send + 'static,
    {
        Self {
            sinks: Mutex::new(Sinks {
                out: Box::new(out),
                mirror: mirror.map(|m| Box::new(m) as Sink),
            }),
        }
    }

    /// Print `message` followed by a newline
    pub fn line(&self, message: impl fmt::Display) -> Result<()> {
        self.emit(format!("{}\n", message).as_bytes())
    }

    /// Print a heading line and then a body
    pub fn block(&self, heading: impl fmt::Display, body: impl fmt::Display) -> Result<()> {
        self.line(heading)?;
        self.line(body)
    }

    /// Print without a trailing newline (used for streamed tokens)
    pub fn write(&self, text: &str) -> Result<()> {
        self.emit(text.as_bytes())
    }

    pub fn newline(&self) -> Result<()> {
        self.emit(b"\n")
    }

    /// Flush and close the log file. Later output only reaches stdout.
    pub fn close_log(&self) -> Result<()> {
        let mut sinks = self.lock()?;
        if let Some(mut mirror) = sinks.mirror.take() {
            mirror
                .flush()
                .map_err(|e| Error::from(e).with_operation("console::close_log"))?;
        }
        Ok(())
    }

    fn emit(&self, bytes: &[u8]) -> Result<()> {
        self.lock()?
            .write_all(bytes)
            .map_err(|e| Error::from(e).with_operation("console::write"))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Sinks>> {
        self.sinks
            .lock()
            .map_err(|_| Error::unexpected("console lock poisoned").with_operation("console::lock"))
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        if let Ok(sinks) = self.sinks.get_mut() {
            let _ = sinks.out.flush();
            if let Some(mirror) = sinks.mirror.as_mut() {
                let _ = mirror.flush();
            }
        }
    }
}

/// Cloneable in-memory writer, handy for capturing console output
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "buffer lock poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
