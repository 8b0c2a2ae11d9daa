//! Output sinks: per-session [`Output`], test [`Capture`], and the
//! fan-out [`Broadcast`].

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared handle to a session's output sink.
///
/// Cloning yields another handle to the same sink. Handlers receive a
/// `&mut Output` and write to it with `write!`/`writeln!`.
#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Output {
    /// Wrap any writer as a session sink.
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// A sink writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// A sink writing into memory, plus the buffer to read it back.
    pub fn capture() -> (Self, Capture) {
        let capture = Capture::default();
        (Self::new(capture.clone()), capture)
    }

    /// Whether both handles refer to the same underlying sink.
    pub fn same_sink(&self, other: &Output) -> bool {
        Arc::ptr_eq(&self.sink, &other.sink)
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.lock().write_all(buf)
    }

    // One lock for the whole formatted write, so a `writeln!` is never split
    // by writes from other threads.
    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.lock().write_fmt(args)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("sink", &Arc::as_ptr(&self.sink))
            .finish()
    }
}

/// In-memory writer whose contents can be read back.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Raw bytes written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Discard everything written so far.
    pub fn clear(&self) {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fan-out sink that replicates every write to each registered session sink.
///
/// Sessions register their [`Output`] when constructed and unregister it
/// when dropped. Cloning yields another handle to the same registry, so a
/// handler can capture one to make announcements to every session.
#[derive(Clone, Default)]
pub struct Broadcast {
    sinks: Arc<Mutex<Vec<Output>>>,
}

impl Broadcast {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start replicating writes to `sink`. Registering twice is a no-op.
    pub fn register(&self, sink: &Output) {
        let mut sinks = self.lock();
        if !sinks.iter().any(|s| s.same_sink(sink)) {
            sinks.push(sink.clone());
        }
    }

    /// Stop replicating writes to `sink`.
    pub fn unregister(&self, sink: &Output) {
        self.lock().retain(|s| !s.same_sink(sink));
    }

    /// Number of registered sinks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no sink is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Output>> {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for Broadcast {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in self.lock().iter_mut() {
            // One broken connection must not silence the others.
            if let Err(e) = sink.write_all(buf) {
                log::warn!("broadcast write failed: {e}");
            }
        }
        Ok(buf.len())
    }

    fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.write_all(fmt::format(args).as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in self.lock().iter_mut() {
            if let Err(e) = sink.flush() {
                log::warn!("broadcast flush failed: {e}");
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Broadcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcast")
            .field("sinks", &self.len())
            .finish()
    }
}
