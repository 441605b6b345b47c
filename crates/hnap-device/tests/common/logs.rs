//! Log capture

use std::io;
use std::sync::{Arc, Mutex};

use tracing::subscriber::DefaultGuard;

/// Buffer receiving formatted log lines
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Capture every event at `debug` and above on the current thread
///
/// Use from a current-thread runtime so task logs land on this thread.
pub fn capture_logs() -> (LogCapture, DefaultGuard) {
    let capture = LogCapture::default();
    let buffer = capture.0.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || CaptureWriter(buffer.clone()))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    (capture, tracing::subscriber::set_default(subscriber))
}
