//! Line source: lazily reads work lines from an input stream

use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{ConfigError, InputError};

/// Consecutive read failures tolerated before the input is treated as closed
pub const MAX_CONSECUTIVE_READ_ERRORS: u32 = 16;

/// A lazily produced sequence of input lines
///
/// Lines are raw bytes without their terminator, so they need not be valid
/// UTF-8. A producer task reads ahead by at most one line; it ends the
/// sequence at end of stream.
pub struct LineSource {
    rx: mpsc::Receiver<OsString>,
    producer: Option<JoinHandle<ReadStats>>,
}

/// What the producer saw while reading
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    pub lines: u64,
    pub errors: u64,
}

impl LineSource {
    /// Start reading lines from `reader`
    pub fn spawn<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        debug!("LineSource::spawn: called");
        let (tx, rx) = mpsc::channel(1);
        let producer = tokio::spawn(read_lines(BufReader::new(reader), tx));
        Self {
            rx,
            producer: Some(producer),
        }
    }

    /// A source over lines already in memory
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let (tx, rx) = mpsc::channel(1);
        let lines = lines.into_iter().map(Into::into).collect::<Vec<OsString>>();
        let producer = tokio::spawn(async move {
            let mut stats = ReadStats::default();
            for line in lines {
                if tx.send(line).await.is_err() {
                    break;
                }
                stats.lines += 1;
            }
            stats
        });
        Self {
            rx,
            producer: Some(producer),
        }
    }

    /// Next line, or `None` once the input is exhausted
    pub async fn next_line(&mut self) -> Option<OsString> {
        self.rx.recv().await
    }

    /// Wait for the producer to finish and report what it read
    pub async fn finish(mut self) -> ReadStats {
        self.rx.close();
        match self.producer.take() {
            Some(producer) => producer.await.unwrap_or_default(),
            None => ReadStats::default(),
        }
    }
}

impl Drop for LineSource {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

async fn read_lines<R>(mut reader: BufReader<R>, tx: mpsc::Sender<OsString>) -> ReadStats
where
    R: AsyncRead + Unpin,
{
    let mut stats = ReadStats::default();
    let mut consecutive_errors = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                debug!(lines = stats.lines, "read_lines: end of input");
                break;
            }
            Ok(_) => {
                consecutive_errors = 0;
                stats.lines += 1;
                if tx.send(strip_terminator(&buf)).await.is_err() {
                    debug!("read_lines: receiver closed, stopping");
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                stats.errors += 1;
                consecutive_errors += 1;
                let e = InputError::Io(e);
                warn!(error = %e, "read_lines: input read error, continuing");
                if consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                    warn!(consecutive_errors, "read_lines: giving up on input");
                    break;
                }
            }
        }
    }

    stats
}

fn strip_terminator(buf: &[u8]) -> OsString {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    OsString::from_vec(line.to_vec())
}

/// Refuse to read work lines from an interactive terminal
pub fn ensure_redirected(is_terminal: bool) -> Result<(), ConfigError> {
    if is_terminal {
        return Err(ConfigError::InteractiveInput);
    }
    Ok(())
}
