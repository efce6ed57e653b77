//! Unix-socket [`InputSource`] implementation.
//!
//! Binds a Unix stream socket and serves one connection at a time.  Each
//! line received is parsed as a JSON-encoded [`InputEvent`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"Key":{"key":"right","modifiers":"SHIFT","time":1200}}
//! {"Key":{"key":"f3"}}
//! {"Key":{"key":"q","time":1201}}
//! {"Scroll":{"direction":"up","modifiers":"SHIFT"}}
//! ```

use crate::input::InputEvent;
use crate::traits::InputSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// An [`InputSource`] that listens on a Unix stream socket for
/// JSON-encoded input events.
///
/// A connection may send any number of events.  When it closes, the
/// listener waits for the next one.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What happened to a client connection.
enum Served {
    Disconnected,
    SinkClosed,
}

impl UnixSocketListener {
    /// Create a listener for `path`.
    ///
    /// The socket file is created when [`run`](InputSource::run) is called
    /// and removed once the sink goes away.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse one line of the wire format.  Blank lines yield `None`.
pub fn parse_line(text: &str) -> Result<Option<InputEvent>, UnixSocketError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(text)?))
}

fn serve(stream: UnixStream, sink: &mpsc::Sender<InputEvent>) -> Served {
    for line in BufReader::new(stream).lines() {
        let text = match line {
            Ok(text) => text,
            Err(e) => {
                error!("read error: {}", e);
                break;
            }
        };
        match parse_line(&text) {
            Ok(Some(event)) => {
                debug!("received {:?}", event);
                if sink.send(event).is_err() {
                    return Served::SinkClosed;
                }
            }
            Ok(None) => {}
            Err(e) => warn!("ignoring input {:?}: {}", text, e),
        }
    }
    Served::Disconnected
}

impl InputSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the sink is dropped.  Run it on a
    /// dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<InputEvent>) -> Result<(), Self::Error> {
        // A previous run may have left the file behind.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("accept error: {}", e);
                    continue;
                }
            };
            debug!("client connected");
            match serve(stream, &sink) {
                Served::Disconnected => debug!("client disconnected"),
                Served::SinkClosed => {
                    info!("input sink closed, shutting down");
                    let _ = std::fs::remove_file(&self.path);
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

//  Tests
