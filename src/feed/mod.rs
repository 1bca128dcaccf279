// Snapshot push channel
//
// The server pushes snapshot JSON over a WebSocket whenever it receives a
// request string: an empty string asks for a refresh, a member address asks
// for that member's view. Connecting and the handshake run on a worker
// thread; requests made meanwhile are held and sent once the socket is
// handed back. The socket is non-blocking so the UI loop can drain it once
// per tick.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use tungstenite::{Error as WsError, Message, WebSocket};

/// Outbound request sent on the push channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRequest {
    /// Ask for a fresh snapshot of the whole cluster
    Refresh,
    /// Ask for the snapshot as seen by the member at this address
    Member(String),
}

impl FeedRequest {
    pub fn payload(&self) -> &str {
        match self {
            FeedRequest::Refresh => "",
            FeedRequest::Member(address) => address,
        }
    }
}

/// Inbound traffic and lifecycle changes observed while polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The channel finished opening and held requests were sent
    Opened,
    /// Text payload, expected to be a snapshot
    Message(String),
    /// The server closed the channel
    Closed,
    /// Transport or connect fault; the channel has been dropped
    Error(String),
}

/// Result of a successful send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Sent on an already open channel
    Sent,
    /// The channel is opening; the request goes out once it is open
    Queued,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("cannot resolve feed server {0}")]
    Resolve(String),

    #[error("cannot connect to {server}: {source}")]
    Connect {
        server: String,
        #[source]
        source: io::Error,
    },

    #[error("websocket handshake with {url} failed: {reason}")]
    Handshake { url: String, reason: String },

    #[error("connect worker for {0} exited without a result")]
    Worker(String),

    #[error("websocket error: {0}")]
    Socket(#[from] WsError),

    #[error("socket setup failed: {0}")]
    Io(#[from] io::Error),
}

/// Bidirectional snapshot channel
pub trait SnapshotFeed {
    /// Send a request, starting to open the channel first if it is closed
    ///
    /// Never blocks; a closed channel reports the connect result through a
    /// later [`poll`](SnapshotFeed::poll).
    fn send(&mut self, request: &FeedRequest) -> Result<SendOutcome, FeedError>;

    /// Drain everything received since the last poll without blocking
    fn poll(&mut self) -> Vec<FeedEvent>;

    fn is_open(&self) -> bool;
}

type Handshake = Result<WebSocket<TcpStream>, FeedError>;

/// WebSocket implementation of [`SnapshotFeed`]
pub struct WsFeed {
    server: String,
    url: String,
    connect_timeout: Duration,
    socket: Option<WebSocket<TcpStream>>,
    /// Result of the in-flight connect, if any
    connecting: Option<Receiver<Handshake>>,
    /// Requests held until the channel is open
    pending: Vec<FeedRequest>,
}

impl WsFeed {
    /// Create a closed feed for `ws://{server}{path}`
    pub fn new(server: &str, path: &str, connect_timeout: Duration) -> Self {
        Self {
            server: server.to_string(),
            url: format!("ws://{}{}", server, path),
            connect_timeout,
            socket: None,
            connecting: None,
            pending: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn start_connect(&mut self) -> Result<(), FeedError> {
        let (tx, rx) = mpsc::channel();
        let server = self.server.clone();
        let url = self.url.clone();
        let timeout = self.connect_timeout;

        thread::Builder::new()
            .name("feed-connect".to_string())
            .spawn(move || {
                // The feed may be gone by the time the handshake finishes
                let _ = tx.send(open_socket(&server, &url, timeout));
            })?;

        debug!(url = %self.url, "Feed connect started");
        self.connecting = Some(rx);
        Ok(())
    }

    /// Collect the worker's result, sending held requests on success
    fn poll_connect(&mut self, events: &mut Vec<FeedEvent>) {
        let Some(receiver) = self.connecting.as_ref() else {
            return;
        };
        let handshake = match receiver.try_recv() {
            Ok(handshake) => handshake,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(FeedError::Worker(self.url.clone())),
        };
        self.connecting = None;

        let mut socket = match handshake {
            Ok(socket) => socket,
            Err(error) => {
                warn!(url = %self.url, %error, "Feed connect failed");
                self.pending.clear();
                events.push(FeedEvent::Error(error.to_string()));
                return;
            }
        };

        info!(url = %self.url, held = self.pending.len(), "Feed connected");
        events.push(FeedEvent::Opened);
        for request in self.pending.drain(..) {
            if let Err(error) = write_request(&mut socket, &request) {
                warn!(url = %self.url, %error, "Feed send failed");
                events.push(FeedEvent::Error(error.to_string()));
                return;
            }
        }
        self.socket = Some(socket);
    }

    fn drop_socket(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None);
        }
    }
}

/// Resolve, connect and handshake, each bounded by `timeout`
///
/// Blocking; runs on the connect worker.
fn open_socket(server: &str, url: &str, timeout: Duration) -> Handshake {
    let addr = server
        .to_socket_addrs()
        .map_err(|source| FeedError::Connect {
            server: server.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| FeedError::Resolve(server.to_string()))?;

    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|source| {
        FeedError::Connect {
            server: server.to_string(),
            source,
        }
    })?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let (socket, _response) =
        tungstenite::client(url, stream).map_err(|error| FeedError::Handshake {
            url: url.to_string(),
            reason: error.to_string(),
        })?;

    socket.get_ref().set_read_timeout(None)?;
    socket.get_ref().set_write_timeout(None)?;
    socket.get_ref().set_nonblocking(true)?;
    Ok(socket)
}

/// Write one request; a full write buffer is flushed on a later poll
fn write_request(
    socket: &mut WebSocket<TcpStream>,
    request: &FeedRequest,
) -> Result<(), WsError> {
    match socket.send(Message::text(request.payload().to_string())) {
        Ok(()) => Ok(()),
        Err(WsError::Io(error)) if error.kind() == io::ErrorKind::WouldBlock => Ok(()),
        Err(error) => Err(error),
    }
}

impl SnapshotFeed for WsFeed {
    fn send(&mut self, request: &FeedRequest) -> Result<SendOutcome, FeedError> {
        let Some(socket) = self.socket.as_mut() else {
            if self.connecting.is_none() {
                self.start_connect()?;
            }
            if self.pending.last() != Some(request) {
                self.pending.push(request.clone());
            }
            return Ok(SendOutcome::Queued);
        };

        match write_request(socket, request) {
            Ok(()) => Ok(SendOutcome::Sent),
            Err(error) => {
                warn!(url = %self.url, %error, "Feed send failed");
                self.socket = None;
                Err(FeedError::Socket(error))
            }
        }
    }

    fn poll(&mut self) -> Vec<FeedEvent> {
        let mut events = Vec::new();
        self.poll_connect(&mut events);
        let Some(socket) = self.socket.as_mut() else {
            return events;
        };

        let mut lost = false;
        match socket.flush() {
            Ok(()) => {}
            Err(WsError::Io(error)) if error.kind() == io::ErrorKind::WouldBlock => {}
            Err(error) => {
                warn!(url = %self.url, %error, "Feed flush failed");
                events.push(FeedEvent::Error(error.to_string()));
                lost = true;
            }
        }

        while !lost {
            match socket.read() {
                Ok(Message::Text(text)) => {
                    events.push(FeedEvent::Message(text.as_str().to_string()))
                }
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => events.push(FeedEvent::Message(text.to_string())),
                    Err(error) => warn!(%error, "Ignoring non UTF-8 binary frame"),
                },
                Ok(Message::Close(_)) => {
                    info!(url = %self.url, "Feed closed by server");
                    events.push(FeedEvent::Closed);
                    lost = true;
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(WsError::Io(error)) if error.kind() == io::ErrorKind::WouldBlock => break,
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                    info!(url = %self.url, "Feed connection closed");
                    events.push(FeedEvent::Closed);
                    lost = true;
                }
                Err(error) => {
                    warn!(url = %self.url, %error, "Feed read failed");
                    events.push(FeedEvent::Error(error.to_string()));
                    lost = true;
                }
            }
        }

        if lost {
            self.drop_socket();
        }
        events
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }
}
