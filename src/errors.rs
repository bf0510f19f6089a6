#[derive(Debug)]
pub enum Errors {
    SnapshotNotFound(String),
    SnapshotReadError(String),
    SnapshotDecodeError(String),
    SnapshotEncodeError(String),
    SnapshotWriteError(String),
    SocketBindError(String),
    SocketSendError(String),
    HttpServeError(String),
    EmptyPayload,
    UnknownCommand(String),
    BadArgument(String),
}

impl std::fmt::Display for Errors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Errors::SnapshotNotFound(msg) => write!(f, "Snapshot Not Found: {}", msg),
            Errors::SnapshotReadError(msg) => write!(f, "Snapshot Read Error: {}", msg),
            Errors::SnapshotDecodeError(msg) => write!(f, "Snapshot Decode Error: {}", msg),
            Errors::SnapshotEncodeError(msg) => write!(f, "Snapshot Encode Error: {}", msg),
            Errors::SnapshotWriteError(msg) => write!(f, "Snapshot Write Error: {}", msg),
            Errors::SocketBindError(msg) => write!(f, "Socket Bind Error: {}", msg),
            Errors::SocketSendError(msg) => write!(f, "Socket Send Error: {}", msg),
            Errors::HttpServeError(msg) => write!(f, "HTTP Serve Error: {}", msg),
            Errors::EmptyPayload => write!(f, "Empty Payload"),
            Errors::UnknownCommand(msg) => write!(f, "Unknown Command: {}", msg),
            Errors::BadArgument(msg) => write!(f, "Bad Argument: {}", msg),
        }
    }
}

impl std::error::Error for Errors {}

pub type Result<T> = std::result::Result<T, Errors>;
