#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- transport errors ------------------------------------------
    #[error("backend connection error: {0}")]
    Transport(#[from] std::io::Error),
    #[error("malformed backend message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend closed the connection")]
    ConnectionClosed,
    #[error("protocol handshake failed: {0}")]
    Handshake(String),

    // --------------------------------- backend errors --------------------------------------------
    #[error("{0}")]
    Backend(String),
    #[error("Process {pid} has exited with status {status}")]
    ProcessExited { pid: i64, status: i64 },

    // --------------------------------- session state errors --------------------------------------
    #[error("process is not running")]
    NoProcess,
    #[error("no goroutine selected")]
    NoSelectedGoroutine,
    #[error("location not found")]
    NoLocation,
    #[error("empty stacktrace")]
    EmptyStacktrace,

    // --------------------------------- input errors ----------------------------------------------
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("could not find call {0}")]
    CallNotFound(String),
    #[error("build failed: {0}")]
    Build(String),
    #[error("hook: {0}")]
    Hook(anyhow::Error),

    // --------------------------------- batch errors ----------------------------------------------
    #[error("{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n"))]
    MultipleErrors(Vec<Error>),
}

impl Error {
    /// Return true if the session can't continue after this error.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Backend(_) => false,
            Error::ProcessExited { .. } => false,
            Error::NoProcess => false,
            Error::NoSelectedGoroutine => false,
            Error::NoLocation => false,
            Error::EmptyStacktrace => false,
            Error::InvalidArgument(_) => false,
            Error::CallNotFound(_) => false,
            Error::Build(_) => false,
            Error::Hook(_) => false,
            Error::MultipleErrors(errors) => errors.iter().any(|e| e.is_fatal()),

            // connection is lost or desynchronized
            Error::Transport(_) => true,
            Error::Decode(_) => true,
            Error::ConnectionClosed => true,
            Error::Handshake(_) => true,
        }
    }

    /// Return true if the backend reports that the target process is gone.
    pub fn is_process_exited(&self) -> bool {
        match self {
            Error::ProcessExited { .. } => true,
            Error::Backend(text) => text.contains("exited"),
            _ => false,
        }
    }

    /// Collapse a list of errors into a single one, `None` if the list is empty.
    pub fn from_batch(mut errors: Vec<Error>) -> Option<Error> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Error::MultipleErrors(errors)),
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "debugger", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "debugger", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
