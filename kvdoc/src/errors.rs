use backtrace::Backtrace;
use parking_lot::Mutex;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for document store operations.
///
/// Every failure surfaced by the engine carries exactly one kind, so callers can
/// branch on the category without parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use kvdoc::errors::{ErrorKind, KvDocError, KvDocResult};
///
/// fn example() -> KvDocResult<()> {
///     Err(KvDocError::new("document not found", ErrorKind::NotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// A bucket, document or index target is missing on a read/update/delete path
    NotFound,
    /// The filter tree is malformed or uses an unsupported combination
    InvalidQuery,
    /// The output argument of a multi-result call has the wrong shape
    InvalidResultTarget,
    /// A document could not be encoded or decoded
    SerializationError,
    /// The underlying key-value store failed
    BackendError,
    /// A transaction, or a handle bound to it, was used after it finished
    TransactionClosed,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::InvalidQuery => write!(f, "Invalid query"),
            ErrorKind::InvalidResultTarget => write!(f, "Invalid result target"),
            ErrorKind::SerializationError => write!(f, "Serialization error"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::TransactionClosed => write!(f, "Transaction closed"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type of the document store.
///
/// `KvDocError` carries a message, an [ErrorKind] and an optional cause, which
/// makes it possible to wrap a key-value store failure with the name of the engine
/// operation that triggered it while keeping the original error around.
///
/// The backtrace is captured unresolved and symbolized only when the error is
/// printed with `{:?}`.
///
/// # Examples
///
/// ```rust,ignore
/// use kvdoc::errors::{ErrorKind, KvDocError};
///
/// let cause = KvDocError::new("disk unavailable", ErrorKind::BackendError);
/// let err = KvDocError::new_with_cause("insert failed", ErrorKind::BackendError, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct KvDocError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<KvDocError>>,
    backtrace: Arc<Mutex<Backtrace>>,
}

impl KvDocError {
    /// Creates a new `KvDocError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        KvDocError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// Creates a new `KvDocError` that wraps `cause`.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    /// * `cause` - The underlying error that caused this error
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: KvDocError) -> Self {
        KvDocError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// Wraps this error with the name of the operation it failed in.
    ///
    /// The kind is preserved, so callers can still match on it.
    pub fn in_operation(self, operation: &str) -> Self {
        let message = format!("{}: {}", operation, self.message);
        let kind = self.error_kind.clone();
        KvDocError::new_with_cause(&message, kind, self)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&KvDocError> {
        self.cause.as_deref()
    }
}

impl Display for KvDocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for KvDocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => {
                let mut backtrace = self.backtrace.lock();
                backtrace.resolve();
                write!(f, "{}\n{:?}", self.message, *backtrace)
            }
        }
    }
}

impl Error for KvDocError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for document store operations.
pub type KvDocResult<T> = Result<T, KvDocError>;

impl de::Error for KvDocError {
    fn custom<T: Display>(msg: T) -> Self {
        KvDocError::new(&msg.to_string(), ErrorKind::SerializationError)
    }
}

impl ser::Error for KvDocError {
    fn custom<T: Display>(msg: T) -> Self {
        KvDocError::new(&msg.to_string(), ErrorKind::SerializationError)
    }
}

impl From<serde_json::Error> for KvDocError {
    fn from(err: serde_json::Error) -> Self {
        KvDocError::new(
            &format!("JSON error: {}", err),
            ErrorKind::SerializationError,
        )
    }
}

impl From<std::io::Error> for KvDocError {
    fn from(err: std::io::Error) -> Self {
        KvDocError::new(&format!("IO error: {}", err), ErrorKind::BackendError)
    }
}

impl From<std::string::FromUtf8Error> for KvDocError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        KvDocError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::SerializationError,
        )
    }
}

impl From<String> for KvDocError {
    fn from(msg: String) -> Self {
        KvDocError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for KvDocError {
    fn from(msg: &str) -> Self {
        KvDocError::new(msg, ErrorKind::InternalError)
    }
}
