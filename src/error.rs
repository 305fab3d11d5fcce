//! Error types and result handling for Yomu operations.
//!
//! Internal operations return a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`. Public network entry points convert these
//! errors into [`Response`](crate::types::Response) values through
//! [`try_connect`](crate::connect::try_connect), so an [`Error`] never crosses
//! an adapter boundary on its own.
//!
//! # Error Categories
//!
//! - **Network Errors**: Connection issues and HTTP transport failures
//! - **Timeouts**: Requests that exceeded their deadline
//! - **Parse Errors**: Pages or documents missing a required structure
//! - **Source Errors**: Website-specific errors with context
//! - **Incompatible Source**: No registered adapter matches a URL
//! - **Invalid File**: A local file rejected by an importer
//! - **Archive / XML / Image Errors**: EPUB container and cover decoding failures
//!
//! # Examples
//!
//! ```rust
//! use yomu::error::{Error, Result};
//!
//! fn describe(result: Result<String>) -> String {
//!     match result {
//!         Ok(text) => text,
//!         Err(e) if e.is_timeout() => "try again later".to_string(),
//!         Err(Error::IncompatibleSource(url)) => format!("unsupported: {}", url),
//!         Err(e) => e.to_string(),
//!     }
//! }
//!
//! assert_eq!(describe(Err(Error::timeout("slow"))), "try again later");
//! ```

use thiserror::Error;

/// Type alias for Results with Yomu errors.
///
/// ```rust
/// use yomu::{Result, Error};
///
/// fn example_with_error() -> Result<()> {
///     Err(Error::parse("Missing chapter container"))
/// }
///
/// assert!(example_with_error().is_err());
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all Yomu operations.
///
/// # Variants
///
/// * [`Network`](Error::Network) - HTTP client and connection errors
/// * [`Timeout`](Error::Timeout) - Deadline exceeded while waiting on I/O
/// * [`Parse`](Error::Parse) - Data parsing and format errors
/// * [`Source`](Error::Source) - Source-specific errors with context
/// * [`IncompatibleSource`](Error::IncompatibleSource) - No adapter for a URL
/// * [`InvalidFile`](Error::InvalidFile) - Rejected local file
/// * [`MissingPermission`](Error::MissingPermission) - Storage access denied
/// * [`Io`](Error::Io), [`Json`](Error::Json), [`Image`](Error::Image),
///   [`Zip`](Error::Zip), [`Xml`](Error::Xml), [`Join`](Error::Join) - Wrapped library errors
/// * [`Other`](Error::Other) - Generic error messages
#[derive(Error, Debug)]
pub enum Error {
    /// Network-related errors from HTTP operations.
    ///
    /// Wraps errors from the underlying HTTP client (reqwest). A reqwest error
    /// may itself be a timeout, which [`Error::is_timeout`] recognises.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A request or read did not complete before its deadline.
    ///
    /// ```rust
    /// use yomu::Error;
    ///
    /// let error = Error::timeout("https://example.com/catalog after 30s");
    /// assert!(error.is_timeout());
    /// ```
    #[error("Timeout: {0}")]
    Timeout(String),

    /// HTML/XML parsing and data format errors.
    ///
    /// Used when a fetched page lacks an element the adapter cannot proceed
    /// without, such as the chapter content container.
    ///
    /// ```rust
    /// use yomu::Error;
    ///
    /// let error = Error::parse("Missing .chapter-content");
    /// ```
    #[error("Parse error: {0}")]
    Parse(String),

    /// Source-specific errors with contextual information.
    ///
    /// # Fields
    ///
    /// * `src` - The identifier of the source that encountered the error
    /// * `message` - Descriptive error message explaining what went wrong
    ///
    /// ```rust
    /// use yomu::Error;
    ///
    /// let error = Error::source("royal_road", "HTTP 503 Service Unavailable");
    /// ```
    #[error("Source error [{src}]: {message}")]
    Source { src: String, message: String },

    /// No registered source or database matches the given URL.
    #[error("Incompatible source\n\nCan't find compatible source for:\n{0}")]
    IncompatibleSource(String),

    /// A local file that an importer refused to open.
    ///
    /// ```rust
    /// use yomu::Error;
    ///
    /// let error = Error::invalid_file("notes.txt is not a valid epub");
    /// ```
    #[error("Extraction error: {0}")]
    InvalidFile(String),

    /// The storage collaborator denied access to a path.
    #[error("Missing permission: {0}")]
    MissingPermission(String),

    /// File system and IO operation errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization and deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decoding and encoding errors.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Errors reading the zip container of an EPUB.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Errors from the pull XML reader.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Join errors.
    ///
    /// This variant wraps errors from tokio tasks.
    #[error("Join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Generic error messages.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Creates a source-specific error with source ID and message.
    pub fn source(src: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Source {
            src: src.into(),
            message: msg.into(),
        }
    }

    /// Creates a timeout error with the given message.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Error::Timeout(msg.into())
    }

    /// Creates an invalid file error with the given message.
    pub fn invalid_file(msg: impl Into<String>) -> Self {
        Error::InvalidFile(msg.into())
    }

    /// Returns `true` for timeout-class failures.
    ///
    /// Both explicit [`Error::Timeout`] values and transport errors that
    /// reqwest reports as timeouts count. Callers use this to tell
    /// "try again" apart from "unsupported".
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Network(e) => e.is_timeout(),
            Error::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}
