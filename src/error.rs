//! Error taxonomy for the menu-button-rectangle discovery pipeline.
//!
//! Follows the teacher crate's `Error { location, details }` split rather than a generic
//! per-application error type: this core has exactly one application, so there is no need for
//! the teacher's `AppDetails`-generic indirection.

use std::fmt;
use std::path::PathBuf;

/// Where in the pipeline an [`Error`] was raised.
///
/// `location` is a byte offset for demux/SPU errors, a pixel offset for bitmap errors, or `0`
/// when the error has no meaningful offset (e.g. a schema violation).
#[derive(Debug)]
pub struct Error {
    /// Offset (byte or pixel, depending on `details`) where the error was detected.
    pub location: usize,
    /// What went wrong.
    pub details: ErrorDetails,
}

/// [`std::result::Result`] alias that uses [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Closed taxonomy of everything that can go wrong, per §7 of the specification.
#[derive(Debug)]
pub enum ErrorDetails {
    /// A [`crate::slice_reader::SliceReader`] read past the end of its slice.
    PacketOverrun(usize),
    /// The VOB's PS structure is corrupt beyond recovery (no pack/PES start codes found at all).
    MalformedInput(String),
    /// An SPU packet lacks the menu flag, display rectangle, or bitmap field offsets.
    UnsupportedPacket(String),
    /// The RLE bitstream could not be decoded.
    DecodeFailure(String),
    /// Clustering produced zero rectangles for a packet that should have had buttons.
    ClusterUnderflow,
    /// An external frame-sampling or OCR capability failed or timed out.
    ToolFailure {
        /// Identifies which menu the failing call was servicing.
        menu_id: String,
        /// Human-readable cause.
        message: String,
    },
    /// An internal invariant was violated (e.g. an output path escaped the stage directory).
    InvariantViolation(String),
    /// The nav-stage input mapping failed schema validation.
    SchemaViolation(String),
    /// Wraps an [`std::io::Error`] encountered while reading or writing stage artifacts.
    Io(String),
}

impl Error {
    /// Construct an error with no meaningful location (schema/tool/invariant failures).
    pub fn new(details: ErrorDetails) -> Self {
        Self {
            location: 0,
            details,
        }
    }

    /// Construct an error at a specific byte/pixel offset.
    pub fn at(location: usize, details: ErrorDetails) -> Self {
        Self { location, details }
    }

    /// True for errors that §7 classifies as locally recoverable (skip the offending unit and
    /// continue), as opposed to menu-level or fatal errors.
    pub fn is_locally_recoverable(&self) -> bool {
        matches!(
            self.details,
            ErrorDetails::PacketOverrun(_)
                | ErrorDetails::UnsupportedPacket(_)
                | ErrorDetails::DecodeFailure(_)
                | ErrorDetails::ClusterUnderflow
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            ErrorDetails::PacketOverrun(len) => {
                write!(f, "read of {len} bytes overran packet at offset {}", self.location)
            }
            ErrorDetails::MalformedInput(msg) => write!(f, "malformed input: {msg}"),
            ErrorDetails::UnsupportedPacket(msg) => write!(f, "unsupported SPU packet: {msg}"),
            ErrorDetails::DecodeFailure(msg) => {
                write!(f, "RLE decode failure at pixel {}: {msg}", self.location)
            }
            ErrorDetails::ClusterUnderflow => write!(f, "clustering produced zero rectangles"),
            ErrorDetails::ToolFailure { menu_id, message } => {
                write!(f, "external tool failure for menu {menu_id}: {message}")
            }
            ErrorDetails::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
            ErrorDetails::SchemaViolation(msg) => write!(f, "schema violation: {msg}"),
            ErrorDetails::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new(ErrorDetails::Io(e.to_string()))
    }
}

/// Raised when the emitter would write outside the stage output directory.
pub fn path_escape(path: &PathBuf, out_dir: &PathBuf) -> Error {
    Error::new(ErrorDetails::InvariantViolation(format!(
        "{} escapes stage output directory {}",
        path.display(),
        out_dir.display()
    )))
}
