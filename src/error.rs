//! Error types for KNX encode/decode operations.
//!
//! Errors are split into two categories, each wrapping a small struct that
//! carries the error kind and (with the `std` feature) a backtrace:
//!
//! - [`AddressingError`] - textual address could not be parsed
//! - [`CodecError`] - a binary structure could not be packed or unpacked
//!
//! Callers that only care about the failure class can use [`KnxError::kind`].

use core::fmt;

#[cfg(feature = "std")]
use std::backtrace::Backtrace;

/// Result type alias for KNX operations.
pub type Result<T> = core::result::Result<T, KnxError>;

// =============================================================================
// Error Kinds
// =============================================================================

/// Flat classification of every error this crate produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Malformed or out-of-range individual address text
    InvalidIndividualAddress,
    /// Malformed, out-of-range or reserved group address text
    InvalidGroupAddress,
    /// Buffer shorter than a fixed or declared size
    InvalidLength,
    /// Must-be-zero bits are populated
    BadReservedBits,
    /// Declared structure length disagrees with the decoded size
    StructureLengthMismatch,
    /// Unknown discriminator code (message code, selector kind)
    UnsupportedCode,
    /// Output buffer too small for the encoded structure
    BufferTooSmall,
    /// Structure does not fit its 1-byte length field
    PayloadTooLarge,
}

// =============================================================================
// Main Error Type
// =============================================================================

/// KNX codec error.
///
/// This is the error type returned by every fallible operation of the crate.
#[derive(Debug)]
pub enum KnxError {
    /// Address parsing errors
    Addressing(AddressingError),
    /// Binary encode/decode errors
    Codec(CodecError),
}

/// Address parsing error with optional backtrace
#[derive(Debug)]
pub struct AddressingError {
    kind: ErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl AddressingError {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Get the error kind
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Backtrace captured when the error was created
    #[cfg(feature = "std")]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

/// Encode/decode error with optional backtrace
#[derive(Debug)]
pub struct CodecError {
    kind: ErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl CodecError {
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Get the error kind
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Backtrace captured when the error was created
    #[cfg(feature = "std")]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

// =============================================================================
// Convenience Constructors and Predicates
// =============================================================================

impl KnxError {
    // Addressing errors
    pub(crate) fn invalid_individual_address() -> Self {
        Self::Addressing(AddressingError::new(ErrorKind::InvalidIndividualAddress))
    }

    pub(crate) fn invalid_group_address() -> Self {
        Self::Addressing(AddressingError::new(ErrorKind::InvalidGroupAddress))
    }

    // Codec errors
    pub(crate) fn invalid_length() -> Self {
        Self::Codec(CodecError::new(ErrorKind::InvalidLength))
    }

    pub(crate) fn bad_reserved_bits() -> Self {
        Self::Codec(CodecError::new(ErrorKind::BadReservedBits))
    }

    pub(crate) fn structure_length_mismatch() -> Self {
        Self::Codec(CodecError::new(ErrorKind::StructureLengthMismatch))
    }

    pub(crate) fn unsupported_code() -> Self {
        Self::Codec(CodecError::new(ErrorKind::UnsupportedCode))
    }

    pub(crate) fn buffer_too_small() -> Self {
        Self::Codec(CodecError::new(ErrorKind::BufferTooSmall))
    }

    pub(crate) fn payload_too_large() -> Self {
        Self::Codec(CodecError::new(ErrorKind::PayloadTooLarge))
    }

    /// Get the flat error kind
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Addressing(e) => e.kind,
            Self::Codec(e) => e.kind,
        }
    }

    /// Check if this is an address parse error (individual or group)
    pub const fn is_parse_error(&self) -> bool {
        matches!(self, Self::Addressing(_))
    }

    /// Check if a buffer was shorter than required
    pub const fn is_invalid_length(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidLength)
    }

    /// Check if must-be-zero bits were populated
    pub const fn is_bad_reserved_bits(&self) -> bool {
        matches!(self.kind(), ErrorKind::BadReservedBits)
    }

    /// Check if a declared structure length was inconsistent
    pub const fn is_structure_length_mismatch(&self) -> bool {
        matches!(self.kind(), ErrorKind::StructureLengthMismatch)
    }

    /// Check if a discriminator code was not recognised
    pub const fn is_unsupported_code(&self) -> bool {
        matches!(self.kind(), ErrorKind::UnsupportedCode)
    }

    /// Check if the output buffer was too small
    pub const fn is_buffer_too_small(&self) -> bool {
        matches!(self.kind(), ErrorKind::BufferTooSmall)
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::InvalidIndividualAddress => "invalid individual address",
            ErrorKind::InvalidGroupAddress => "invalid group address",
            ErrorKind::InvalidLength => "buffer shorter than structure",
            ErrorKind::BadReservedBits => "reserved bits are set",
            ErrorKind::StructureLengthMismatch => "structure length mismatch",
            ErrorKind::UnsupportedCode => "unsupported code",
            ErrorKind::BufferTooSmall => "buffer too small",
            ErrorKind::PayloadTooLarge => "payload too large",
        };
        f.write_str(text)
    }
}

impl fmt::Display for KnxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnxError::Addressing(e) => write!(f, "Addressing error: {}", e.kind),
            KnxError::Codec(e) => write!(f, "Codec error: {}", e.kind),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for KnxError {
    fn format(&self, f: defmt::Formatter<'_>) {
        match self {
            KnxError::Addressing(e) => defmt::write!(f, "Addressing error: {}", e.kind),
            KnxError::Codec(e) => defmt::write!(f, "Codec error: {}", e.kind),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KnxError {}

// =============================================================================
// Descriptor Scan Error
// =============================================================================

/// Failure of a descriptor block scan.
///
/// `consumed` is the offset of the block that failed, i.e. the number of bytes
/// of well-formed blocks in front of it.
#[derive(Debug)]
pub struct ScanError {
    /// Bytes consumed before the failing block
    pub consumed: usize,
    /// Why the block was rejected
    pub error: KnxError,
}

impl ScanError {
    pub(crate) const fn new(consumed: usize, error: KnxError) -> Self {
        Self { consumed, error }
    }
}

impl From<ScanError> for KnxError {
    fn from(err: ScanError) -> Self {
        err.error
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.error, self.consumed)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ScanError {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "{} at offset {}", self.error, self.consumed)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_predicates() {
        let err = KnxError::structure_length_mismatch();
        assert_eq!(err.kind(), ErrorKind::StructureLengthMismatch);
        assert!(err.is_structure_length_mismatch());
        assert!(!err.is_parse_error());

        let err = KnxError::invalid_group_address();
        assert!(err.is_parse_error());
        assert_eq!(err.kind(), ErrorKind::InvalidGroupAddress);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            KnxError::invalid_length().to_string(),
            "Codec error: buffer shorter than structure"
        );
        assert_eq!(
            KnxError::invalid_individual_address().to_string(),
            "Addressing error: invalid individual address"
        );
    }

    #[test]
    fn test_scan_error() {
        let err = ScanError::new(54, KnxError::structure_length_mismatch());
        assert_eq!(err.to_string(), "Codec error: structure length mismatch at offset 54");
        let err: KnxError = err.into();
        assert!(err.is_structure_length_mismatch());
    }
}
