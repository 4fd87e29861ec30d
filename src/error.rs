use parsing::{InvalidGuidFormat, InvalidSidFormat};
use thiserror::Error;

/// Result alias used across the crate.
pub type SecurityResult<T> = Result<T, SecurityError>;

/// Every way building, decoding or encoding the security model can fail.
///
/// Failures are permanent for a given input: a malformed sub-structure aborts
/// the decode of everything that contains it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SecurityError {
    /// A SID string or binary blob does not follow the SID layout.
    #[error("malformed security identifier")]
    MalformedSid,
    /// A GUID string or binary blob does not follow the GUID layout.
    #[error("malformed GUID")]
    MalformedGuid,
    /// A named bit is not part of the meaning table in use.
    #[error("`{name}` is not a bit of the `{table}` meaning table")]
    InvalidMeaning {
        /// Meaning table that was consulted.
        table: &'static str,
        /// The unknown bit name.
        name: String,
    },
    /// A buffer ended before a fixed-size field could be read.
    #[error("truncated {what}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Structure being decoded.
        what: &'static str,
        /// Bytes required.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },
    /// An ACE header declares more bytes than the buffer holds.
    #[error("ACE declares {declared} bytes but only {available} remain")]
    TruncatedAce {
        /// `AceSize` from the header.
        declared: u16,
        /// Bytes left in the buffer.
        available: usize,
    },
    /// A length field is zero, too small or too large for its structure.
    #[error("invalid {what} size {size}")]
    InvalidSize {
        /// Structure whose size is wrong.
        what: &'static str,
        /// The offending size.
        size: usize,
    },
    /// A structure carries a revision this codec does not speak.
    #[error("unsupported {what} revision {revision}")]
    InvalidRevision {
        /// Structure being decoded.
        what: &'static str,
        /// The revision byte found.
        revision: u8,
    },
    /// A claim value does not match the attribute's declared value type.
    #[error("claim value type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Declared value type.
        expected: &'static str,
        /// Value type actually supplied.
        found: &'static str,
    },
    /// A single-valued claim carries more (or fewer) than one value.
    #[error("resource attribute must carry exactly one value, found {count}")]
    TooManyValues {
        /// Number of values found.
        count: usize,
    },
    /// A UTF-16 string is not valid or not terminated.
    #[error("invalid UTF-16 string")]
    InvalidUtf16,
    /// A conditional-expression operator received an operand of the wrong kind.
    #[error("operator `{operator}` does not accept a {operand} operand")]
    InvalidOperandType {
        /// Operator being built.
        operator: &'static str,
        /// Kind of the rejected operand.
        operand: &'static str,
    },
    /// A conditional-expression token stream does not reduce to one expression.
    #[error("malformed conditional expression: {0}")]
    MalformedExpression(&'static str),
    /// A conditional-expression byte is not a known token.
    #[error("unknown conditional expression token 0x{0:02x}")]
    UnknownToken(u8),
    /// An ACE payload shape does not belong to the ACE type code.
    #[error("payload shape does not match ACE type 0x{ace_type:02x}")]
    PayloadShape {
        /// The ACE type code.
        ace_type: u8,
    },
    /// A security descriptor is too short to hold its control word.
    #[error("security descriptor is too short to hold its control field")]
    MissingControl,
    /// A security descriptor in absolute (pointer-based) form.
    #[error("security descriptor is not in self-relative form")]
    NotSelfRelative,
    /// A fixed-layout structure could not be read or written.
    #[error("malformed {0}")]
    MalformedRecord(&'static str),
    /// An object is encoded before all of its mandatory parts were supplied.
    #[error("{0} is missing before encoding")]
    Uninitialized(&'static str),
}

impl From<InvalidSidFormat> for SecurityError {
    #[inline]
    fn from(_: InvalidSidFormat) -> Self {
        Self::MalformedSid
    }
}

impl From<InvalidGuidFormat> for SecurityError {
    #[inline]
    fn from(_: InvalidGuidFormat) -> Self {
        Self::MalformedGuid
    }
}
