//! # Windows security descriptors for Rust
//!
//! Pure codecs for the binary structures Windows uses to describe who may do
//! what to a securable object. Nothing here calls the operating system: every
//! type decodes from and encodes to byte buffers, bit-exact with the published
//! formats.
//!
//! The crate provides:
//! - [`Sid`], [`ConstSid`] and [`SidIdentifierAuthority`]: security identifiers,
//!   with their `S-1-…` text form; [`well_known`] holds the common ones.
//! - [`Guid`]: object type identifiers used by object ACEs.
//! - [`Bitset`] and [`AccessMask`]: flag words that can name their bits through
//!   a [`Meaning`] table (see [`meaning`]).
//! - [`ClaimAttribute`]: claim security attributes.
//! - [`expression`]: conditional expressions (`artx` bytecode) of callback ACEs.
//! - [`Ace`], [`Acl`] and [`SecurityDescriptor`]: the access control model itself.
//! - [`external`]: traits through which callers plug in descriptor sources,
//!   sinks and SID name resolution.
//!
//! ## Examples
//! ### Build, encode and decode a descriptor
//! ```rust
//! use win_security_descriptor::{SecurityDescriptor, Sid, meaning::rights, well_known};
//!
//! let owner: Sid = "S-1-5-21-3623811015-3361044348-30300820-500".parse().unwrap();
//! let mut sd = SecurityDescriptor::new().with_owner(owner);
//! sd.add_allowed(well_known::BUILTIN_USERS, rights::GENERIC_READ);
//! sd.add_denied(well_known::BUILTIN_GUESTS, rights::GENERIC_ALL);
//!
//! let bytes = sd.to_bytes().unwrap();
//! let decoded = SecurityDescriptor::from_bytes(&bytes).unwrap();
//! let first = &decoded.dacl().unwrap().entries()[0];
//! assert_eq!(first.sid().unwrap(), &well_known::BUILTIN_GUESTS);
//! ```
//!
//! ### Guard an ACE with a condition
//! ```rust
//! use win_security_descriptor::{Ace, AceType, expression::*, well_known};
//!
//! let condition = ConditionalExpression::new(Operator::binary_relational(
//!     BinaryRelationalOp::Equals,
//!     Operator::user("Department"),
//!     Operator::string("Finance"),
//! ).unwrap());
//! let ace = Ace::allowed_if(well_known::AUTHENTICATED_USERS, 0x0012_0089u32, condition);
//! assert_eq!(ace.ace_type(), AceType::ACCESS_ALLOWED_CALLBACK);
//! assert_eq!(Ace::from_bytes(&ace.to_bytes().unwrap()).unwrap(), ace);
//! ```
//!
//! ## Logging
//! Decoders emit [`tracing`] events (`debug` for descriptor, ACL and unknown ACE
//! decoding, `trace` for each expression token). No subscriber is installed.
//!
//! ## Features
//! - `std` (default): standard library support in the dependencies.
//! - `serde`: `Serialize`/`Deserialize` for every model type.
//! - `macro`: the `sid!` and `guid!` compile-time literals.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]

mod error;
pub use error::{SecurityError, SecurityResult};

mod codec;

mod bitset;
pub use bitset::{AccessMask, Bitset, Meaning};
pub mod meaning;

mod sid_identifier_authority;
/// Identifier authority component of a SID (6-byte value).
///
/// See also: [`Sid::identifier_authority`], [`ConstSid::identifier_authority`].
pub use sid_identifier_authority::SidIdentifierAuthority;

#[cfg(test)]
pub(crate) use sid_identifier_authority::test::arb_identifier_authority;

mod sid;
pub use sid::{MAX_SUBAUTHORITY_COUNT, SID_HEAD_SIZE, Sid};

mod const_sid;
/// Const-friendly fixed-size SID (`N` sub-authorities).
///
/// See [`ConstSid`] for invariants and examples.
pub use const_sid::ConstSid;
pub mod well_known;

mod guid;
pub use guid::Guid;

mod claim;
pub use claim::{ClaimAttribute, ClaimFlags, ClaimValue, ClaimValueType, Fqbn};

pub mod expression;

mod ace;
pub use ace::{
    Ace, AceBuilder, AceFlags, AcePayload, AceShape, AceType, ApplicationData, BasicAce,
    DataKind, ObjectAce, ObjectAceFlags,
};

mod acl;
pub use acl::Acl;

mod security_descriptor;
pub use security_descriptor::{ControlFlags, SecurityDescriptor};

pub mod external;

#[cfg(feature = "serde")]
mod serde_impl;

/// Compile-time SID literal.
///
/// ```rust
/// # use win_security_descriptor::{sid, ConstSid};
/// const ADMINS: ConstSid<2> = sid!("S-1-5-32-544");
/// assert_eq!(ADMINS.to_string(), "S-1-5-32-544");
/// ```
#[cfg(feature = "macro")]
pub use descriptor_macro::sid;

/// Compile-time GUID literal.
///
/// ```rust
/// # use win_security_descriptor::{guid, Guid};
/// const USER_CLASS: Guid = guid!("bf967aba-0de6-11d0-a285-00aa003049e2");
/// assert_eq!(USER_CLASS.as_bytes()[0], 0xba);
/// ```
#[cfg(feature = "macro")]
pub use descriptor_macro::guid;
