//! Access control lists.
//!
//! ```text
//! revision:u8  sbz1:u8  size:u16  count:u16  sbz2:u16  ace[count]
//! ```

use binrw::binrw;
use delegate::delegate;
use tracing::debug;

use crate::ace::Ace;
use crate::codec::{Decode, Encode, Reader, Record, put_record, wire_u16};
use crate::{AccessMask, SecurityError, SecurityResult, Sid};

const HEADER_LEN: usize = 8;

/// An ordered list of ACEs.
///
/// The header is not stored: size and count come from the entries, and the
/// revision from their types.
///
/// # Examples
/// ```rust
/// # use win_security_descriptor::{Acl, AceType, well_known};
/// let mut acl = Acl::new();
/// acl.add_allowed(well_known::BUILTIN_USERS, 0x0012_0089u32);
/// acl.add_denied(well_known::WORLD, 0x0001_0000u32);
/// let types: Vec<_> = acl.iter().map(|ace| ace.ace_type()).collect();
/// assert_eq!(types, [AceType::ACCESS_DENIED, AceType::ACCESS_ALLOWED]);
/// assert_eq!(acl.revision(), Acl::REVISION);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Acl {
    entries: Vec<Ace>,
}

impl Acl {
    /// Revision of lists holding only non-object ACEs.
    pub const REVISION: u8 = 2;
    /// Revision of lists holding at least one object ACE.
    pub const REVISION_DS: u8 = 4;

    /// An empty list.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A list holding `entries` in order.
    #[must_use]
    #[inline]
    pub const fn from_entries(entries: Vec<Ace>) -> Self {
        Self { entries }
    }

    delegate! {
        to self.entries {
            /// Number of entries.
            #[must_use]
            #[inline]
            pub fn len(&self) -> usize;
            /// Whether the list holds no entry.
            #[must_use]
            #[inline]
            pub fn is_empty(&self) -> bool;
            /// Entries in order.
            #[inline]
            pub fn iter(&self) -> core::slice::Iter<'_, Ace>;
            /// Appends `ace` without reordering.
            #[inline]
            pub fn push(&mut self, ace: Ace);
        }
    }

    /// Entries in order.
    #[must_use]
    #[inline]
    pub fn entries(&self) -> &[Ace] {
        &self.entries
    }

    /// Unwraps the entries.
    #[must_use]
    #[inline]
    pub fn into_entries(self) -> Vec<Ace> {
        self.entries
    }

    /// [`Acl::REVISION_DS`] if any entry is an object ACE, else [`Acl::REVISION`].
    #[must_use]
    #[inline]
    pub fn revision(&self) -> u8 {
        if self.entries.iter().any(|ace| ace.ace_type().is_object()) {
            Self::REVISION_DS
        } else {
            Self::REVISION
        }
    }

    /// Size of the binary form in bytes, header included.
    #[must_use]
    #[inline]
    pub fn encoded_len(&self) -> usize {
        Encode::encoded_len(self)
    }

    /// Appends an `ACCESS_ALLOWED` entry after every existing entry.
    #[inline]
    pub fn add_allowed(&mut self, sid: impl Into<Sid>, mask: impl Into<AccessMask>) {
        self.entries.push(Ace::allowed(sid, mask));
    }

    /// Inserts an `ACCESS_DENIED` entry in front of the first allow-kind entry,
    /// or at the end when there is none.
    #[inline]
    pub fn add_denied(&mut self, sid: impl Into<Sid>, mask: impl Into<AccessMask>) {
        let index = self
            .entries
            .iter()
            .position(|ace| ace.ace_type().is_allow())
            .unwrap_or(self.entries.len());
        self.entries.insert(index, Ace::denied(sid, mask));
    }

    /// Decodes a list from the start of `bytes`; trailing bytes are ignored.
    ///
    /// # Errors
    /// - [`SecurityError::InvalidRevision`] for a revision outside 2..=4.
    /// - [`SecurityError::InvalidSize`] if the declared size is below the header.
    /// - [`SecurityError::Truncated`] if `bytes` is shorter than declared.
    /// - Any error of [`Ace::from_bytes`] for an entry.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> SecurityResult<Self> {
        Self::decode(&mut Reader::new(bytes))
    }

    /// Binary form.
    ///
    /// # Errors
    /// [`SecurityError::InvalidSize`] if the list does not fit in 65535 bytes
    /// or holds more than 65535 entries.
    #[inline]
    pub fn to_bytes(&self) -> SecurityResult<Vec<u8>> {
        self.encode_to_vec()
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone)]
struct AclHeader {
    #[br(assert(
        (Acl::REVISION..=Acl::REVISION_DS).contains(&revision),
        SecurityError::InvalidRevision { what: "ACL", revision }
    ))]
    revision: u8,
    #[bw(calc = 0)]
    _sbz1: u8,
    #[br(assert(
        usize::from(size) >= HEADER_LEN,
        SecurityError::InvalidSize { what: "ACL", size: usize::from(size) }
    ))]
    size: u16,
    count: u16,
    #[bw(calc = 0)]
    _sbz2: u16,
}

impl Record for AclHeader {
    const WHAT: &'static str = "ACL header";
    const MIN_LEN: usize = HEADER_LEN;
}

impl Encode for Acl {
    fn encoded_len(&self) -> usize {
        HEADER_LEN + self.entries.iter().map(Encode::encoded_len).sum::<usize>()
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        let header = AclHeader {
            revision: self.revision(),
            size: wire_u16(self.encoded_len(), "ACL")?,
            count: wire_u16(self.entries.len(), "ACL entry count")?,
        };
        put_record(out, &header)?;
        for ace in &self.entries {
            ace.encode_into(out)?;
        }
        Ok(())
    }
}

impl Decode for Acl {
    fn decode(reader: &mut Reader<'_>) -> SecurityResult<Self> {
        let AclHeader {
            revision,
            size,
            count,
        } = reader.read_record::<AclHeader>()?;
        let size = usize::from(size);
        let mut body = Reader::new(reader.take(size - HEADER_LEN, "ACL")?);
        let entries = (0..count)
            .map(|_| Ace::decode(&mut body))
            .collect::<SecurityResult<Vec<_>>>()?;
        debug!(revision, size, count, "decoded ACL");
        Ok(Self { entries })
    }
}

impl TryFrom<&[u8]> for Acl {
    type Error = SecurityError;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

impl From<Vec<Ace>> for Acl {
    #[inline]
    fn from(entries: Vec<Ace>) -> Self {
        Self::from_entries(entries)
    }
}

impl FromIterator<Ace> for Acl {
    #[inline]
    fn from_iter<T: IntoIterator<Item = Ace>>(iter: T) -> Self {
        Self::from_entries(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Acl {
    type Item = &'a Ace;
    type IntoIter = core::slice::Iter<'a, Ace>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Acl {
    type Item = Ace;
    type IntoIter = std::vec::IntoIter<Ace>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
