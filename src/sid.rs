//! Owned Windows Security Identifier (SID) and its binary/string codecs.
//!
//! Binary layout (MS-DTYP 2.4.2.2):
//! `revision:u8, sub_authority_count:u8, identifier_authority:[u8; 6] (big-endian),
//! sub_authority:[u32 LE; count]`, so a SID is always `8 + 4 * count` bytes.

use arrayvec::ArrayVec;
use binrw::binrw;
use core::fmt::{self, Debug, Display};
use core::str::FromStr;
use parsing::SidComponents;

pub use parsing::MAX_SUBAUTHORITY_COUNT;

use crate::codec::{Decode, Encode, Reader, Record, put_record};
use crate::{SecurityError, SecurityResult, SidIdentifierAuthority};

/// Size of the fixed SID header (revision, count, authority).
pub const SID_HEAD_SIZE: usize = 8;

/// Windows Security Identifier.
///
/// An immutable value: cloning is cheap (at most 68 bytes, no heap), so SIDs
/// are shared by value between ACEs, claims and descriptors.
///
/// # Examples
/// ```rust
/// # use win_security_descriptor::{Sid, SidIdentifierAuthority};
/// let sid = Sid::new(SidIdentifierAuthority::NT_AUTHORITY, [32, 544]).unwrap();
/// assert_eq!(sid.to_string(), "S-1-5-32-544");
/// assert_eq!(sid.to_bytes(), [1, 2, 0, 0, 0, 0, 0, 5, 32, 0, 0, 0, 32, 2, 0, 0]);
/// assert_eq!("S-1-5-32-544".parse::<Sid>().unwrap(), sid);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sid {
    revision: u8,
    identifier_authority: SidIdentifierAuthority,
    sub_authority: ArrayVec<u32, { MAX_SUBAUTHORITY_COUNT as usize }>,
}

impl Sid {
    /// The only SID revision Windows defines.
    pub const REVISION: u8 = 1;

    /// Creates a SID from its authority and sub-authorities.
    ///
    /// # Errors
    /// [`SecurityError::MalformedSid`] if more than 15 sub-authorities are given.
    #[inline]
    pub fn new<I: Into<SidIdentifierAuthority>, S: AsRef<[u32]>>(
        identifier_authority: I,
        sub_authority: S,
    ) -> SecurityResult<Self> {
        let sub_authority =
            ArrayVec::try_from(sub_authority.as_ref()).map_err(|_| SecurityError::MalformedSid)?;
        Ok(Self {
            revision: Self::REVISION,
            identifier_authority: identifier_authority.into(),
            sub_authority,
        })
    }

    /// Builds a SID from parts whose count is already known to fit.
    pub(crate) fn from_parts(
        identifier_authority: SidIdentifierAuthority,
        sub_authority: &[u32],
    ) -> Self {
        Self {
            revision: Self::REVISION,
            identifier_authority,
            sub_authority: sub_authority
                .iter()
                .copied()
                .take(MAX_SUBAUTHORITY_COUNT as usize)
                .collect(),
        }
    }

    /// The SID revision, always [`Sid::REVISION`].
    #[must_use]
    #[inline]
    pub const fn revision(&self) -> u8 {
        self.revision
    }

    /// The 48-bit identifier authority.
    #[must_use]
    #[inline]
    pub const fn identifier_authority(&self) -> SidIdentifierAuthority {
        self.identifier_authority
    }

    /// The sub-authorities, most significant first.
    #[must_use]
    #[inline]
    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authority
    }

    /// Number of sub-authorities.
    #[must_use]
    #[inline]
    pub fn sub_authority_count(&self) -> u8 {
        // ArrayVec capacity is 15.
        u8::try_from(self.sub_authority.len()).unwrap_or(MAX_SUBAUTHORITY_COUNT)
    }

    /// The relative identifier (last sub-authority), if any.
    #[must_use]
    #[inline]
    pub fn rid(&self) -> Option<u32> {
        self.sub_authority.last().copied()
    }

    /// A copy of this SID with `rid` appended, e.g. a domain SID plus `500`.
    ///
    /// # Errors
    /// [`SecurityError::MalformedSid`] if the SID already has 15 sub-authorities.
    #[inline]
    pub fn with_rid(&self, rid: u32) -> SecurityResult<Self> {
        let mut sid = self.clone();
        sid.sub_authority
            .try_push(rid)
            .map_err(|_| SecurityError::MalformedSid)?;
        Ok(sid)
    }

    /// Length of the binary form: `8 + 4 * sub_authority_count`.
    #[must_use]
    #[inline]
    pub fn binary_len(&self) -> usize {
        SID_HEAD_SIZE + self.sub_authority.len() * size_of::<u32>()
    }

    /// Decodes a SID occupying exactly the whole of `bytes`.
    ///
    /// # Errors
    /// [`SecurityError::MalformedSid`] if the revision is not 1 or the length
    /// disagrees with the sub-authority count.
    ///
    /// # Examples
    /// ```rust
    /// # use win_security_descriptor::Sid;
    /// // S-1-5-32-544 (Administrators)
    /// let bytes = [1, 2, 0, 0, 0, 0, 0, 5, 32, 0, 0, 0, 32, 2, 0, 0];
    /// assert_eq!(Sid::from_bytes(&bytes).unwrap().to_string(), "S-1-5-32-544");
    /// assert!(Sid::from_bytes(&bytes[..12]).is_err());
    /// ```
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> SecurityResult<Self> {
        let mut reader = Reader::new(bytes);
        let sid = Self::decode(&mut reader)?;
        if !reader.is_empty() {
            return Err(SecurityError::MalformedSid);
        }
        Ok(sid)
    }

    /// Binary form of the SID.
    #[must_use]
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        // in-memory writes do not fail
        self.encode_to_vec().unwrap_or_default()
    }
}

/// Wire form of a [`Sid`].
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SidRecord {
    #[bw(calc = Sid::REVISION)]
    #[br(assert(revision == Sid::REVISION, SecurityError::MalformedSid))]
    revision: u8,
    #[br(assert(sub_authority_count <= MAX_SUBAUTHORITY_COUNT, SecurityError::MalformedSid))]
    sub_authority_count: u8,
    identifier_authority: [u8; 6],
    #[br(count = sub_authority_count)]
    sub_authority: Vec<u32>,
}

impl Record for SidRecord {
    const WHAT: &'static str = "SID";
    const MIN_LEN: usize = SID_HEAD_SIZE;
}

impl From<&Sid> for SidRecord {
    fn from(sid: &Sid) -> Self {
        Self {
            sub_authority_count: sid.sub_authority_count(),
            identifier_authority: sid.identifier_authority.value,
            sub_authority: sid.sub_authority.to_vec(),
        }
    }
}

impl From<SidRecord> for Sid {
    fn from(record: SidRecord) -> Self {
        Self::from_parts(
            SidIdentifierAuthority::from(record.identifier_authority),
            &record.sub_authority,
        )
    }
}

impl Encode for Sid {
    fn encoded_len(&self) -> usize {
        self.binary_len()
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        put_record(out, &SidRecord::from(self))
    }
}

impl Decode for Sid {
    fn decode(reader: &mut Reader<'_>) -> SecurityResult<Self> {
        reader.read_record::<SidRecord>().map(Self::from)
    }
}

impl Display for Sid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.revision)?;

        // Identifier Authority: print as decimal if fits in u32, else as hex
        let id_auth_value = self.identifier_authority.as_u64();
        if id_auth_value <= 0xFFFF_FFFF {
            write!(f, "-{id_auth_value}")?;
        } else {
            write!(f, "-0x{id_auth_value:X}")?;
        }

        for &sub_auth in &self.sub_authority {
            write!(f, "-{sub_auth}")?;
        }
        Ok(())
    }
}

impl Debug for Sid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sid({self})")
    }
}

impl FromStr for Sid {
    type Err = SecurityError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = SidComponents::from_str(s)?;
        if components.revision != Self::REVISION {
            return Err(SecurityError::MalformedSid);
        }
        Ok(Self {
            revision: components.revision,
            identifier_authority: components.identifier_authority.into(),
            sub_authority: components.sub_authority,
        })
    }
}

impl TryFrom<&[u8]> for Sid {
    type Error = SecurityError;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

impl TryFrom<&str> for Sid {
    type Error = SecurityError;

    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
pub(crate) mod test {
    use super::*;
    use crate::arb_identifier_authority;
    use core::hash::{Hash, Hasher};
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;

    pub fn arb_sid() -> impl Strategy<Value = Sid> {
        (
            arb_identifier_authority(),
            proptest::collection::vec(any::<u32>(), 0..=15),
        )
            .prop_map(|(identifier_authority, sub_authorities)| {
                Sid::new(identifier_authority, sub_authorities).unwrap()
            })
    }

    proptest! {
        #[test]
        fn sid_display_round_trip(sid in arb_sid()) {
            let display = sid.to_string();
            prop_assert!(
                display.starts_with("S-1-"),
                "Display does not start with S-1-: {}",
                display
            );

            let dash_count = display.matches('-').count();
            let expected = sid.sub_authorities().len() + 2;
            prop_assert_eq!(
                dash_count,
                expected,
                "Dash count {} vs sub_authority_count {}",
                dash_count,
                expected
            );
            prop_assert_eq!(display.parse::<Sid>().unwrap(), sid);
        }

        #[test]
        fn sid_binary_round_trip(sid in arb_sid()) {
            let bytes = sid.to_bytes();
            prop_assert_eq!(bytes.len(), 8 + 4 * sid.sub_authorities().len());
            prop_assert_eq!(Sid::from_bytes(&bytes).unwrap(), sid);
        }

        #[test]
        fn sid_hash_and_eq(sid1 in arb_sid(), sid2 in arb_sid()) {
            let sid1_clone = sid1.clone();
            prop_assert_eq!(&sid1, &sid1_clone);
            let mut hasher1 = DefaultHasher::new();
            sid1.hash(&mut hasher1);
            let mut hasher2 = DefaultHasher::new();
            sid1_clone.hash(&mut hasher2);
            prop_assert_eq!(hasher1.finish(), hasher2.finish());
            if sid1.to_bytes() != sid2.to_bytes() {
                prop_assert_ne!(sid1, sid2);
            }
        }
    }

    #[test]
    fn domain_sid_round_trip() {
        let text = "S-1-5-21-3623811015-3361044348-30300820-1013";
        let sid: Sid = text.parse().unwrap();
        let back = Sid::from_bytes(&sid.to_bytes()).unwrap();
        assert_eq!(back.to_string(), text);
        assert_eq!(back.rid(), Some(1013));
    }

    #[test]
    fn authority_is_big_endian_on_the_wire() {
        let sid: Sid = "S-1-0x123456789ABC-1".parse().unwrap();
        let bytes = sid.to_bytes();
        assert_eq!(bytes.get(2..8), Some(&[0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC][..]));
        assert_eq!(sid.to_string(), "S-1-0x123456789ABC-1");
        // decimal authorities above u32 are normalized to hex
        let sid: Sid = "S-1-4294967296-1".parse().unwrap();
        assert_eq!(sid.to_string(), "S-1-0x100000000-1");
    }

    #[test]
    fn malformed_sids() {
        for text in ["S-1", "S-1-five", "S-2-5-32", "1-5-32", "S-1-5-32-x"] {
            assert_eq!(text.parse::<Sid>(), Err(SecurityError::MalformedSid), "{text}");
        }
        // count says two sub-authorities, only one present
        assert!(Sid::from_bytes(&[1, 2, 0, 0, 0, 0, 0, 5, 32, 0, 0, 0]).is_err());
        // revision 2
        assert_eq!(
            Sid::from_bytes(&[2, 0, 0, 0, 0, 0, 0, 5]),
            Err(SecurityError::MalformedSid)
        );
        // trailing byte
        assert_eq!(
            Sid::from_bytes(&[1, 0, 0, 0, 0, 0, 0, 5, 0]),
            Err(SecurityError::MalformedSid)
        );
        // sixteen sub-authorities announced
        assert_eq!(
            Sid::from_bytes(&[1, 16, 0, 0, 0, 0, 0, 5]),
            Err(SecurityError::MalformedSid)
        );
        assert_eq!(
            Sid::from_bytes(&[1, 1, 0, 0, 0, 0]),
            Err(SecurityError::Truncated {
                what: "SID",
                needed: SID_HEAD_SIZE,
                available: 6
            })
        );
    }

    #[test]
    fn with_rid_appends() {
        let domain: Sid = "S-1-5-21-1-2-3".parse().unwrap();
        assert_eq!(domain.with_rid(500).unwrap().to_string(), "S-1-5-21-1-2-3-500");
        let full = Sid::new(SidIdentifierAuthority::NT_AUTHORITY, [0u32; 15]).unwrap();
        assert_eq!(full.with_rid(1), Err(SecurityError::MalformedSid));
        assert!(Sid::new(SidIdentifierAuthority::NT_AUTHORITY, [0u32; 16]).is_err());
    }

    #[test]
    fn test_debug() {
        let sid = Sid::new(SidIdentifierAuthority::NULL_AUTHORITY, [0]).unwrap();
        assert_eq!(format!("{sid:?}"), "Sid(S-1-0-0)");
    }
}
