//! Self-relative security descriptors.
//!
//! ```text
//! revision:u8  sbz1:u8  control:u16
//! owner_offset:u32  group_offset:u32  sacl_offset:u32  dacl_offset:u32
//! owner  group  sacl  dacl
//! ```
//!
//! Offsets count from the start of the descriptor; zero marks an absent block.

use binrw::binrw;
use tracing::debug;

use crate::bitset::Bitset;
use crate::codec::{Decode, Encode, Reader, Record, put_record, wire_u32};
use crate::{AccessMask, Acl, SecurityError, SecurityResult, Sid, meaning};

/// Control word of a security descriptor (see [`crate::meaning::CONTROL`]).
pub type ControlFlags = Bitset<16>;

const HEADER_LEN: usize = 20;
const SE_DACL_PRESENT: usize = 2;
const SE_SACL_PRESENT: usize = 4;
const SE_SELF_RELATIVE: usize = 15;
const SELF_RELATIVE_BIT: u16 = 1 << SE_SELF_RELATIVE;

/// Owner, group, SACL and DACL of a securable object.
///
/// The `SE_DACL_PRESENT`, `SE_SACL_PRESENT` and `SE_SELF_RELATIVE` control bits
/// always reflect the fields: they are rewritten on every mutation.
///
/// # Examples
/// ```rust
/// # use win_security_descriptor::{SecurityDescriptor, Sid, well_known, meaning::rights};
/// let owner: Sid = "S-1-5-21-1004336348-1177238915-682003330-500".parse().unwrap();
/// let mut sd = SecurityDescriptor::new().with_owner(owner);
/// sd.add_allowed(well_known::EVERYONE, rights::GENERIC_READ);
/// assert!(sd.control().get_named("SE_DACL_PRESENT"));
///
/// let bytes = sd.to_bytes().unwrap();
/// assert_eq!(SecurityDescriptor::from_bytes(&bytes).unwrap(), sd);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityDescriptor {
    control: ControlFlags,
    owner: Option<Sid>,
    group: Option<Sid>,
    sacl: Option<Acl>,
    dacl: Option<Acl>,
}

impl SecurityDescriptor {
    /// The only descriptor revision.
    pub const REVISION: u8 = 1;

    /// A descriptor with no owner, group or ACL.
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        let mut sd = Self {
            control: ControlFlags::new(),
            owner: None,
            group: None,
            sacl: None,
            dacl: None,
        };
        sd.sync_control();
        sd
    }

    fn sync_control(&mut self) {
        let mut control = ControlFlags::from_bits(self.control.bits());
        control.set(SE_DACL_PRESENT, self.dacl.is_some());
        control.set(SE_SACL_PRESENT, self.sacl.is_some());
        control.set(SE_SELF_RELATIVE, true);
        self.control = control.with_meaning(&meaning::CONTROL).unwrap_or(control);
    }

    /// Control word, with the [`meaning::CONTROL`] table attached.
    #[must_use]
    #[inline]
    pub const fn control(&self) -> ControlFlags {
        self.control
    }

    /// Replaces the control word; the presence bits are then re-derived.
    #[inline]
    pub fn set_control(&mut self, control: ControlFlags) {
        self.control = control;
        self.sync_control();
    }

    /// Always true: only the self-relative form exists.
    #[must_use]
    #[inline]
    pub const fn is_self_relative(&self) -> bool {
        self.control.get(SE_SELF_RELATIVE)
    }

    /// Owner SID.
    #[must_use]
    #[inline]
    pub const fn owner(&self) -> Option<&Sid> {
        self.owner.as_ref()
    }

    /// Primary group SID.
    #[must_use]
    #[inline]
    pub const fn group(&self) -> Option<&Sid> {
        self.group.as_ref()
    }

    /// System ACL.
    #[must_use]
    #[inline]
    pub const fn sacl(&self) -> Option<&Acl> {
        self.sacl.as_ref()
    }

    /// Discretionary ACL.
    #[must_use]
    #[inline]
    pub const fn dacl(&self) -> Option<&Acl> {
        self.dacl.as_ref()
    }

    /// Replaces the owner.
    #[inline]
    pub fn set_owner(&mut self, owner: Option<Sid>) {
        self.owner = owner;
    }

    /// Replaces the primary group.
    #[inline]
    pub fn set_group(&mut self, group: Option<Sid>) {
        self.group = group;
    }

    /// Replaces the SACL and re-derives `SE_SACL_PRESENT`.
    #[inline]
    pub fn set_sacl(&mut self, sacl: Option<Acl>) {
        self.sacl = sacl;
        self.sync_control();
    }

    /// Replaces the DACL and re-derives `SE_DACL_PRESENT`.
    #[inline]
    pub fn set_dacl(&mut self, dacl: Option<Acl>) {
        self.dacl = dacl;
        self.sync_control();
    }

    /// Builder-style [`SecurityDescriptor::set_owner`].
    #[must_use]
    #[inline]
    pub fn with_owner(mut self, owner: impl Into<Sid>) -> Self {
        self.set_owner(Some(owner.into()));
        self
    }

    /// Builder-style [`SecurityDescriptor::set_group`].
    #[must_use]
    #[inline]
    pub fn with_group(mut self, group: impl Into<Sid>) -> Self {
        self.set_group(Some(group.into()));
        self
    }

    /// Builder-style [`SecurityDescriptor::set_sacl`].
    #[must_use]
    #[inline]
    pub fn with_sacl(mut self, sacl: Acl) -> Self {
        self.set_sacl(Some(sacl));
        self
    }

    /// Builder-style [`SecurityDescriptor::set_dacl`].
    #[must_use]
    #[inline]
    pub fn with_dacl(mut self, dacl: Acl) -> Self {
        self.set_dacl(Some(dacl));
        self
    }

    fn dacl_mut(&mut self) -> &mut Acl {
        if self.dacl.is_none() {
            self.set_dacl(Some(Acl::new()));
        }
        self.dacl.get_or_insert_with(Acl::new)
    }

    /// [`Acl::add_allowed`] on the DACL, created empty if absent.
    #[inline]
    pub fn add_allowed(&mut self, sid: impl Into<Sid>, mask: impl Into<AccessMask>) {
        self.dacl_mut().add_allowed(sid, mask);
    }

    /// [`Acl::add_denied`] on the DACL, created empty if absent.
    #[inline]
    pub fn add_denied(&mut self, sid: impl Into<Sid>, mask: impl Into<AccessMask>) {
        self.dacl_mut().add_denied(sid, mask);
    }

    /// Decodes a self-relative descriptor.
    ///
    /// A block is read at each non-zero offset. A DACL or SACL whose present
    /// bit is set but whose offset is zero decodes as absent.
    ///
    /// # Errors
    /// - [`SecurityError::MissingControl`] if `bytes` is shorter than 4 bytes.
    /// - [`SecurityError::InvalidRevision`] for a revision other than 1.
    /// - [`SecurityError::NotSelfRelative`] if `SE_SELF_RELATIVE` is clear.
    /// - [`SecurityError::Truncated`] for a short header or an offset past the end.
    /// - Any error of the SID and ACL decoders.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> SecurityResult<Self> {
        if bytes.len() < 4 {
            return Err(SecurityError::MissingControl);
        }
        Self::decode(&mut Reader::new(bytes))
    }

    /// Self-relative binary form.
    ///
    /// # Errors
    /// [`SecurityError::InvalidSize`] if an ACL is too large for its header.
    #[inline]
    pub fn to_bytes(&self) -> SecurityResult<Vec<u8>> {
        self.encode_to_vec()
    }
}

impl Default for SecurityDescriptor {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Block lengths in wire order: owner, group, sacl, dacl.
fn block_lens(sd: &SecurityDescriptor) -> [Option<usize>; 4] {
    [
        sd.owner.as_ref().map(Sid::binary_len),
        sd.group.as_ref().map(Sid::binary_len),
        sd.sacl.as_ref().map(Encode::encoded_len),
        sd.dacl.as_ref().map(Encode::encoded_len),
    ]
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone)]
struct DescriptorHeader {
    #[br(assert(
        revision == SecurityDescriptor::REVISION,
        SecurityError::InvalidRevision { what: "security descriptor", revision }
    ))]
    revision: u8,
    #[bw(calc = 0)]
    _sbz1: u8,
    #[br(assert(control & SELF_RELATIVE_BIT != 0, SecurityError::NotSelfRelative))]
    control: u16,
    owner_offset: u32,
    group_offset: u32,
    sacl_offset: u32,
    dacl_offset: u32,
}

impl Record for DescriptorHeader {
    const WHAT: &'static str = "security descriptor header";
    const MIN_LEN: usize = HEADER_LEN;
}

impl Encode for SecurityDescriptor {
    fn encoded_len(&self) -> usize {
        HEADER_LEN + block_lens(self).iter().flatten().sum::<usize>()
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        let mut offsets = [0u32; 4];
        let mut next = HEADER_LEN;
        for (offset, len) in offsets.iter_mut().zip(block_lens(self)) {
            if let Some(len) = len {
                *offset = wire_u32(next, "security descriptor offset")?;
                next += len;
            }
        }
        let [owner_offset, group_offset, sacl_offset, dacl_offset] = offsets;
        let header = DescriptorHeader {
            revision: Self::REVISION,
            // sixteen-bit word
            control: u16::try_from(self.control.bits()).unwrap_or_default(),
            owner_offset,
            group_offset,
            sacl_offset,
            dacl_offset,
        };
        put_record(out, &header)?;
        if let Some(owner) = &self.owner {
            owner.encode_into(out)?;
        }
        if let Some(group) = &self.group {
            group.encode_into(out)?;
        }
        if let Some(sacl) = &self.sacl {
            sacl.encode_into(out)?;
        }
        if let Some(dacl) = &self.dacl {
            dacl.encode_into(out)?;
        }
        Ok(())
    }
}

/// Reader positioned at `offset` within `whole`, or `None` for offset zero.
fn block_at<'a>(
    whole: &'a [u8],
    offset: u32,
    what: &'static str,
) -> SecurityResult<Option<Reader<'a>>> {
    if offset == 0 {
        return Ok(None);
    }
    let offset = offset as usize;
    let block = whole.get(offset..).ok_or(SecurityError::Truncated {
        what,
        needed: offset,
        available: whole.len(),
    })?;
    Ok(Some(Reader::new(block)))
}

impl Decode for SecurityDescriptor {
    fn decode(reader: &mut Reader<'_>) -> SecurityResult<Self> {
        let whole = reader.clone().rest();
        let DescriptorHeader {
            control,
            owner_offset,
            group_offset,
            sacl_offset,
            dacl_offset,
            ..
        } = reader.read_record::<DescriptorHeader>()?;
        let control = ControlFlags::from_bits(control.into());
        debug!(
            control = control.bits(),
            owner_offset, group_offset, sacl_offset, dacl_offset, "decoding security descriptor"
        );

        let owner = block_at(whole, owner_offset, "owner SID")?
            .map(|mut r| Sid::decode(&mut r))
            .transpose()?;
        let group = block_at(whole, group_offset, "group SID")?
            .map(|mut r| Sid::decode(&mut r))
            .transpose()?;
        let sacl = block_at(whole, sacl_offset, "SACL")?
            .map(|mut r| Acl::decode(&mut r))
            .transpose()?;
        let dacl = block_at(whole, dacl_offset, "DACL")?
            .map(|mut r| Acl::decode(&mut r))
            .transpose()?;
        reader.rest();

        let mut sd = Self {
            control,
            owner,
            group,
            sacl,
            dacl,
        };
        sd.sync_control();
        Ok(sd)
    }
}

impl TryFrom<&[u8]> for SecurityDescriptor {
    type Error = SecurityError;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::*;
    use crate::acl::test::arb_acl;
    use crate::sid::test::arb_sid;
    use crate::well_known;
    use proptest::prelude::*;

    prop_compose! {
        fn arb_descriptor()
            (owner in proptest::option::of(arb_sid()),
             group in proptest::option::of(arb_sid()),
             sacl in proptest::option::of(arb_acl()),
             dacl in proptest::option::of(arb_acl()),
             control in any::<u16>())
            -> SecurityDescriptor {
            let mut sd = SecurityDescriptor::new();
            sd.set_control(ControlFlags::from_bits(control.into()));
            sd.set_owner(owner);
            sd.set_group(group);
            sd.set_sacl(sacl);
            sd.set_dacl(dacl);
            sd
        }
    }

    proptest! {
        #[test]
        fn binary_round_trip(sd in arb_descriptor()) {
            let bytes = sd.to_bytes().unwrap();
            prop_assert_eq!(bytes.len(), sd.encoded_len());
            prop_assert_eq!(SecurityDescriptor::from_bytes(&bytes).unwrap(), sd);
        }
    }

    #[test]
    fn empty_descriptor() {
        let bytes = SecurityDescriptor::new().to_bytes().unwrap();
        #[rustfmt::skip]
        assert_eq!(bytes, [
            1, 0, 0x00, 0x80,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ]);
    }

    #[test]
    fn offsets_follow_block_order() {
        let mut sd = SecurityDescriptor::new()
            .with_owner(well_known::BUILTIN_ADMINISTRATORS)
            .with_group(well_known::LOCAL_SYSTEM);
        sd.add_denied(well_known::BUILTIN_GUESTS, 1u32);
        let bytes = sd.to_bytes().unwrap();
        let offset = |i: usize| u32::from_le_bytes(bytes[4 + 4 * i..8 + 4 * i].try_into().unwrap());
        assert_eq!(offset(0), 20);
        assert_eq!(offset(1), 20 + 16);
        assert_eq!(offset(2), 0);
        assert_eq!(offset(3), 20 + 16 + 12);
        assert_eq!(bytes[2] & 0b0001_0100, 0b0000_0100);
    }

    #[test]
    fn control_is_rederived() {
        let mut sd = SecurityDescriptor::new().with_dacl(Acl::new());
        assert!(sd.control().get_named("SE_DACL_PRESENT"));
        sd.set_control(ControlFlags::from_bits(0x1000));
        assert!(sd.control().get_named("SE_DACL_PROTECTED"));
        assert!(sd.control().get_named("SE_DACL_PRESENT"));
        assert!(sd.is_self_relative());
        sd.set_dacl(None);
        assert!(!sd.control().get_named("SE_DACL_PRESENT"));
    }

    #[test]
    fn short_and_bad_headers() {
        assert_eq!(SecurityDescriptor::from_bytes(&[1, 0, 0]), Err(SecurityError::MissingControl));
        assert_eq!(
            SecurityDescriptor::from_bytes(&[2, 0, 0, 0x80]),
            Err(SecurityError::InvalidRevision {
                what: "security descriptor",
                revision: 2
            })
        );
        assert_eq!(
            SecurityDescriptor::from_bytes(&[1, 0, 0, 0]),
            Err(SecurityError::NotSelfRelative)
        );
        assert_eq!(
            SecurityDescriptor::from_bytes(&[1, 0, 0, 0x80, 0]),
            Err(SecurityError::Truncated {
                what: "security descriptor header",
                needed: HEADER_LEN,
                available: 5
            })
        );
    }

    #[test]
    fn offset_past_the_end() {
        let mut bytes = SecurityDescriptor::new().to_bytes().unwrap();
        bytes[4] = 0xFF;
        assert!(matches!(
            SecurityDescriptor::from_bytes(&bytes),
            Err(SecurityError::Truncated { what: "owner SID", .. })
        ));
    }

    #[test]
    fn present_bit_without_offset_is_absent() {
        let mut bytes = SecurityDescriptor::new().to_bytes().unwrap();
        bytes[2] |= 0b100;
        let sd = SecurityDescriptor::from_bytes(&bytes).unwrap();
        assert_eq!(sd.dacl(), None);
        assert!(!sd.control().get_named("SE_DACL_PRESENT"));
    }
}
