use binrw::binrw;

use crate::bitset::Bitset;
use crate::codec::{Decode, Encode, Reader, Record, align4, put_record};
use crate::expression::ConditionalExpression;
use crate::sid::{SID_HEAD_SIZE, SidRecord};
use crate::{AccessMask, ClaimAttribute, Guid, SecurityError, SecurityResult, Sid};

use super::kind::{AceShape, DataKind};

/// `Flags` word of an object ACE (see [`crate::meaning::OBJECT_ACE_FLAGS`]).
pub type ObjectAceFlags = Bitset<32>;

const OBJECT_TYPE_PRESENT: usize = 0;
const INHERITED_OBJECT_TYPE_PRESENT: usize = 1;
const OBJECT_TYPE_BIT: u32 = 1 << OBJECT_TYPE_PRESENT;
const INHERITED_OBJECT_TYPE_BIT: u32 = 1 << INHERITED_OBJECT_TYPE_PRESENT;

/// Trailing application data of callback and resource-attribute ACEs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ApplicationData {
    /// Nothing follows the SID.
    #[default]
    None,
    /// Conditional expression of a callback ACE.
    Expression(ConditionalExpression),
    /// Claim attribute of a resource-attribute ACE.
    Attribute(ClaimAttribute),
    /// Uninterpreted bytes, padding included.
    Opaque(Vec<u8>),
}

impl ApplicationData {
    /// Whether nothing follows the SID.
    #[must_use]
    #[inline]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether this data may accompany an ACE whose type holds `kind`.
    pub(crate) fn fits(&self, kind: DataKind) -> SecurityResult<bool> {
        Ok(match (self, kind) {
            (Self::None, _) => true,
            (Self::Expression(_), DataKind::Expression) | (Self::Opaque(_), DataKind::Opaque) => {
                true
            }
            (Self::Attribute(attribute), DataKind::Attribute) => {
                let count = attribute.values().len();
                if count != 1 {
                    return Err(SecurityError::TooManyValues { count });
                }
                true
            }
            _ => false,
        })
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Expression(expression) => expression.encoded_len(),
            Self::Attribute(attribute) => attribute.encoded_len(),
            Self::Opaque(bytes) => bytes.len(),
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        match self {
            Self::None => Ok(()),
            Self::Expression(expression) => expression.encode_into(out),
            Self::Attribute(attribute) => attribute.encode_into(out),
            Self::Opaque(bytes) => {
                out.extend_from_slice(bytes);
                Ok(())
            }
        }
    }

    /// Opaque bytes as the envelope writes them: zero-padded to four bytes,
    /// and `None` when nothing but zeros remains.
    fn normalized(self) -> Self {
        match self {
            Self::Opaque(bytes) if bytes.iter().all(|&b| b == 0) => Self::None,
            Self::Opaque(mut bytes) => {
                bytes.resize(align4(bytes.len()), 0);
                Self::Opaque(bytes)
            }
            data => data,
        }
    }

    fn decode(kind: DataKind, bytes: &[u8]) -> SecurityResult<Self> {
        if bytes.iter().all(|&b| b == 0) {
            return Ok(Self::None);
        }
        Ok(match kind {
            DataKind::Expression => Self::Expression(ConditionalExpression::from_bytes(bytes)?),
            DataKind::Attribute => Self::Attribute(ClaimAttribute::from_bytes(bytes)?),
            DataKind::Opaque | DataKind::None => Self::Opaque(bytes.to_vec()),
        })
    }
}

/// Access mask and trustee SID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasicAce {
    /// Rights granted, denied or audited.
    pub mask: AccessMask,
    /// Trustee.
    pub sid: Sid,
}

impl BasicAce {
    /// Pairs a mask with a trustee.
    #[must_use]
    #[inline]
    pub fn new(mask: impl Into<AccessMask>, sid: impl Into<Sid>) -> Self {
        Self {
            mask: mask.into(),
            sid: sid.into(),
        }
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone)]
struct BasicRecord {
    mask: u32,
    sid: SidRecord,
}

impl Record for BasicRecord {
    const WHAT: &'static str = "ACE body";
    const MIN_LEN: usize = 4 + SID_HEAD_SIZE;
}

impl Encode for BasicAce {
    fn encoded_len(&self) -> usize {
        self.mask.encoded_len() + self.sid.binary_len()
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        let record = BasicRecord {
            mask: self.mask.bits(),
            sid: SidRecord::from(&self.sid),
        };
        put_record(out, &record)
    }
}

impl Decode for BasicAce {
    fn decode(reader: &mut Reader<'_>) -> SecurityResult<Self> {
        let record = reader.read_record::<BasicRecord>()?;
        Ok(Self {
            mask: AccessMask::from_bits(record.mask),
            sid: Sid::from(record.sid),
        })
    }
}

/// Access mask, object flags, object GUIDs and trustee SID.
///
/// Bits 0 and 1 of `flags` always mirror which GUIDs are set; any other bit
/// is carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectAce {
    /// Rights granted, denied or audited.
    pub mask: AccessMask,
    /// Object flags word as read from or written to the wire.
    pub flags: ObjectAceFlags,
    /// Object, property set or property the ACE applies to.
    pub object_type: Option<Guid>,
    /// Child object type that inherits the ACE.
    pub inherited_object_type: Option<Guid>,
    /// Trustee.
    pub sid: Sid,
}

impl ObjectAce {
    /// An object ACE with no reserved flag bit set.
    #[must_use]
    #[inline]
    pub fn new(
        mask: impl Into<AccessMask>,
        object_type: Option<Guid>,
        inherited_object_type: Option<Guid>,
        sid: impl Into<Sid>,
    ) -> Self {
        let mut ace = Self {
            mask: mask.into(),
            flags: ObjectAceFlags::new(),
            object_type,
            inherited_object_type,
            sid: sid.into(),
        };
        ace.sync_flags();
        ace
    }

    /// Flags word with the presence bits taken from the GUIDs.
    #[must_use]
    #[inline]
    pub fn object_flags(&self) -> ObjectAceFlags {
        let mut flags = self.flags;
        flags.set(OBJECT_TYPE_PRESENT, self.object_type.is_some());
        flags.set(INHERITED_OBJECT_TYPE_PRESENT, self.inherited_object_type.is_some());
        flags
    }

    pub(crate) fn sync_flags(&mut self) {
        self.flags = self.object_flags();
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone)]
struct ObjectRecord {
    mask: u32,
    flags: u32,
    #[br(if(flags & OBJECT_TYPE_BIT != 0))]
    object_type: Option<Guid>,
    #[br(if(flags & INHERITED_OBJECT_TYPE_BIT != 0))]
    inherited_object_type: Option<Guid>,
    sid: SidRecord,
}

impl Record for ObjectRecord {
    const WHAT: &'static str = "object ACE body";
    const MIN_LEN: usize = 8 + SID_HEAD_SIZE;
}

impl Encode for ObjectAce {
    fn encoded_len(&self) -> usize {
        4 + 4
            + self.object_type.map_or(0, |_| Guid::LEN)
            + self.inherited_object_type.map_or(0, |_| Guid::LEN)
            + self.sid.binary_len()
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        let record = ObjectRecord {
            mask: self.mask.bits(),
            flags: self.object_flags().bits(),
            object_type: self.object_type,
            inherited_object_type: self.inherited_object_type,
            sid: SidRecord::from(&self.sid),
        };
        put_record(out, &record)
    }
}

impl Decode for ObjectAce {
    fn decode(reader: &mut Reader<'_>) -> SecurityResult<Self> {
        let record = reader.read_record::<ObjectRecord>()?;
        Ok(Self {
            mask: AccessMask::from_bits(record.mask),
            flags: ObjectAceFlags::from_bits(record.flags),
            object_type: record.object_type,
            inherited_object_type: record.inherited_object_type,
            sid: Sid::from(record.sid),
        })
    }
}

/// Body of an ACE, one variant per [`AceShape`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AcePayload {
    /// Mask and SID.
    Basic(BasicAce),
    /// Object ACE.
    Object(ObjectAce),
    /// Object ACE with application data.
    ObjectWithData(ObjectAce, ApplicationData),
    /// Mask and SID with application data.
    WithData(BasicAce, ApplicationData),
    /// Raw body of an ACE type this crate does not know.
    Unknown(Vec<u8>),
}

impl AcePayload {
    /// Shape of the body, `None` for [`AcePayload::Unknown`].
    #[must_use]
    #[inline]
    pub const fn shape(&self) -> Option<AceShape> {
        match self {
            Self::Basic(_) => Some(AceShape::Basic),
            Self::Object(_) => Some(AceShape::Object),
            Self::ObjectWithData(..) => Some(AceShape::ObjectWithData),
            Self::WithData(..) => Some(AceShape::WithData),
            Self::Unknown(_) => None,
        }
    }

    /// Access mask.
    #[must_use]
    #[inline]
    pub const fn mask(&self) -> Option<AccessMask> {
        match self {
            Self::Basic(ace) | Self::WithData(ace, _) => Some(ace.mask),
            Self::Object(ace) | Self::ObjectWithData(ace, _) => Some(ace.mask),
            Self::Unknown(_) => None,
        }
    }

    /// Trustee SID.
    #[must_use]
    #[inline]
    pub const fn sid(&self) -> Option<&Sid> {
        match self {
            Self::Basic(ace) | Self::WithData(ace, _) => Some(&ace.sid),
            Self::Object(ace) | Self::ObjectWithData(ace, _) => Some(&ace.sid),
            Self::Unknown(_) => None,
        }
    }

    /// Object part of an object ACE.
    #[must_use]
    #[inline]
    pub const fn object(&self) -> Option<&ObjectAce> {
        match self {
            Self::Object(ace) | Self::ObjectWithData(ace, _) => Some(ace),
            _ => None,
        }
    }

    /// Application data, `None` for shapes without it.
    #[must_use]
    #[inline]
    pub const fn application_data(&self) -> Option<&ApplicationData> {
        match self {
            Self::ObjectWithData(_, data) | Self::WithData(_, data) => Some(data),
            _ => None,
        }
    }

    /// The form the envelope round-trips: object flags synced with the
    /// GUIDs, opaque bytes and unknown bodies zero-padded to four bytes.
    pub(crate) fn normalized(self) -> Self {
        match self {
            Self::Object(mut ace) => {
                ace.sync_flags();
                Self::Object(ace)
            }
            Self::ObjectWithData(mut ace, data) => {
                ace.sync_flags();
                Self::ObjectWithData(ace, data.normalized())
            }
            Self::WithData(ace, data) => Self::WithData(ace, data.normalized()),
            Self::Unknown(mut body) => {
                body.resize(align4(body.len()), 0);
                Self::Unknown(body)
            }
            payload @ Self::Basic(_) => payload,
        }
    }

    pub(crate) fn encoded_len(&self) -> usize {
        match self {
            Self::Basic(ace) => ace.encoded_len(),
            Self::Object(ace) => ace.encoded_len(),
            Self::ObjectWithData(ace, data) => ace.encoded_len() + data.encoded_len(),
            Self::WithData(ace, data) => ace.encoded_len() + data.encoded_len(),
            Self::Unknown(body) => body.len(),
        }
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        match self {
            Self::Basic(ace) => ace.encode_into(out),
            Self::Object(ace) => ace.encode_into(out),
            Self::ObjectWithData(ace, data) => {
                ace.encode_into(out)?;
                data.encode_into(out)
            }
            Self::WithData(ace, data) => {
                ace.encode_into(out)?;
                data.encode_into(out)
            }
            Self::Unknown(body) => {
                out.extend_from_slice(body);
                Ok(())
            }
        }
    }

    /// Decodes a body of `shape`; trailing bytes become application data
    /// for shapes that carry it and are ignored otherwise.
    pub(crate) fn decode(
        shape: Option<AceShape>,
        kind: DataKind,
        body: &[u8],
    ) -> SecurityResult<Self> {
        let mut reader = Reader::new(body);
        Ok(match shape {
            Some(AceShape::Basic) => Self::Basic(BasicAce::decode(&mut reader)?),
            Some(AceShape::Object) => Self::Object(ObjectAce::decode(&mut reader)?),
            Some(AceShape::ObjectWithData) => {
                let ace = ObjectAce::decode(&mut reader)?;
                Self::ObjectWithData(ace, ApplicationData::decode(kind, reader.rest())?)
            }
            Some(AceShape::WithData) => {
                let ace = BasicAce::decode(&mut reader)?;
                Self::WithData(ace, ApplicationData::decode(kind, reader.rest())?)
            }
            None => Self::Unknown(body.to_vec()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::*;
    use crate::{ClaimFlags, ClaimValue, ClaimValueType, well_known};

    #[test]
    fn object_flags_follow_guids() {
        let mut ace = ObjectAce::new(
            0x10u32,
            None,
            Some(Guid::from_wire([7; 16])),
            well_known::WORLD,
        );
        assert_eq!(ace.object_flags().bits(), 0b10);
        assert_eq!(ace.encoded_len(), 8 + 16 + 12);
        ace.object_type = Some(Guid::from_wire([1; 16]));
        assert_eq!(ace.object_flags().bits(), 0b11);
        let bytes = ace.encode_to_vec().unwrap();
        assert_eq!(bytes.get(8..24), Some(&[1u8; 16][..]));
        ace.sync_flags();
        assert_eq!(ObjectAce::decode(&mut Reader::new(&bytes)).unwrap(), ace);
    }

    #[test]
    fn reserved_object_flags_survive() {
        let mut ace = ObjectAce::new(0x10u32, None, None, well_known::WORLD);
        ace.flags = ObjectAceFlags::from_bits(0x4);
        let bytes = ace.encode_to_vec().unwrap();
        assert_eq!(bytes.get(4..8), Some(&[4u8, 0, 0, 0][..]));
        assert_eq!(ObjectAce::decode(&mut Reader::new(&bytes)).unwrap().flags.bits(), 0x4);
    }

    #[test]
    fn object_body_layout() {
        // flags announce an object type but the GUID is cut short
        let mut bytes = vec![0x10, 0, 0, 0, 1, 0, 0, 0];
        bytes.extend_from_slice(&[9; 8]);
        assert!(matches!(
            ObjectAce::decode(&mut Reader::new(&bytes)),
            Err(SecurityError::Truncated { what: "object ACE body", .. })
        ));
        let ace = ObjectAce::new(0x10u32, None, None, well_known::WORLD);
        assert_eq!(
            ace.encode_to_vec().unwrap(),
            [0x10, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0]
        );
    }

    #[test]
    fn opaque_data_is_padded() {
        assert_eq!(
            ApplicationData::Opaque(vec![1, 2, 3]).normalized(),
            ApplicationData::Opaque(vec![1, 2, 3, 0])
        );
        assert_eq!(ApplicationData::Opaque(vec![0; 4]).normalized(), ApplicationData::None);
        assert_eq!(ApplicationData::Opaque(Vec::new()).normalized(), ApplicationData::None);
    }

    #[test]
    fn zero_data_is_none() {
        assert_eq!(
            ApplicationData::decode(DataKind::Expression, &[0, 0, 0, 0]).unwrap(),
            ApplicationData::None
        );
        assert_eq!(ApplicationData::decode(DataKind::Opaque, &[]).unwrap(), ApplicationData::None);
    }

    #[test]
    fn attribute_data_needs_one_value() {
        let two = ClaimAttribute::new(
            "Project",
            ClaimValueType::Int64,
            ClaimFlags::new(),
            vec![ClaimValue::Int64(1), ClaimValue::Int64(2)],
        )
        .unwrap();
        assert_eq!(
            ApplicationData::Attribute(two).fits(DataKind::Attribute),
            Err(SecurityError::TooManyValues { count: 2 })
        );
        assert_eq!(ApplicationData::Opaque(vec![1]).fits(DataKind::Expression), Ok(false));
    }
}
