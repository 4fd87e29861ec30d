//! Access control entries.
//!
//! ```text
//! type:u8  flags:u8  size:u16  body…  zero padding to a multiple of four
//! ```
//!
//! The body layout is chosen by the type code (see [`AceShape`]). `size`
//! covers header, body and padding.

mod builder;
mod kind;
mod payload;

use binrw::binrw;
use tracing::debug;

pub use builder::AceBuilder;
pub use kind::{AceShape, AceType, DataKind};
pub use payload::{AcePayload, ApplicationData, BasicAce, ObjectAce, ObjectAceFlags};

use crate::bitset::Bitset;
use crate::codec::{Decode, Encode, Reader, Record, align4, put_record, wire_u16};
use crate::expression::ConditionalExpression;
use crate::{AccessMask, ClaimAttribute, SecurityError, SecurityResult, Sid, well_known};

/// Inheritance and audit flags of an ACE (see [`crate::meaning::ACE_FLAGS`]).
pub type AceFlags = Bitset<8>;

const HEADER_LEN: usize = 4;
const INHERITED_ACE: usize = 4;

/// One access control entry.
///
/// # Examples
/// ```rust
/// # use win_security_descriptor::{Ace, AccessMask, Sid};
/// let admins: Sid = "S-1-5-32-544".parse().unwrap();
/// let ace = Ace::allowed(admins, AccessMask::from_bits(0x001F_01FF));
/// let bytes = ace.to_bytes().unwrap();
/// assert_eq!(bytes[..8], [0x00, 0x00, 0x18, 0x00, 0xFF, 0x01, 0x1F, 0x00]);
/// assert_eq!(Ace::from_bytes(&bytes).unwrap(), ace);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ace {
    ace_type: AceType,
    flags: AceFlags,
    payload: AcePayload,
}

impl Ace {
    /// Assembles an ACE, checking the payload against the type code.
    ///
    /// The payload is stored as it will be read back: the presence bits of
    /// object flags follow the GUIDs, opaque application data and unknown
    /// bodies are zero-padded to four bytes, and all-zero opaque data becomes
    /// [`ApplicationData::None`].
    ///
    /// # Errors
    /// - [`SecurityError::PayloadShape`] if the payload shape or its
    ///   application data does not belong to `ace_type`.
    /// - [`SecurityError::TooManyValues`] for resource-attribute data that
    ///   does not hold exactly one value.
    #[inline]
    pub fn new(ace_type: AceType, flags: AceFlags, payload: AcePayload) -> SecurityResult<Self> {
        let shape_error = SecurityError::PayloadShape {
            ace_type: ace_type.0,
        };
        if ace_type.shape() != payload.shape() {
            return Err(shape_error);
        }
        let payload = payload.normalized();
        if let Some(data) = payload.application_data() {
            if !data.fits(ace_type.data_kind())? {
                return Err(shape_error);
            }
        }
        Ok(Self {
            ace_type,
            flags,
            payload,
        })
    }

    /// `ACCESS_ALLOWED` entry without flags.
    #[must_use]
    #[inline]
    pub fn allowed(sid: impl Into<Sid>, mask: impl Into<AccessMask>) -> Self {
        Self::basic(AceType::ACCESS_ALLOWED, sid, mask)
    }

    /// `ACCESS_DENIED` entry without flags.
    #[must_use]
    #[inline]
    pub fn denied(sid: impl Into<Sid>, mask: impl Into<AccessMask>) -> Self {
        Self::basic(AceType::ACCESS_DENIED, sid, mask)
    }

    /// `SYSTEM_MANDATORY_LABEL` entry for an integrity level SID.
    #[must_use]
    #[inline]
    pub fn mandatory_label(level: impl Into<Sid>, policy: impl Into<AccessMask>) -> Self {
        Self::basic(AceType::SYSTEM_MANDATORY_LABEL, level, policy)
    }

    fn basic(ace_type: AceType, sid: impl Into<Sid>, mask: impl Into<AccessMask>) -> Self {
        Self {
            ace_type,
            flags: AceFlags::new(),
            payload: AcePayload::Basic(BasicAce::new(mask, sid)),
        }
    }

    /// `ACCESS_ALLOWED_CALLBACK` entry guarded by `condition`.
    #[must_use]
    #[inline]
    pub fn allowed_if(
        sid: impl Into<Sid>,
        mask: impl Into<AccessMask>,
        condition: ConditionalExpression,
    ) -> Self {
        Self {
            ace_type: AceType::ACCESS_ALLOWED_CALLBACK,
            flags: AceFlags::new(),
            payload: AcePayload::WithData(
                BasicAce::new(mask, sid),
                ApplicationData::Expression(condition),
            ),
        }
    }

    /// `SYSTEM_RESOURCE_ATTRIBUTE` entry for Everyone carrying `attribute`.
    ///
    /// # Errors
    /// [`SecurityError::TooManyValues`] unless `attribute` has exactly one value.
    #[inline]
    pub fn resource_attribute(attribute: ClaimAttribute) -> SecurityResult<Self> {
        Self::new(
            AceType::SYSTEM_RESOURCE_ATTRIBUTE,
            AceFlags::new(),
            AcePayload::WithData(
                BasicAce::new(AccessMask::new(), well_known::EVERYONE),
                ApplicationData::Attribute(attribute),
            ),
        )
    }

    /// Type code.
    #[must_use]
    #[inline]
    pub const fn ace_type(&self) -> AceType {
        self.ace_type
    }

    /// Header flags.
    #[must_use]
    #[inline]
    pub const fn flags(&self) -> AceFlags {
        self.flags
    }

    /// Replaces the header flags.
    #[inline]
    pub const fn set_flags(&mut self, flags: AceFlags) {
        self.flags = flags;
    }

    /// Builder-style [`Ace::set_flags`].
    #[must_use]
    #[inline]
    pub const fn with_flags(mut self, flags: AceFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Whether `INHERITED_ACE` is set.
    #[must_use]
    #[inline]
    pub const fn is_inherited(&self) -> bool {
        self.flags.get(INHERITED_ACE)
    }

    /// Body.
    #[must_use]
    #[inline]
    pub const fn payload(&self) -> &AcePayload {
        &self.payload
    }

    /// Access mask, `None` for an unknown type.
    #[must_use]
    #[inline]
    pub const fn mask(&self) -> Option<AccessMask> {
        self.payload.mask()
    }

    /// Trustee, `None` for an unknown type.
    #[must_use]
    #[inline]
    pub const fn sid(&self) -> Option<&Sid> {
        self.payload.sid()
    }

    /// Application data, `None` for shapes without it.
    #[must_use]
    #[inline]
    pub const fn application_data(&self) -> Option<&ApplicationData> {
        self.payload.application_data()
    }

    /// Encoded size, padding included.
    #[must_use]
    #[inline]
    pub fn size(&self) -> usize {
        self.encoded_len()
    }

    /// Decodes one ACE from the start of `bytes`; trailing bytes are ignored.
    ///
    /// # Errors
    /// - [`SecurityError::InvalidSize`] if the declared size is below 4.
    /// - [`SecurityError::TruncatedAce`] if `bytes` is shorter than declared.
    /// - Any error of the body, SID or application data decoders.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> SecurityResult<Self> {
        Self::decode(&mut Reader::new(bytes))
    }

    /// Binary form, padded to a multiple of four bytes.
    ///
    /// # Errors
    /// [`SecurityError::InvalidSize`] if the ACE does not fit in 65535 bytes.
    #[inline]
    pub fn to_bytes(&self) -> SecurityResult<Vec<u8>> {
        self.encode_to_vec()
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone)]
struct AceHeader {
    ace_type: u8,
    flags: u8,
    #[br(assert(
        usize::from(size) >= HEADER_LEN,
        SecurityError::InvalidSize { what: "ACE", size: usize::from(size) }
    ))]
    size: u16,
}

impl Record for AceHeader {
    const WHAT: &'static str = "ACE header";
    const MIN_LEN: usize = HEADER_LEN;
}

impl Encode for Ace {
    fn encoded_len(&self) -> usize {
        align4(HEADER_LEN + self.payload.encoded_len())
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        let size = self.encoded_len();
        let start = out.len();
        let header = AceHeader {
            ace_type: self.ace_type.into(),
            // eight-bit word
            flags: u8::try_from(self.flags.bits()).unwrap_or_default(),
            size: wire_u16(size, "ACE")?,
        };
        put_record(out, &header)?;
        self.payload.encode_into(out)?;
        out.resize(start + size, 0);
        Ok(())
    }
}

impl Decode for Ace {
    fn decode(reader: &mut Reader<'_>) -> SecurityResult<Self> {
        let header = reader.read_record::<AceHeader>()?;
        let ace_type = AceType(header.ace_type);
        let flags = AceFlags::from_bits(header.flags.into());
        let size = header.size;
        let body_len = usize::from(size) - HEADER_LEN;
        if body_len > reader.remaining() {
            return Err(SecurityError::TruncatedAce {
                declared: size,
                available: reader.remaining() + HEADER_LEN,
            });
        }
        let body = reader.take(body_len, "ACE body")?;
        if !ace_type.is_known() {
            debug!(%ace_type, size, "keeping body of unknown ACE type");
        }
        let payload = AcePayload::decode(ace_type.shape(), ace_type.data_kind(), body)?;
        Self::new(ace_type, flags, payload)
    }
}

impl TryFrom<&[u8]> for Ace {
    type Error = SecurityError;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
pub(crate) mod test {
    use super::*;
    use crate::claim::test::arb_claim_attribute;
    use crate::expression::test::arb_expression;
    use crate::guid::test::arb_guid;
    use crate::sid::test::arb_sid;
    use crate::{ClaimFlags, ClaimValue, ClaimValueType, Guid, meaning, well_known};
    use proptest::prelude::*;

    fn arb_object(sid: Sid, mask: u32) -> impl Strategy<Value = ObjectAce> {
        (proptest::option::of(arb_guid()), proptest::option::of(arb_guid())).prop_map(
            move |(object_type, inherited_object_type)| {
                ObjectAce::new(mask, object_type, inherited_object_type, sid.clone())
            },
        )
    }

    pub fn arb_ace() -> impl Strategy<Value = Ace> {
        let basic = (
            prop_oneof![
                Just(AceType::ACCESS_ALLOWED),
                Just(AceType::ACCESS_DENIED),
                Just(AceType::SYSTEM_AUDIT),
                Just(AceType::SYSTEM_MANDATORY_LABEL),
            ],
            arb_sid(),
            any::<u32>(),
        )
            .prop_map(|(ace_type, sid, mask)| {
                Ace::new(ace_type, AceFlags::new(), AcePayload::Basic(BasicAce::new(mask, sid)))
                    .unwrap()
            });
        let object = (
            prop_oneof![Just(AceType::ACCESS_ALLOWED_OBJECT), Just(AceType::ACCESS_DENIED_OBJECT)],
            arb_sid(),
            any::<u32>(),
        )
            .prop_flat_map(|(ace_type, sid, mask)| {
                arb_object(sid, mask).prop_map(move |object| {
                    Ace::new(ace_type, AceFlags::new(), AcePayload::Object(object)).unwrap()
                })
            });
        let callback = (arb_sid(), any::<u32>(), proptest::option::of(arb_expression())).prop_map(
            |(sid, mask, expression)| {
                let data = expression.map_or(ApplicationData::None, ApplicationData::Expression);
                Ace::new(
                    AceType::ACCESS_DENIED_CALLBACK,
                    AceFlags::new(),
                    AcePayload::WithData(BasicAce::new(mask, sid), data),
                )
                .unwrap()
            },
        );
        let callback_object = (arb_sid(), any::<u32>(), arb_expression()).prop_flat_map(
            |(sid, mask, expression)| {
                arb_object(sid, mask).prop_map(move |object| {
                    Ace::new(
                        AceType::ACCESS_ALLOWED_CALLBACK_OBJECT,
                        AceFlags::new(),
                        AcePayload::ObjectWithData(
                            object,
                            ApplicationData::Expression(expression.clone()),
                        ),
                    )
                    .unwrap()
                })
            },
        );
        let attribute = arb_claim_attribute()
            .prop_filter("one value", |a| a.values().len() == 1)
            .prop_map(|a| Ace::resource_attribute(a).unwrap());
        (prop_oneof![basic, object, callback, callback_object, attribute], any::<u8>())
            .prop_map(|(ace, flags)| ace.with_flags(AceFlags::from_bits(flags.into())))
    }

    proptest! {
        #[test]
        fn binary_round_trip(ace in arb_ace()) {
            let bytes = ace.to_bytes().unwrap();
            prop_assert_eq!(bytes.len() % 4, 0);
            prop_assert_eq!(usize::from(u16::from_le_bytes([bytes[2], bytes[3]])), bytes.len());
            prop_assert_eq!(Ace::from_bytes(&bytes).unwrap(), ace);
        }
    }

    #[test]
    fn allow_ace_layout() {
        let ace = Ace::allowed(well_known::BUILTIN_ADMINISTRATORS, 0x001F_01FFu32);
        let bytes = ace.to_bytes().unwrap();
        #[rustfmt::skip]
        assert_eq!(bytes, [
            0x00, 0x00, 0x18, 0x00,
            0xFF, 0x01, 0x1F, 0x00,
            1, 2, 0, 0, 0, 0, 0, 5, 32, 0, 0, 0, 0x20, 0x02, 0, 0,
        ]);
    }

    #[test]
    fn declared_size_checks() {
        assert_eq!(
            Ace::from_bytes(&[0, 0, 0, 0]),
            Err(SecurityError::InvalidSize { what: "ACE", size: 0 })
        );
        let bytes = Ace::allowed(well_known::WORLD, 1u32).to_bytes().unwrap();
        let short = bytes.get(..bytes.len() - 4).unwrap();
        assert_eq!(
            Ace::from_bytes(short),
            Err(SecurityError::TruncatedAce {
                declared: 20,
                available: 16
            })
        );
    }

    #[test]
    fn unknown_type_passes_through() {
        let bytes = [0x42, 0x03, 8, 0, 1, 2, 3, 4];
        let ace = Ace::from_bytes(&bytes).unwrap();
        assert_eq!(ace.ace_type(), AceType(0x42));
        assert_eq!(ace.payload(), &AcePayload::Unknown(vec![1, 2, 3, 4]));
        assert_eq!(ace.sid(), None);
        assert_eq!(ace.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn unaligned_bodies_round_trip() {
        let ace =
            Ace::new(AceType(0x42), AceFlags::new(), AcePayload::Unknown(vec![9; 5])).unwrap();
        assert_eq!(ace.payload(), &AcePayload::Unknown(vec![9, 9, 9, 9, 9, 0, 0, 0]));
        assert_eq!(Ace::from_bytes(&ace.to_bytes().unwrap()).unwrap(), ace);

        for data in [vec![1, 2, 3], vec![0; 4], vec![5, 0, 0, 0, 0, 0]] {
            let ace = AceBuilder::new(AceType::SYSTEM_AUDIT_OBJECT)
                .sid(well_known::WORLD)
                .mask(1u32)
                .application_data(ApplicationData::Opaque(data))
                .build()
                .unwrap();
            let bytes = ace.to_bytes().unwrap();
            assert_eq!(bytes.len(), ace.size());
            assert_eq!(Ace::from_bytes(&bytes).unwrap(), ace);
        }
    }

    #[test]
    fn reserved_object_flags_round_trip() {
        let ace = AceBuilder::new(AceType::ACCESS_DENIED_OBJECT)
            .sid(well_known::WORLD)
            .mask(1u32)
            .object_flags(0x0000_0005u32)
            .build()
            .unwrap();
        // bit 0 cleared: no object type GUID was given
        assert_eq!(ace.payload().object().unwrap().flags.bits(), 0x4);
        let bytes = ace.to_bytes().unwrap();
        assert_eq!(bytes.get(8..12), Some(&[4u8, 0, 0, 0][..]));
        assert_eq!(Ace::from_bytes(&bytes).unwrap(), ace);
    }

    fn callback_body(tokens: &[u8]) -> Vec<u8> {
        let mut body = 1u32.to_le_bytes().to_vec();
        body.extend_from_slice(&well_known::WORLD.to_sid().to_bytes());
        body.extend_from_slice(b"artx");
        body.extend_from_slice(tokens);
        body.resize(align4(body.len()), 0);
        body
    }

    fn envelope(ace_type: AceType, body: &[u8]) -> Vec<u8> {
        let mut bytes = vec![ace_type.0, 0];
        bytes.extend_from_slice(&u16::try_from(body.len() + 4).unwrap().to_le_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn deeply_nested_condition_is_rejected() {
        let mut tokens = vec![0x04, 1, 0, 0, 0, 0, 0, 0, 0, 3, 2];
        tokens.extend(core::iter::repeat_n(0xa2, 4096));
        let bytes = envelope(AceType::ACCESS_ALLOWED_CALLBACK, &callback_body(&tokens));
        assert_eq!(
            Ace::from_bytes(&bytes),
            Err(SecurityError::MalformedExpression("expression nested too deeply"))
        );
    }

    #[test]
    fn decoded_resource_attribute_needs_one_value() {
        let two = ClaimAttribute::new(
            "Project",
            ClaimValueType::Int64,
            ClaimFlags::new(),
            vec![ClaimValue::Int64(1), ClaimValue::Int64(2)],
        )
        .unwrap();
        let mut body = 0u32.to_le_bytes().to_vec();
        body.extend_from_slice(&well_known::EVERYONE.to_sid().to_bytes());
        body.extend_from_slice(&two.to_bytes().unwrap());
        body.resize(align4(body.len()), 0);
        let bytes = envelope(AceType::SYSTEM_RESOURCE_ATTRIBUTE, &body);
        assert_eq!(Ace::from_bytes(&bytes), Err(SecurityError::TooManyValues { count: 2 }));
    }

    #[test]
    fn shape_must_match_type() {
        let err = Ace::new(
            AceType::ACCESS_ALLOWED_OBJECT,
            AceFlags::new(),
            AcePayload::Basic(BasicAce::new(0u32, well_known::WORLD)),
        )
        .unwrap_err();
        assert_eq!(err, SecurityError::PayloadShape { ace_type: 0x05 });

        let err = Ace::new(
            AceType::SYSTEM_ALARM_CALLBACK,
            AceFlags::new(),
            AcePayload::WithData(
                BasicAce::new(0u32, well_known::WORLD),
                ApplicationData::Expression(ConditionalExpression::new(
                    crate::expression::Operator::int(1),
                )),
            ),
        )
        .unwrap_err();
        assert_eq!(err, SecurityError::PayloadShape { ace_type: 0x0E });
    }

    #[test]
    fn resource_attribute_needs_one_value() {
        let empty =
            ClaimAttribute::new("Project", ClaimValueType::String, ClaimFlags::new(), vec![])
                .unwrap();
        assert_eq!(
            Ace::resource_attribute(empty),
            Err(SecurityError::TooManyValues { count: 0 })
        );
        let single = ClaimAttribute::new(
            "Project",
            ClaimValueType::String,
            ClaimFlags::new(),
            vec![ClaimValue::String("Apollo".into())],
        )
        .unwrap();
        let ace = Ace::resource_attribute(single.clone()).unwrap();
        assert_eq!(ace.application_data(), Some(&ApplicationData::Attribute(single)));
    }

    #[test]
    fn object_ace_without_guids() {
        let ace = Ace::new(
            AceType::ACCESS_ALLOWED_OBJECT,
            AceFlags::from_named_bits(
                &meaning::ACE_FLAGS,
                ["CONTAINER_INHERIT_ACE", "INHERITED_ACE"],
            )
            .unwrap(),
            AcePayload::Object(ObjectAce::new(
                0x100u32,
                Some(Guid::from_wire([0xAB; 16])),
                None,
                well_known::AUTHENTICATED_USERS,
            )),
        )
        .unwrap();
        assert!(ace.is_inherited());
        let bytes = ace.to_bytes().unwrap();
        assert_eq!(bytes.len(), 4 + 4 + 4 + 16 + 12);
        assert_eq!(Ace::from_bytes(&bytes).unwrap(), ace);
    }
}
