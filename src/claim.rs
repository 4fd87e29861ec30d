//! Claim security attributes (`CLAIM_SECURITY_ATTRIBUTE_RELATIVE_V1`).
//!
//! Self-relative layout, every offset counted from the start of the attribute:
//!
//! ```text
//! name_offset:u32  value_type:u16  reserved:u16  flags:u32  value_count:u32  values_offset:u32
//! name: UTF-16LE, NUL terminated
//! values: value_count entries, shape chosen by value_type
//!   Int64 / Uint64 / Boolean   8-byte little-endian slot
//!   String                     UTF-16LE, NUL terminated
//!   Sid / OctetString          length:u32 + bytes
//!   Fqbn                       name_length:u32 (UTF-16 units) + name, version implied
//! ```
//!
//! The same encoding is the application data of resource-attribute ACEs.

use binrw::binrw;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::bitset::Bitset;
use crate::codec::{
    Decode, Encode, Reader, Record, put_record, put_u16, put_u32, put_u64, put_utf16, utf16_len,
    utf16_to_string, utf16z_to_string, wire_u32,
};
use crate::{SecurityError, SecurityResult, Sid};

/// Flags word of a claim attribute (see [`crate::meaning::CLAIM_FLAGS`]).
pub type ClaimFlags = Bitset<32>;

/// Size of the fixed attribute header.
const HEADER_LEN: usize = 20;

/// Declared type shared by every value of a claim attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u16)]
pub enum ClaimValueType {
    /// Signed 64-bit integers.
    Int64 = 0x0001,
    /// Unsigned 64-bit integers.
    Uint64 = 0x0002,
    /// Strings.
    String = 0x0003,
    /// Fully qualified binary names.
    Fqbn = 0x0004,
    /// SIDs.
    Sid = 0x0005,
    /// Booleans.
    Boolean = 0x0006,
    /// Raw byte strings.
    OctetString = 0x0010,
}

impl ClaimValueType {
    /// Human-readable name used in errors.
    #[must_use]
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int64 => "Int64",
            Self::Uint64 => "Uint64",
            Self::String => "String",
            Self::Fqbn => "Fqbn",
            Self::Sid => "Sid",
            Self::Boolean => "Boolean",
            Self::OctetString => "OctetString",
        }
    }
}

/// A fully qualified binary name.
///
/// The wire form stores only the name; the version is always
/// [`Fqbn::VERSION`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fqbn {
    /// Fully qualified name.
    pub name: String,
}

impl Fqbn {
    /// Version every decoded name carries.
    pub const VERSION: u64 = 1;

    /// Wraps a name.
    #[must_use]
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Binary version, always [`Fqbn::VERSION`].
    #[must_use]
    #[inline]
    pub const fn version(&self) -> u64 {
        Self::VERSION
    }
}

/// One claim value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClaimValue {
    /// Signed integer.
    Int64(i64),
    /// Unsigned integer.
    Uint64(u64),
    /// Boolean.
    Boolean(bool),
    /// String.
    String(String),
    /// SID.
    Sid(Sid),
    /// Raw bytes.
    OctetString(Vec<u8>),
    /// Fully qualified binary name.
    Fqbn(Fqbn),
}

impl ClaimValue {
    /// Value type this value belongs to.
    #[must_use]
    #[inline]
    pub const fn value_type(&self) -> ClaimValueType {
        match self {
            Self::Int64(_) => ClaimValueType::Int64,
            Self::Uint64(_) => ClaimValueType::Uint64,
            Self::Boolean(_) => ClaimValueType::Boolean,
            Self::String(_) => ClaimValueType::String,
            Self::Sid(_) => ClaimValueType::Sid,
            Self::OctetString(_) => ClaimValueType::OctetString,
            Self::Fqbn(_) => ClaimValueType::Fqbn,
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::Int64(_) | Self::Uint64(_) | Self::Boolean(_) => 8,
            Self::String(text) => utf16_len(text) + 2,
            Self::Sid(sid) => 4 + sid.binary_len(),
            Self::OctetString(bytes) => 4 + bytes.len(),
            Self::Fqbn(fqbn) => 4 + utf16_len(&fqbn.name),
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        match self {
            Self::Int64(value) => out.extend_from_slice(&value.to_le_bytes()),
            Self::Uint64(value) => put_u64(out, *value),
            Self::Boolean(value) => put_u64(out, u64::from(*value)),
            Self::String(text) => {
                put_utf16(out, text);
                put_u16(out, 0);
            }
            Self::Sid(sid) => {
                put_u32(out, wire_u32(sid.binary_len(), "claim SID")?);
                sid.encode_into(out)?;
            }
            Self::OctetString(bytes) => {
                put_u32(out, wire_u32(bytes.len(), "claim octet string")?);
                out.extend_from_slice(bytes);
            }
            Self::Fqbn(fqbn) => {
                put_u32(out, wire_u32(fqbn.name.encode_utf16().count(), "claim FQBN")?);
                put_utf16(out, &fqbn.name);
            }
        }
        Ok(())
    }

    fn decode(value_type: ClaimValueType, reader: &mut Reader<'_>) -> SecurityResult<Self> {
        Ok(match value_type {
            ClaimValueType::Int64 => {
                Self::Int64(i64::from_le_bytes(reader.read_array("claim value")?))
            }
            ClaimValueType::Uint64 => Self::Uint64(reader.read_u64("claim value")?),
            ClaimValueType::Boolean => Self::Boolean(reader.read_u64("claim value")? != 0),
            ClaimValueType::String => {
                let (text, consumed) = utf16z_to_string(reader.clone().rest())?;
                reader.take(consumed, "claim value")?;
                Self::String(text)
            }
            ClaimValueType::Sid => Self::Sid(Sid::from_bytes(reader.read_prefixed("claim SID")?)?),
            ClaimValueType::OctetString => {
                Self::OctetString(reader.read_prefixed("claim octet string")?.to_vec())
            }
            ClaimValueType::Fqbn => {
                let units = reader.read_u32("claim FQBN")? as usize;
                let name = reader.take(units.saturating_mul(2), "claim FQBN")?;
                Self::Fqbn(Fqbn::new(utf16_to_string(name)?))
            }
        })
    }
}

/// A named, typed, multi-valued security attribute.
///
/// All values share the declared [`ClaimValueType`]; [`ClaimAttribute::new`]
/// refuses mixed lists.
///
/// # Examples
/// ```rust
/// # use win_security_descriptor::{ClaimAttribute, ClaimFlags, ClaimValue, ClaimValueType};
/// let department = ClaimAttribute::new(
///     "Department",
///     ClaimValueType::String,
///     ClaimFlags::new(),
///     vec![ClaimValue::String("Finance".into())],
/// ).unwrap();
/// let bytes = department.to_bytes().unwrap();
/// assert_eq!(ClaimAttribute::from_bytes(&bytes).unwrap(), department);
///
/// let mixed = ClaimAttribute::new(
///     "Level",
///     ClaimValueType::Int64,
///     ClaimFlags::new(),
///     vec![ClaimValue::Int64(1), ClaimValue::Boolean(true)],
/// );
/// assert!(mixed.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaimAttribute {
    name: String,
    value_type: ClaimValueType,
    flags: ClaimFlags,
    values: Vec<ClaimValue>,
}

impl ClaimAttribute {
    /// Builds an attribute, checking every value against `value_type`.
    ///
    /// # Errors
    /// [`SecurityError::TypeMismatch`] for the first value of another type.
    #[inline]
    pub fn new(
        name: impl Into<String>,
        value_type: ClaimValueType,
        flags: ClaimFlags,
        values: Vec<ClaimValue>,
    ) -> SecurityResult<Self> {
        if let Some(value) = values.iter().find(|v| v.value_type() != value_type) {
            return Err(SecurityError::TypeMismatch {
                expected: value_type.name(),
                found: value.value_type().name(),
            });
        }
        Ok(Self {
            name: name.into(),
            value_type,
            flags,
            values,
        })
    }

    /// Attribute name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type.
    #[must_use]
    #[inline]
    pub const fn value_type(&self) -> ClaimValueType {
        self.value_type
    }

    /// Attribute flags.
    #[must_use]
    #[inline]
    pub const fn flags(&self) -> ClaimFlags {
        self.flags
    }

    /// The values, all of [`ClaimAttribute::value_type`].
    #[must_use]
    #[inline]
    pub fn values(&self) -> &[ClaimValue] {
        &self.values
    }

    /// Decodes an attribute from the start of `bytes`; trailing bytes are ignored.
    ///
    /// # Errors
    /// [`SecurityError::TypeMismatch`] for an unknown value type,
    /// [`SecurityError::Truncated`] or [`SecurityError::InvalidUtf16`] for a
    /// damaged buffer.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> SecurityResult<Self> {
        Self::decode(&mut Reader::new(bytes))
    }

    /// Binary form of the attribute.
    ///
    /// # Errors
    /// [`SecurityError::InvalidSize`] if a length does not fit its `u32` field.
    #[inline]
    pub fn to_bytes(&self) -> SecurityResult<Vec<u8>> {
        self.encode_to_vec()
    }

    fn name_len(&self) -> usize {
        utf16_len(&self.name) + 2
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone)]
struct ClaimHeader {
    name_offset: u32,
    value_type: u16,
    #[bw(calc = 0)]
    _reserved: u16,
    flags: u32,
    value_count: u32,
    values_offset: u32,
}

impl Record for ClaimHeader {
    const WHAT: &'static str = "claim attribute";
    const MIN_LEN: usize = HEADER_LEN;
}

impl Encode for ClaimAttribute {
    fn encoded_len(&self) -> usize {
        HEADER_LEN
            + self.name_len()
            + self.values.iter().map(ClaimValue::encoded_len).sum::<usize>()
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        let header = ClaimHeader {
            name_offset: wire_u32(HEADER_LEN, "claim name offset")?,
            value_type: self.value_type.into(),
            flags: self.flags.bits(),
            value_count: wire_u32(self.values.len(), "claim value count")?,
            values_offset: wire_u32(HEADER_LEN + self.name_len(), "claim values offset")?,
        };
        put_record(out, &header)?;
        put_utf16(out, &self.name);
        put_u16(out, 0);
        for value in &self.values {
            value.encode_into(out)?;
        }
        Ok(())
    }
}

impl Decode for ClaimAttribute {
    fn decode(reader: &mut Reader<'_>) -> SecurityResult<Self> {
        let start = reader.position();
        let whole = reader.clone().rest();
        let header = reader.read_record::<ClaimHeader>()?;
        let value_type =
            ClaimValueType::try_from(header.value_type).map_err(|_| SecurityError::TypeMismatch {
                expected: "claim value type",
                found: "unknown",
            })?;
        let flags = ClaimFlags::from_bits(header.flags);
        let name_offset = header.name_offset as usize;
        let value_count = header.value_count;
        let values_offset = header.values_offset as usize;

        let mut name_reader = Reader::new(whole);
        name_reader.take(name_offset, "claim name")?;
        let (name, _) = utf16z_to_string(name_reader.rest())?;

        let mut values_reader = Reader::new(whole);
        values_reader.take(values_offset, "claim values")?;
        let mut values = Vec::new();
        for _ in 0..value_count {
            values.push(ClaimValue::decode(value_type, &mut values_reader)?);
        }
        // leave the outer cursor after the last value
        let header_read = reader.position() - start;
        reader.take(
            values_reader.position().saturating_sub(header_read),
            "claim attribute",
        )?;
        Ok(Self {
            name,
            value_type,
            flags,
            values,
        })
    }
}

impl TryFrom<&[u8]> for ClaimAttribute {
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
    use crate::meaning;
    use crate::sid::test::arb_sid;
    use proptest::prelude::*;

    fn arb_values() -> impl Strategy<Value = (ClaimValueType, Vec<ClaimValue>)> {
        prop_oneof![
            proptest::collection::vec(any::<i64>().prop_map(ClaimValue::Int64), 0..4)
                .prop_map(|v| (ClaimValueType::Int64, v)),
            proptest::collection::vec(any::<u64>().prop_map(ClaimValue::Uint64), 0..4)
                .prop_map(|v| (ClaimValueType::Uint64, v)),
            proptest::collection::vec(any::<bool>().prop_map(ClaimValue::Boolean), 0..4)
                .prop_map(|v| (ClaimValueType::Boolean, v)),
            proptest::collection::vec("[a-zA-Z0-9 é]{0,12}".prop_map(ClaimValue::String), 0..4)
                .prop_map(|v| (ClaimValueType::String, v)),
            proptest::collection::vec(arb_sid().prop_map(ClaimValue::Sid), 0..3)
                .prop_map(|v| (ClaimValueType::Sid, v)),
            proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 0..9).prop_map(ClaimValue::OctetString),
                0..3
            )
            .prop_map(|v| (ClaimValueType::OctetString, v)),
            proptest::collection::vec(
                "[A-Z=,]{0,16}".prop_map(|name| ClaimValue::Fqbn(Fqbn::new(name))),
                0..3
            )
            .prop_map(|v| (ClaimValueType::Fqbn, v)),
        ]
    }

    prop_compose! {
        pub fn arb_claim_attribute()
            (name in "[A-Za-z][A-Za-z0-9._]{0,15}",
             (value_type, values) in arb_values(),
             flags in 0u32..0x40)
            -> ClaimAttribute {
            ClaimAttribute::new(name, value_type, ClaimFlags::from_bits(flags), values).unwrap()
        }
    }

    proptest! {
        #[test]
        fn binary_round_trip(attribute in arb_claim_attribute()) {
            let bytes = attribute.to_bytes().unwrap();
            prop_assert_eq!(bytes.len(), attribute.encoded_len());
            prop_assert_eq!(ClaimAttribute::from_bytes(&bytes).unwrap(), attribute);
        }
    }

    #[test]
    fn header_layout() {
        let attribute = ClaimAttribute::new(
            "ab",
            ClaimValueType::Uint64,
            ClaimFlags::from_named_bits(
                &meaning::CLAIM_FLAGS,
                ["CLAIM_SECURITY_ATTRIBUTE_MANDATORY"],
            )
            .unwrap(),
            vec![ClaimValue::Uint64(7)],
        )
        .unwrap();
        let bytes = attribute.to_bytes().unwrap();
        #[rustfmt::skip]
        assert_eq!(bytes, [
            20, 0, 0, 0,         // name offset
            2, 0, 0, 0,          // value type + reserved
            0x20, 0, 0, 0,       // flags
            1, 0, 0, 0,          // value count
            26, 0, 0, 0,         // values offset
            b'a', 0, b'b', 0, 0, 0,
            7, 0, 0, 0, 0, 0, 0, 0,
        ]);
    }

    #[test]
    fn fqbn_value_layout() {
        let attribute = ClaimAttribute::new(
            "f",
            ClaimValueType::Fqbn,
            ClaimFlags::new(),
            vec![ClaimValue::Fqbn(Fqbn::new("O=A"))],
        )
        .unwrap();
        let bytes = attribute.to_bytes().unwrap();
        assert_eq!(bytes.len(), attribute.encoded_len());
        // values start after the header and "f\0"
        #[rustfmt::skip]
        assert_eq!(bytes.get(24..), Some(&[
            3, 0, 0, 0,
            b'O', 0, b'=', 0, b'A', 0,
        ][..]));
        let decoded = ClaimAttribute::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.values(), [ClaimValue::Fqbn(Fqbn::new("O=A"))]);
        assert!(decoded.values().iter().all(|value| match value {
            ClaimValue::Fqbn(fqbn) => fqbn.version() == 1,
            _ => false,
        }));
    }

    #[test]
    fn mixed_values_are_rejected() {
        let err = ClaimAttribute::new(
            "x",
            ClaimValueType::String,
            ClaimFlags::new(),
            vec![ClaimValue::String("a".into()), ClaimValue::Int64(1)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            SecurityError::TypeMismatch {
                expected: "String",
                found: "Int64"
            }
        );
    }

    #[test]
    fn unknown_value_type_is_rejected() {
        let mut bytes = ClaimAttribute::new("x", ClaimValueType::Int64, ClaimFlags::new(), vec![])
            .unwrap()
            .to_bytes()
            .unwrap();
        if let Some(slot) = bytes.get_mut(4) {
            *slot = 0x42;
        }
        assert!(matches!(
            ClaimAttribute::from_bytes(&bytes),
            Err(SecurityError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn truncated_values_fail() {
        let bytes = ClaimAttribute::new(
            "x",
            ClaimValueType::Int64,
            ClaimFlags::new(),
            vec![ClaimValue::Int64(-1)],
        )
        .unwrap()
        .to_bytes()
        .unwrap();
        let short = bytes.get(..bytes.len() - 1).unwrap();
        assert!(matches!(
            ClaimAttribute::from_bytes(short),
            Err(SecurityError::Truncated { .. })
        ));
    }
}
