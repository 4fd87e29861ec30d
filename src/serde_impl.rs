use core::fmt::{self, Display};
use core::marker::PhantomData;
use core::str::FromStr;
use serde::{Deserialize, Deserializer, de};
use serde::{Serialize, Serializer, ser};

use crate::expression::ConditionalExpression;
use crate::{
    Ace, Acl, Bitset, ClaimAttribute, ConstSid, Guid, SecurityDescriptor, SecurityError, Sid,
};

impl Serialize for Sid {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_bytes(&self.to_bytes())
        }
    }
}

impl<const N: usize> Serialize for ConstSid<N> {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_sid().serialize(serializer)
    }
}

impl Serialize for Guid {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_bytes(self.as_bytes())
        }
    }
}

// Types with a canonical string and a binary form: string when human readable,
// bytes otherwise.
fn deserialize_text_or_bytes<'de, D, T>(
    deserializer: D,
    expecting: &'static str,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    for<'a> T: FromStr + TryFrom<&'a [u8]>,
{
    struct Visitor<T> {
        expecting: &'static str,
        _marker: PhantomData<T>,
    }

    impl<T> de::Visitor<'_> for Visitor<T>
    where
        for<'a> T: FromStr + TryFrom<&'a [u8]>,
    {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.expecting)
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            T::from_str(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            T::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Bytes(v), &self))
        }
    }

    let visitor = Visitor::<T> {
        expecting,
        _marker: PhantomData,
    };
    if deserializer.is_human_readable() {
        deserializer.deserialize_str(visitor)
    } else {
        deserializer.deserialize_bytes(visitor)
    }
}

impl<'de> Deserialize<'de> for Sid {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_text_or_bytes(
            deserializer,
            "a Windows SID as a string (e.g., \"S-1-...\") or as raw binary",
        )
    }
}

impl<'de> Deserialize<'de> for Guid {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_text_or_bytes(deserializer, "a GUID as a string or as 16 raw bytes")
    }
}

impl<const N: usize> Serialize for Bitset<N> {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de, const N: usize> Deserialize<'de> for Bitset<N> {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        let set = Self::from_bits(bits);
        if set.bits() != bits {
            return Err(de::Error::invalid_value(
                de::Unexpected::Unsigned(bits.into()),
                &"a value that fits the bitset width",
            ));
        }
        Ok(set)
    }
}

// Composite structures travel as their wire bytes and are re-validated by the
// binary decoder on the way in.
struct WireVisitor<T> {
    expecting: &'static str,
    _marker: PhantomData<T>,
}

impl<'de, T> de::Visitor<'de> for WireVisitor<T>
where
    for<'a> T: TryFrom<&'a [u8], Error = SecurityError>,
{
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expecting)
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        T::try_from(v).map_err(E::custom)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or_default());
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        T::try_from(bytes.as_slice()).map_err(de::Error::custom)
    }
}

fn serialize_wire<S, E>(serializer: S, bytes: Result<Vec<u8>, E>) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    E: Display,
{
    let bytes = bytes.map_err(ser::Error::custom)?;
    serializer.serialize_bytes(&bytes)
}

macro_rules! wire_serde {
    ($($ty:ty => $expecting:literal),* $(,)?) => {
        $(
            impl Serialize for $ty {
                #[inline]
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: Serializer,
                {
                    serialize_wire(serializer, self.to_bytes())
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                #[inline]
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    deserializer.deserialize_bytes(WireVisitor::<$ty> {
                        expecting: $expecting,
                        _marker: PhantomData,
                    })
                }
            }
        )*
    };
}

wire_serde! {
    ConditionalExpression => "an encoded conditional expression",
    ClaimAttribute => "an encoded claim security attribute",
    Ace => "an encoded access control entry",
    Acl => "an encoded access control list",
    SecurityDescriptor => "a self-relative security descriptor",
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod test {
    use crate::{AccessMask, Ace, Acl, ConstSid, Guid, SecurityDescriptor, Sid, well_known};
    use serde_test::{self, Configure, Token};

    const SID: ConstSid<3> =
        ConstSid::new(crate::SidIdentifierAuthority::NT_AUTHORITY, [5, 32, 544]);

    #[test]
    fn test_binary_sid() {
        let bytes = SID.to_sid().to_bytes();
        let leaked: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        serde_test::assert_tokens(&SID.to_sid().compact(), &[Token::Bytes(leaked)]);
    }

    #[test]
    fn test_human_sid() {
        serde_test::assert_ser_tokens(&SID.readable(), &[Token::String("S-1-5-5-32-544")]);
        serde_test::assert_tokens(&SID.to_sid().readable(), &[Token::Str("S-1-5-5-32-544")]);
    }

    #[test]
    fn test_guid() {
        let guid: Guid = "bf967aba-0de6-11d0-a285-00aa003049e2".parse().unwrap();
        serde_test::assert_tokens(
            &guid.readable(),
            &[Token::Str("bf967aba-0de6-11d0-a285-00aa003049e2")],
        );
    }

    #[test]
    fn test_bitset() {
        serde_test::assert_tokens(&AccessMask::from_bits(0x001F_01FF), &[Token::U32(0x001F_01FF)]);
        serde_test::assert_de_tokens_error::<crate::ace::AceFlags>(
            &[Token::U32(0x100)],
            "invalid value: integer `256`, expected a value that fits the bitset width",
        );
    }

    #[test]
    fn test_ace_as_bytes() {
        let ace = Ace::allowed(well_known::BUILTIN_ADMINISTRATORS, 0x001F_01FFu32);
        let bytes: &'static [u8] = Box::leak(ace.to_bytes().unwrap().into_boxed_slice());
        serde_test::assert_tokens(&ace, &[Token::Bytes(bytes)]);
    }

    #[test]
    fn test_invalid_acl_bytes() {
        serde_test::assert_de_tokens_error::<Acl>(
            &[Token::Bytes(&[9, 0, 8, 0, 0, 0, 0, 0])],
            "unsupported ACL revision 9",
        );
    }

    #[test]
    fn test_json_descriptor() {
        let mut sd = SecurityDescriptor::new().with_owner(well_known::LOCAL_SYSTEM);
        sd.add_allowed(well_known::EVERYONE, crate::meaning::rights::GENERIC_READ);
        let json = serde_json::to_string(&sd).unwrap();
        assert!(json.starts_with("[1,0,"));
        assert_eq!(serde_json::from_str::<SecurityDescriptor>(&json).unwrap(), sd);

        let sid: Sid = serde_json::from_str("\"S-1-5-18\"").unwrap();
        assert_eq!(sid, well_known::LOCAL_SYSTEM);
    }
}
