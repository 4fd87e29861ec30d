use core::fmt::{self, Debug, Display};
use core::str::FromStr;

use binrw::{BinRead, BinWrite};
use parsing::{GuidComponents, text_to_wire};

use crate::{SecurityError, SecurityResult};

/// A GUID as it appears in object ACEs: sixteen bytes in wire order.
///
/// The canonical string groups the bytes 4-2-2-2-6 with the first three groups
/// byte-reversed relative to the wire.
///
/// # Examples
/// ```rust
/// # use win_security_descriptor::Guid;
/// let guid: Guid = "bf967aba-0de6-11d0-a285-00aa003049e2".parse().unwrap();
/// assert_eq!(guid.as_bytes()[..4], [0xba, 0x7a, 0x96, 0xbf]);
/// assert_eq!(guid.to_string(), "bf967aba-0de6-11d0-a285-00aa003049e2");
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BinRead, BinWrite)]
pub struct Guid([u8; 16]);

impl Guid {
    /// Binary length of a GUID.
    pub const LEN: usize = 16;

    /// Wraps sixteen wire-order bytes.
    #[must_use]
    #[inline]
    pub const fn from_wire(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Decodes a GUID occupying exactly the whole of `bytes`.
    ///
    /// # Errors
    /// [`SecurityError::MalformedGuid`] unless `bytes` is 16 bytes long.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> SecurityResult<Self> {
        <[u8; 16]>::try_from(bytes)
            .map(Self)
            .map_err(|_| SecurityError::MalformedGuid)
    }

    /// Wire-order bytes.
    #[must_use]
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl Display for Guid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = text_to_wire(self.0);
        for (i, byte) in text.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Debug for Guid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({self})")
    }
}

impl FromStr for Guid {
    type Err = SecurityError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = GuidComponents::from_str(s)?;
        Ok(Self(components.bytes))
    }
}

impl TryFrom<&[u8]> for Guid {
    type Error = SecurityError;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

impl From<[u8; 16]> for Guid {
    #[inline]
    fn from(value: [u8; 16]) -> Self {
        Self(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
pub(crate) mod test {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_guid() -> impl Strategy<Value = Guid> {
        any::<[u8; 16]>().prop_map(Guid::from_wire)
    }

    proptest! {
        #[test]
        fn string_round_trip(guid in arb_guid()) {
            let text = guid.to_string();
            prop_assert_eq!(text.len(), 36);
            prop_assert_eq!(text.parse::<Guid>().unwrap(), guid);
        }
    }

    #[test]
    fn wire_order() {
        let guid: Guid = "00112233-4455-6677-8899-aabbccddeeff".parse().unwrap();
        assert_eq!(
            guid.as_bytes(),
            &[
                0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
                0xee, 0xff
            ]
        );
        assert_eq!(Guid::from_bytes(guid.as_bytes()).unwrap(), guid);
    }

    #[test]
    fn malformed() {
        assert_eq!("not-a-guid".parse::<Guid>(), Err(SecurityError::MalformedGuid));
        assert_eq!(Guid::from_bytes(&[0; 15]), Err(SecurityError::MalformedGuid));
    }
}
