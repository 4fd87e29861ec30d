//! Text parsers shared by `win-security-descriptor` and its proc macros.
//!
//! Nothing here allocates: SID sub-authorities land in an [`ArrayVec`] and GUID
//! bytes in a fixed array, so the same code runs inside the proc-macro crate at
//! compile time.
#![cfg_attr(not(feature = "std"), no_std)]

use core::fmt::{self, Display};
use core::str::FromStr;

use arrayvec::ArrayVec;
use thiserror::Error;

/// Largest sub-authority count a SID can encode.
pub const MAX_SUBAUTHORITY_COUNT: u8 = 15;

/// Largest value a 48-bit identifier authority can hold.
pub const MAX_IDENTIFIER_AUTHORITY: u64 = 0xFFFF_FFFF_FFFF;

/// Components of a SID string `S-R-A(-S)*`.
pub struct SidComponents {
    /// The SID revision value, generally 1.
    pub revision: u8,
    /// The SID identifier authority value, big-endian.
    pub identifier_authority: [u8; 6],
    /// The SID sub-authority values.
    pub sub_authority: ArrayVec<u32, { MAX_SUBAUTHORITY_COUNT as usize }>,
}

/// Error type returned when parsing a SID string fails due to an invalid format.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSidFormat;

impl Display for InvalidSidFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invalid format for Sid")
    }
}

fn parse_authority(text: &str) -> Result<u64, InvalidSidFormat> {
    let value = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    }
    .map_err(|_| InvalidSidFormat)?;
    if value > MAX_IDENTIFIER_AUTHORITY {
        return Err(InvalidSidFormat);
    }
    Ok(value)
}

impl FromStr for SidComponents {
    type Err = InvalidSidFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut s_cmp = s.split('-');
        if !s_cmp
            .next()
            .is_some_and(|head| head.eq_ignore_ascii_case("s"))
        {
            return Err(InvalidSidFormat);
        }
        let revision = s_cmp
            .next()
            .ok_or(InvalidSidFormat)?
            .parse::<u8>()
            .map_err(|_| InvalidSidFormat)?;

        let authority = parse_authority(s_cmp.next().ok_or(InvalidSidFormat)?)?;
        let mut identifier_authority = [0u8; 6];
        for (slot, byte) in identifier_authority
            .iter_mut()
            .zip(authority.to_be_bytes().into_iter().skip(2))
        {
            *slot = byte;
        }

        let mut sub_authority = ArrayVec::new();
        for item in s_cmp {
            let item = item.parse::<u32>().map_err(|_| InvalidSidFormat)?;
            sub_authority.try_push(item).map_err(|_| InvalidSidFormat)?;
        }

        Ok(Self {
            revision,
            identifier_authority,
            sub_authority,
        })
    }
}

/// Raw bytes of a GUID parsed from `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`.
///
/// The bytes are already in wire order: the first three groups are stored
/// little-endian, the last two as written.
pub struct GuidComponents {
    /// Sixteen wire-order bytes.
    pub bytes: [u8; 16],
}

/// Error type returned when parsing a GUID string fails.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub struct InvalidGuidFormat;

impl Display for InvalidGuidFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invalid format for Guid")
    }
}

/// Hex digit count of each dash-separated group.
const GUID_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

fn hex_nibble(c: u8) -> Result<u8, InvalidGuidFormat> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(InvalidGuidFormat),
    }
}

impl FromStr for GuidComponents {
    type Err = InvalidGuidFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .unwrap_or(s);
        let mut groups = s.split('-');
        let mut text_order = ArrayVec::<u8, 16>::new();
        for expected in GUID_GROUPS {
            let group = groups.next().ok_or(InvalidGuidFormat)?.as_bytes();
            if group.len() != expected {
                return Err(InvalidGuidFormat);
            }
            for pair in group.chunks_exact(2) {
                let (hi, lo) = match pair {
                    [hi, lo] => (hex_nibble(*hi)?, hex_nibble(*lo)?),
                    _ => return Err(InvalidGuidFormat),
                };
                text_order
                    .try_push((hi << 4) | lo)
                    .map_err(|_| InvalidGuidFormat)?;
            }
        }
        if groups.next().is_some() {
            return Err(InvalidGuidFormat);
        }
        let text_order = text_order.into_inner().map_err(|_| InvalidGuidFormat)?;
        Ok(Self {
            bytes: text_to_wire(text_order),
        })
    }
}

/// Swaps the first three groups between text order and wire order.
///
/// The permutation is its own inverse.
#[must_use]
pub const fn text_to_wire(b: [u8; 16]) -> [u8; 16] {
    [
        b[3], b[2], b[1], b[0], b[5], b[4], b[7], b[6], b[8], b[9], b[10], b[11], b[12], b[13],
        b[14], b[15],
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex_authorities() {
        let sid: SidComponents = "S-1-5-32-544".parse().unwrap();
        assert_eq!(sid.revision, 1);
        assert_eq!(sid.identifier_authority, [0, 0, 0, 0, 0, 5]);
        assert_eq!(sid.sub_authority.as_slice(), &[32, 544]);

        let sid: SidComponents = "S-1-0x123456789ABC-7".parse().unwrap();
        assert_eq!(sid.identifier_authority, [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC]);
    }

    #[test]
    fn rejects_bad_sid_strings() {
        for text in ["", "S", "S-1", "X-1-5", "S-1-five", "S-1-5-x", "S-1-0x1000000000000"] {
            assert!(text.parse::<SidComponents>().is_err(), "{text} should not parse");
        }
        let sixteen = "S-1-5-1-2-3-4-5-6-7-8-9-10-11-12-13-14-15-16";
        assert!(sixteen.parse::<SidComponents>().is_err());
    }

    #[test]
    fn sid_without_sub_authorities() {
        let sid: SidComponents = "S-1-5".parse().unwrap();
        assert!(sid.sub_authority.is_empty());
    }

    #[test]
    fn guid_groups_are_byte_swapped() {
        let guid: GuidComponents = "00112233-4455-6677-8899-aabbccddeeff".parse().unwrap();
        assert_eq!(
            guid.bytes,
            [
                0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
                0xee, 0xff
            ]
        );
        let braced: GuidComponents = "{00112233-4455-6677-8899-AABBCCDDEEFF}".parse().unwrap();
        assert_eq!(braced.bytes, guid.bytes);
    }

    #[test]
    fn rejects_bad_guid_strings() {
        for text in [
            "",
            "00112233-4455-6677-8899",
            "00112233-4455-6677-8899-aabbccddeeff-00",
            "0011223-44556-6677-8899-aabbccddeeff",
            "0011223g-4455-6677-8899-aabbccddeeff",
        ] {
            assert!(text.parse::<GuidComponents>().is_err(), "{text} should not parse");
        }
    }
}
