use parsing::MAX_IDENTIFIER_AUTHORITY;

/// 48-bit identifier authority of a SID, stored in network (big-endian) order
/// exactly as it appears on the wire.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SidIdentifierAuthority {
    /// Big-endian authority bytes.
    pub value: [u8; 6],
}

impl SidIdentifierAuthority {
    /// `S-1-0`
    pub const NULL_AUTHORITY: Self = Self::from_u64(0);
    /// `S-1-1`
    pub const SECURITY_WORLD_AUTHORITY: Self = Self::from_u64(1);
    /// `S-1-2`
    pub const SECURITY_LOCAL_AUTHORITY: Self = Self::from_u64(2);
    /// `S-1-3`
    pub const SECURITY_CREATOR_AUTHORITY: Self = Self::from_u64(3);
    /// `S-1-4`
    pub const SECURITY_NON_UNIQUE_AUTHORITY: Self = Self::from_u64(4);
    /// `S-1-5`
    pub const NT_AUTHORITY: Self = Self::from_u64(5);
    /// `S-1-9`
    pub const SECURITY_RESOURCE_MANAGER_AUTHORITY: Self = Self::from_u64(9);
    /// `S-1-15`
    pub const SECURITY_APP_PACKAGE_AUTHORITY: Self = Self::from_u64(15);
    /// `S-1-16`
    pub const SECURITY_MANDATORY_LABEL_AUTHORITY: Self = Self::from_u64(16);
    /// `S-1-19`
    pub const SECURITY_PROCESS_TRUST_AUTHORITY: Self = Self::from_u64(19);

    /// Builds an authority from the low 48 bits of `value`.
    #[must_use]
    #[inline]
    pub const fn from_u64(value: u64) -> Self {
        let bytes = (value & MAX_IDENTIFIER_AUTHORITY).to_be_bytes();
        Self {
            value: [bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]],
        }
    }

    /// The authority as a host-order integer.
    #[must_use]
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        let v = self.value;
        u64::from_be_bytes([0, 0, v[0], v[1], v[2], v[3], v[4], v[5]])
    }
}

impl From<[u8; 6]> for SidIdentifierAuthority {
    #[inline]
    fn from(value: [u8; 6]) -> Self {
        Self { value }
    }
}

impl From<SidIdentifierAuthority> for [u8; 6] {
    #[inline]
    fn from(value: SidIdentifierAuthority) -> Self {
        value.value
    }
}
