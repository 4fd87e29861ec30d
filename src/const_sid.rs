use crate::{Sid, SidIdentifierAuthority, sid::MAX_SUBAUTHORITY_COUNT};
use core::fmt::{self, Display};

/// Fixed-size, compile-time Security Identifier (SID).
///
/// `ConstSid<N>` stores the SID parts with exactly `N` sub-authorities so it can
/// live in `const` and `static` items. Convert it to an owned [`Sid`] with
/// [`ConstSid::to_sid`] or `From`.
///
/// # Invariants
/// - `N` is at most 15; larger values fail to compile.
///
/// # Examples
/// ```rust
/// # use win_security_descriptor::{ConstSid, Sid, SidIdentifierAuthority};
/// const ADMIN_ALIAS: ConstSid<2> = ConstSid::new(
///     SidIdentifierAuthority::NT_AUTHORITY,
///     [32, 544],
/// );
/// assert_eq!(ADMIN_ALIAS.to_string(), "S-1-5-32-544");
/// let owned: Sid = ADMIN_ALIAS.into();
/// assert_eq!(owned, ADMIN_ALIAS);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstSid<const N: usize> {
    /// 6-byte identifier authority.
    pub identifier_authority: SidIdentifierAuthority,
    /// Fixed-size list of sub-authorities.
    pub sub_authority: [u32; N],
}

impl<const N: usize> ConstSid<N> {
    const COUNT_CHECK: () = assert!(
        N <= MAX_SUBAUTHORITY_COUNT as usize,
        "a SID holds at most 15 sub-authorities"
    );

    /// Creates a new `ConstSid<N>` with revision 1.
    #[must_use]
    #[inline]
    pub const fn new(
        identifier_authority: SidIdentifierAuthority,
        sub_authority: [u32; N],
    ) -> Self {
        let () = Self::COUNT_CHECK;
        Self {
            identifier_authority,
            sub_authority,
        }
    }

    /// Owned copy of this SID.
    #[must_use]
    #[inline]
    pub fn to_sid(&self) -> Sid {
        Sid::from(*self)
    }
}

impl<const N: usize> From<ConstSid<N>> for Sid {
    #[inline]
    fn from(value: ConstSid<N>) -> Self {
        Self::from_parts(value.identifier_authority, &value.sub_authority)
    }
}

impl<const N: usize> PartialEq<Sid> for ConstSid<N> {
    #[inline]
    fn eq(&self, other: &Sid) -> bool {
        other.identifier_authority() == self.identifier_authority
            && other.sub_authorities() == self.sub_authority
    }
}

impl<const N: usize> PartialEq<ConstSid<N>> for Sid {
    #[inline]
    fn eq(&self, other: &ConstSid<N>) -> bool {
        other == self
    }
}

impl<const N: usize> Display for ConstSid<N> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.to_sid(), f)
    }
}
