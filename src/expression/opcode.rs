//! Token codes of the conditional-expression bytecode (MS-DTYP 2.4.4.17.4).
//!
//! Each family is its own enum so the stack machine can dispatch on a byte
//! with `TryFrom<u8>` and the operator tree stays exhaustively typed.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Inter-token padding byte.
pub(crate) const PADDING: u8 = 0x00;
/// Octet string literal.
pub(crate) const OCTET_STRING: u8 = 0x18;
/// Composite literal.
pub(crate) const COMPOSITE: u8 = 0x50;
/// SID literal.
pub(crate) const SID: u8 = 0x51;

/// Integer literal tokens; the code records the declared width.
///
/// The value itself always travels as a signed 64-bit quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum IntWidth {
    /// 1-byte integer.
    Int8 = 0x01,
    /// 2-byte integer.
    Int16 = 0x02,
    /// 4-byte integer.
    Int32 = 0x03,
    /// 8-byte integer.
    Int64 = 0x04,
}

/// Sign byte of an integer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum IntSign {
    /// Written with a leading `+`.
    Plus = 0x01,
    /// Written with a leading `-`.
    Minus = 0x02,
    /// Written without a sign.
    None = 0x03,
}

/// Base byte of an integer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum IntBase {
    /// Octal.
    Octal = 0x01,
    /// Decimal.
    Decimal = 0x02,
    /// Hexadecimal.
    Hexadecimal = 0x03,
}

/// Unicode tokens: a string literal or a reference to a claim attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum UnicodeKind {
    /// String literal.
    Literal = 0x10,
    /// Local (token) attribute.
    Local = 0xf8,
    /// `@User.` claim.
    User = 0xf9,
    /// `@Resource.` attribute.
    Resource = 0xfa,
    /// `@Device.` claim.
    Device = 0xfb,
}

impl UnicodeKind {
    /// Whether the token names an attribute rather than carrying a literal.
    #[must_use]
    #[inline]
    pub const fn is_attribute(self) -> bool {
        !matches!(self, Self::Literal)
    }
}

/// Unary relational operators over SIDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum UnaryRelationalOp {
    /// `Member_of`
    MemberOf = 0x89,
    /// `Device_Member_of`
    DeviceMemberOf = 0x8a,
    /// `Member_of_Any`
    MemberOfAny = 0x8b,
    /// `Device_Member_of_Any`
    DeviceMemberOfAny = 0x8c,
    /// `Not_Member_of`
    NotMemberOf = 0x90,
    /// `Not_Device_Member_of`
    NotDeviceMemberOf = 0x91,
    /// `Not_Member_of_Any`
    NotMemberOfAny = 0x92,
    /// `Not_Device_Member_of_Any`
    NotDeviceMemberOfAny = 0x93,
}

impl UnaryRelationalOp {
    /// SDDL keyword.
    #[must_use]
    #[inline]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::MemberOf => "Member_of",
            Self::DeviceMemberOf => "Device_Member_of",
            Self::MemberOfAny => "Member_of_Any",
            Self::DeviceMemberOfAny => "Device_Member_of_Any",
            Self::NotMemberOf => "Not_Member_of",
            Self::NotDeviceMemberOf => "Not_Device_Member_of",
            Self::NotMemberOfAny => "Not_Member_of_Any",
            Self::NotDeviceMemberOfAny => "Not_Device_Member_of_Any",
        }
    }
}

/// Binary relational operators comparing an attribute with a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum BinaryRelationalOp {
    /// `==`
    Equals = 0x80,
    /// `!=`
    NotEquals = 0x81,
    /// `<`
    LessThan = 0x82,
    /// `<=`
    LessThanOrEqual = 0x83,
    /// `>`
    GreaterThan = 0x84,
    /// `>=`
    GreaterThanOrEqual = 0x85,
    /// `Contains`
    Contains = 0x86,
    /// `Any_of`
    AnyOf = 0x88,
    /// `Not_Contains`
    NotContains = 0x8e,
    /// `Not_Any_of`
    NotAnyOf = 0x8f,
}

impl BinaryRelationalOp {
    /// SDDL spelling.
    #[must_use]
    #[inline]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Contains => "Contains",
            Self::AnyOf => "Any_of",
            Self::NotContains => "Not_Contains",
            Self::NotAnyOf => "Not_Any_of",
        }
    }

    /// `<`, `<=`, `>` and `>=` only compare single values.
    #[must_use]
    #[inline]
    pub const fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::LessThan | Self::LessThanOrEqual | Self::GreaterThan | Self::GreaterThanOrEqual
        )
    }
}

/// Unary logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum UnaryLogicalOp {
    /// `Exists`
    Exists = 0x87,
    /// `Not_Exists`
    NotExists = 0x8d,
    /// `!`
    Not = 0xa2,
}

impl UnaryLogicalOp {
    /// SDDL spelling.
    #[must_use]
    #[inline]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Exists => "Exists",
            Self::NotExists => "Not_Exists",
            Self::Not => "!",
        }
    }
}

/// Binary logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum BinaryLogicalOp {
    /// `&&`
    And = 0xa0,
    /// `||`
    Or = 0xa1,
}

impl BinaryLogicalOp {
    /// SDDL spelling.
    #[must_use]
    #[inline]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}
