//! Conditional expressions carried by callback ACEs.
//!
//! The binary form is the `artx` signature followed by a postfix token stream,
//! zero-padded to a multiple of four bytes. Decoding runs the stream through a
//! stack machine; every operator checks its operand types as it is reduced.

mod display;
mod opcode;
mod operator;
mod parser;

use core::fmt::{self, Display};

use tracing::debug;

pub use opcode::{
    BinaryLogicalOp, BinaryRelationalOp, IntBase, IntSign, IntWidth, UnaryLogicalOp,
    UnaryRelationalOp, UnicodeKind,
};
pub use operator::{
    BinaryLogical, BinaryRelational, Composite, IntLiteral, Operator, UnaryLogical,
    UnaryRelational, UnicodeToken,
};

use crate::codec::{Encode, align4};
use crate::{SecurityError, SecurityResult};

/// Signature opening every encoded expression.
pub const MAGIC: [u8; 4] = *b"artx";

/// A conditional expression: a single operator tree.
///
/// # Examples
/// ```rust
/// # use win_security_descriptor::expression::{
/// #     BinaryRelationalOp, ConditionalExpression, Operator,
/// # };
/// let root = Operator::binary_relational(
///     BinaryRelationalOp::Equals,
///     Operator::user("Department"),
///     Operator::string("Finance"),
/// ).unwrap();
/// let expression = ConditionalExpression::new(root);
/// let bytes = expression.to_bytes().unwrap();
/// assert_eq!(&bytes[..4], b"artx");
/// assert_eq!(bytes.len() % 4, 0);
/// assert_eq!(ConditionalExpression::from_bytes(&bytes).unwrap(), expression);
/// assert_eq!(expression.to_string(), "(@User.Department == \"Finance\")");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionalExpression {
    root: Operator,
}

impl ConditionalExpression {
    /// Wraps an operator tree.
    #[must_use]
    #[inline]
    pub const fn new(root: Operator) -> Self {
        Self { root }
    }

    /// The root node.
    #[must_use]
    #[inline]
    pub const fn root(&self) -> &Operator {
        &self.root
    }

    /// Unwraps the root node.
    #[must_use]
    #[inline]
    pub fn into_root(self) -> Operator {
        self.root
    }

    /// Decodes an expression; `bytes` must start with [`MAGIC`].
    ///
    /// # Errors
    /// - [`SecurityError::MalformedExpression`] for a missing signature, an
    ///   operator short of operands, or a stream not reducing to one node.
    /// - [`SecurityError::UnknownToken`] for an unassigned token code.
    /// - [`SecurityError::InvalidOperandType`] when an operator is applied to
    ///   an operand it does not accept.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> SecurityResult<Self> {
        let tokens = bytes
            .strip_prefix(&MAGIC)
            .ok_or(SecurityError::MalformedExpression("missing artx signature"))?;
        let mut stack = parser::parse_tokens(tokens, 0)?;
        let root = stack
            .pop()
            .ok_or(SecurityError::MalformedExpression("empty expression"))?;
        if !stack.is_empty() {
            return Err(SecurityError::MalformedExpression(
                "expression does not reduce to a single node",
            ));
        }
        debug!(len = bytes.len(), "decoded conditional expression");
        Ok(Self { root })
    }

    /// Binary form, padded to a multiple of four bytes.
    ///
    /// # Errors
    /// [`SecurityError::InvalidSize`] if a literal is longer than its `u32`
    /// length field.
    #[inline]
    pub fn to_bytes(&self) -> SecurityResult<Vec<u8>> {
        self.encode_to_vec()
    }
}

impl Encode for ConditionalExpression {
    fn encoded_len(&self) -> usize {
        align4(MAGIC.len() + self.root.encoded_len())
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        let start = out.len();
        out.extend_from_slice(&MAGIC);
        self.root.encode_into(out)?;
        out.resize(start + self.encoded_len(), 0);
        Ok(())
    }
}

impl From<Operator> for ConditionalExpression {
    #[inline]
    fn from(root: Operator) -> Self {
        Self::new(root)
    }
}

impl TryFrom<&[u8]> for ConditionalExpression {
    type Error = SecurityError;

    #[inline]
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

impl Display for ConditionalExpression {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Operator::Int(_)
            | Operator::Unicode(_)
            | Operator::Octet(_)
            | Operator::Sid(_)
            | Operator::Composite(_) => write!(f, "({})", self.root),
            _ => Display::fmt(&self.root, f),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
pub(crate) mod test {
    use super::*;
    use crate::sid::test::arb_sid;
    use proptest::prelude::*;

    fn arb_int() -> impl Strategy<Value = Operator> {
        (
            prop_oneof![
                Just(IntWidth::Int8),
                Just(IntWidth::Int16),
                Just(IntWidth::Int32),
                Just(IntWidth::Int64),
            ],
            any::<i64>(),
            prop_oneof![Just(IntSign::Plus), Just(IntSign::Minus), Just(IntSign::None)],
            prop_oneof![
                Just(IntBase::Octal),
                Just(IntBase::Decimal),
                Just(IntBase::Hexadecimal),
            ],
        )
            .prop_map(|(width, value, sign, base)| {
                Operator::Int(IntLiteral {
                    width,
                    value,
                    sign,
                    base,
                })
            })
    }

    fn arb_scalar() -> impl Strategy<Value = Operator> {
        prop_oneof![
            arb_int(),
            "[a-zA-Z0-9 ]{0,8}".prop_map(Operator::string),
            proptest::collection::vec(any::<u8>(), 0..6).prop_map(Operator::octet),
            arb_sid().prop_map(Operator::Sid),
        ]
    }

    fn arb_literal() -> impl Strategy<Value = Operator> {
        arb_scalar().prop_recursive(2, 8, 4, |inner| {
            proptest::collection::vec(inner, 0..4).prop_map(|v| Operator::composite(v).unwrap())
        })
    }

    fn arb_attribute() -> impl Strategy<Value = Operator> {
        (
            prop_oneof![
                Just(UnicodeKind::Local),
                Just(UnicodeKind::User),
                Just(UnicodeKind::Resource),
                Just(UnicodeKind::Device),
            ],
            "[A-Za-z]{1,10}",
        )
            .prop_map(|(kind, name)| Operator::unicode(kind, name))
    }

    fn arb_relational() -> impl Strategy<Value = Operator> {
        let set = (
            prop_oneof![
                Just(BinaryRelationalOp::Equals),
                Just(BinaryRelationalOp::NotEquals),
                Just(BinaryRelationalOp::Contains),
                Just(BinaryRelationalOp::NotContains),
                Just(BinaryRelationalOp::AnyOf),
                Just(BinaryRelationalOp::NotAnyOf),
            ],
            arb_attribute(),
            arb_literal(),
        )
            .prop_map(|(op, lhs, rhs)| Operator::binary_relational(op, lhs, rhs).unwrap());
        let ordering = (
            prop_oneof![
                Just(BinaryRelationalOp::LessThan),
                Just(BinaryRelationalOp::LessThanOrEqual),
                Just(BinaryRelationalOp::GreaterThan),
                Just(BinaryRelationalOp::GreaterThanOrEqual),
            ],
            arb_attribute(),
            arb_scalar(),
        )
            .prop_map(|(op, lhs, rhs)| Operator::binary_relational(op, lhs, rhs).unwrap());
        let exists = (
            prop_oneof![Just(UnaryLogicalOp::Exists), Just(UnaryLogicalOp::NotExists)],
            prop_oneof![Just(UnicodeKind::Local), Just(UnicodeKind::Resource)],
            "[A-Za-z]{1,10}",
        )
            .prop_map(|(op, kind, name)| {
                Operator::unary_logical(op, Operator::unicode(kind, name)).unwrap()
            });
        let sids = prop_oneof![
            arb_sid().prop_map(Operator::Sid),
            proptest::collection::vec(arb_sid().prop_map(Operator::Sid), 0..3)
                .prop_map(|sids| Operator::composite(sids).unwrap()),
        ];
        let member = (
            prop_oneof![
                Just(UnaryRelationalOp::MemberOf),
                Just(UnaryRelationalOp::DeviceMemberOf),
                Just(UnaryRelationalOp::MemberOfAny),
                Just(UnaryRelationalOp::DeviceMemberOfAny),
                Just(UnaryRelationalOp::NotMemberOf),
                Just(UnaryRelationalOp::NotDeviceMemberOf),
                Just(UnaryRelationalOp::NotMemberOfAny),
                Just(UnaryRelationalOp::NotDeviceMemberOfAny),
            ],
            sids,
        )
            .prop_map(|(op, operand)| Operator::unary_relational(op, operand).unwrap());
        prop_oneof![set, ordering, exists, member]
    }

    pub fn arb_expression() -> impl Strategy<Value = ConditionalExpression> {
        arb_relational()
            .prop_recursive(3, 12, 2, |inner| {
                prop_oneof![
                    (inner.clone(), inner.clone()).prop_map(|(l, r)| Operator::and(l, r)),
                    (inner.clone(), inner.clone()).prop_map(|(l, r)| Operator::or(l, r)),
                    inner.prop_map(Operator::not),
                ]
            })
            .prop_map(ConditionalExpression::new)
    }

    proptest! {
        #[test]
        fn binary_round_trip(expression in arb_expression()) {
            let bytes = expression.to_bytes().unwrap();
            prop_assert_eq!(bytes.len() % 4, 0);
            prop_assert_eq!(bytes.len(), expression.encoded_len());
            prop_assert_eq!(ConditionalExpression::from_bytes(&bytes).unwrap(), expression);
        }
    }

    #[test]
    fn missing_signature() {
        assert_eq!(
            ConditionalExpression::from_bytes(b"xtra\x04"),
            Err(SecurityError::MalformedExpression("missing artx signature"))
        );
        assert_eq!(
            ConditionalExpression::from_bytes(b"artx"),
            Err(SecurityError::MalformedExpression("empty expression"))
        );
    }

    #[test]
    fn leftover_operands() {
        let mut bytes = MAGIC.to_vec();
        for _ in 0..2 {
            bytes.extend_from_slice(&[0x04, 1, 0, 0, 0, 0, 0, 0, 0, 3, 2]);
        }
        assert_eq!(
            ConditionalExpression::from_bytes(&bytes),
            Err(SecurityError::MalformedExpression(
                "expression does not reduce to a single node"
            ))
        );
    }

    #[test]
    fn ordering_over_composite_is_rejected_on_decode() {
        // @User.a < {1}
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[0xf9, 2, 0, 0, 0, b'a', 0]);
        bytes.extend_from_slice(&[0x50, 11, 0, 0, 0, 0x04, 1, 0, 0, 0, 0, 0, 0, 0, 3, 2]);
        bytes.push(0x82);
        assert_eq!(
            ConditionalExpression::from_bytes(&bytes),
            Err(SecurityError::InvalidOperandType {
                operator: "<",
                operand: "composite"
            })
        );
    }

    #[test]
    fn member_of_string_is_rejected_on_decode() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[0x10, 2, 0, 0, 0, b'a', 0, 0x89]);
        assert!(matches!(
            ConditionalExpression::from_bytes(&bytes),
            Err(SecurityError::InvalidOperandType { operator: "Member_of", .. })
        ));
    }

    #[test]
    fn literal_root_display() {
        let expression = ConditionalExpression::new(Operator::int(1));
        assert_eq!(expression.to_string(), "(1)");
    }
}
