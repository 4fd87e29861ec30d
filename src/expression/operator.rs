use crate::codec::{Encode, put_u32, put_utf16, utf16_len, wire_u32};
use crate::{SecurityError, SecurityResult, Sid};

use super::opcode::{
    self, BinaryLogicalOp, BinaryRelationalOp, IntBase, IntSign, IntWidth, UnaryLogicalOp,
    UnaryRelationalOp, UnicodeKind,
};

/// Integer literal token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntLiteral {
    /// Declared width.
    pub width: IntWidth,
    /// Value, always carried as 64 bits.
    pub value: i64,
    /// Sign the value was written with.
    pub sign: IntSign,
    /// Base the value was written in.
    pub base: IntBase,
}

impl IntLiteral {
    /// Plain decimal 64-bit literal.
    #[must_use]
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self {
            width: IntWidth::Int64,
            value,
            sign: IntSign::None,
            base: IntBase::Decimal,
        }
    }
}

/// String literal or attribute reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnicodeToken {
    /// Literal or which attribute namespace.
    pub kind: UnicodeKind,
    /// The literal text or attribute name.
    pub text: String,
}

/// One node of a conditional expression.
///
/// Literal variants can be built directly. Every operator node goes through a
/// constructor that checks its operand types, so a tree that exists is a tree
/// the evaluator accepts.
///
/// # Examples
/// ```rust
/// # use win_security_descriptor::expression::{BinaryRelationalOp, Operator};
/// # use win_security_descriptor::SecurityError;
/// let ok = Operator::binary_relational(
///     BinaryRelationalOp::Equals,
///     Operator::user("Department"),
///     Operator::string("Finance"),
/// );
/// assert!(ok.is_ok());
///
/// let err = Operator::binary_relational(
///     BinaryRelationalOp::LessThan,
///     Operator::user("Level"),
///     Operator::composite(vec![Operator::int(1), Operator::int(2)]).unwrap(),
/// );
/// assert!(matches!(err, Err(SecurityError::InvalidOperandType { .. })));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Integer literal.
    Int(IntLiteral),
    /// String literal or attribute reference.
    Unicode(UnicodeToken),
    /// Octet string literal.
    Octet(Vec<u8>),
    /// SID literal.
    Sid(Sid),
    /// Composite of literals.
    Composite(Composite),
    /// `Member_of` family.
    UnaryRelational(UnaryRelational),
    /// Attribute comparison.
    BinaryRelational(BinaryRelational),
    /// `Exists`, `Not_Exists` and `!`.
    UnaryLogical(UnaryLogical),
    /// `&&` and `||`.
    BinaryLogical(BinaryLogical),
}

/// Composite literal: a list of literals, possibly nested composites.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Composite {
    elements: Vec<Operator>,
}

impl Composite {
    /// The elements.
    #[must_use]
    #[inline]
    pub fn elements(&self) -> &[Operator] {
        &self.elements
    }
}

/// A unary relational node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnaryRelational {
    op: UnaryRelationalOp,
    operand: Box<Operator>,
}

impl UnaryRelational {
    /// The operator.
    #[must_use]
    #[inline]
    pub const fn op(&self) -> UnaryRelationalOp {
        self.op
    }

    /// A SID or a composite of SIDs.
    #[must_use]
    #[inline]
    pub fn operand(&self) -> &Operator {
        &self.operand
    }
}

/// A binary relational node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryRelational {
    op: BinaryRelationalOp,
    lhs: Box<Operator>,
    rhs: Box<Operator>,
}

impl BinaryRelational {
    /// The operator.
    #[must_use]
    #[inline]
    pub const fn op(&self) -> BinaryRelationalOp {
        self.op
    }

    /// The attribute being compared.
    #[must_use]
    #[inline]
    pub fn lhs(&self) -> &Operator {
        &self.lhs
    }

    /// The value it is compared with.
    #[must_use]
    #[inline]
    pub fn rhs(&self) -> &Operator {
        &self.rhs
    }
}

/// A unary logical node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnaryLogical {
    op: UnaryLogicalOp,
    operand: Box<Operator>,
}

impl UnaryLogical {
    /// The operator.
    #[must_use]
    #[inline]
    pub const fn op(&self) -> UnaryLogicalOp {
        self.op
    }

    /// The operand.
    #[must_use]
    #[inline]
    pub fn operand(&self) -> &Operator {
        &self.operand
    }
}

/// A binary logical node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryLogical {
    op: BinaryLogicalOp,
    lhs: Box<Operator>,
    rhs: Box<Operator>,
}

impl BinaryLogical {
    /// The operator.
    #[must_use]
    #[inline]
    pub const fn op(&self) -> BinaryLogicalOp {
        self.op
    }

    /// Left operand.
    #[must_use]
    #[inline]
    pub fn lhs(&self) -> &Operator {
        &self.lhs
    }

    /// Right operand.
    #[must_use]
    #[inline]
    pub fn rhs(&self) -> &Operator {
        &self.rhs
    }
}

impl Operator {
    /// Decimal 64-bit integer literal.
    #[must_use]
    #[inline]
    pub const fn int(value: i64) -> Self {
        Self::Int(IntLiteral::new(value))
    }

    /// String literal.
    #[must_use]
    #[inline]
    pub fn string(text: impl Into<String>) -> Self {
        Self::unicode(UnicodeKind::Literal, text)
    }

    /// Local attribute reference.
    #[must_use]
    #[inline]
    pub fn local(name: impl Into<String>) -> Self {
        Self::unicode(UnicodeKind::Local, name)
    }

    /// `@User.` claim reference.
    #[must_use]
    #[inline]
    pub fn user(name: impl Into<String>) -> Self {
        Self::unicode(UnicodeKind::User, name)
    }

    /// `@Resource.` attribute reference.
    #[must_use]
    #[inline]
    pub fn resource(name: impl Into<String>) -> Self {
        Self::unicode(UnicodeKind::Resource, name)
    }

    /// `@Device.` claim reference.
    #[must_use]
    #[inline]
    pub fn device(name: impl Into<String>) -> Self {
        Self::unicode(UnicodeKind::Device, name)
    }

    /// Unicode token of any kind.
    #[must_use]
    #[inline]
    pub fn unicode(kind: UnicodeKind, text: impl Into<String>) -> Self {
        Self::Unicode(UnicodeToken {
            kind,
            text: text.into(),
        })
    }

    /// Octet string literal.
    #[must_use]
    #[inline]
    pub fn octet(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Octet(bytes.into())
    }

    /// SID literal.
    #[must_use]
    #[inline]
    pub fn sid(sid: impl Into<Sid>) -> Self {
        Self::Sid(sid.into())
    }

    /// Composite literal.
    ///
    /// # Errors
    /// [`SecurityError::InvalidOperandType`] if an element is an attribute
    /// reference or an operator node.
    #[inline]
    pub fn composite(elements: Vec<Self>) -> SecurityResult<Self> {
        if let Some(bad) = elements.iter().find(|e| !e.is_literal()) {
            return Err(SecurityError::InvalidOperandType {
                operator: "composite",
                operand: bad.kind_name(),
            });
        }
        Ok(Self::Composite(Composite { elements }))
    }

    /// `Member_of`-family node.
    ///
    /// # Errors
    /// [`SecurityError::InvalidOperandType`] unless `operand` is a SID or a
    /// composite made only of SIDs.
    #[inline]
    pub fn unary_relational(op: UnaryRelationalOp, operand: Self) -> SecurityResult<Self> {
        let valid = match &operand {
            Self::Sid(_) => true,
            Self::Composite(c) => c.elements.iter().all(|e| matches!(e, Self::Sid(_))),
            _ => false,
        };
        if !valid {
            return Err(SecurityError::InvalidOperandType {
                operator: op.keyword(),
                operand: operand.kind_name(),
            });
        }
        Ok(Self::UnaryRelational(UnaryRelational {
            op,
            operand: Box::new(operand),
        }))
    }

    /// Attribute comparison node.
    ///
    /// # Errors
    /// [`SecurityError::InvalidOperandType`] unless `lhs` is an attribute
    /// reference and `rhs` is a value. Ordering operators refuse a composite
    /// right-hand side.
    #[inline]
    pub fn binary_relational(op: BinaryRelationalOp, lhs: Self, rhs: Self) -> SecurityResult<Self> {
        if !lhs.is_attribute() {
            return Err(SecurityError::InvalidOperandType {
                operator: op.keyword(),
                operand: lhs.kind_name(),
            });
        }
        let rhs_valid = match &rhs {
            Self::Int(_) | Self::Unicode(_) | Self::Octet(_) | Self::Sid(_) => true,
            Self::Composite(_) => !op.is_ordering(),
            _ => false,
        };
        if !rhs_valid {
            return Err(SecurityError::InvalidOperandType {
                operator: op.keyword(),
                operand: rhs.kind_name(),
            });
        }
        Ok(Self::BinaryRelational(BinaryRelational {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }))
    }

    /// `Exists`, `Not_Exists` or `!` node.
    ///
    /// # Errors
    /// [`SecurityError::InvalidOperandType`] when `Exists` or `Not_Exists` is
    /// applied to anything but a local or resource attribute.
    #[inline]
    pub fn unary_logical(op: UnaryLogicalOp, operand: Self) -> SecurityResult<Self> {
        let valid = match op {
            UnaryLogicalOp::Not => true,
            UnaryLogicalOp::Exists | UnaryLogicalOp::NotExists => matches!(
                &operand,
                Self::Unicode(UnicodeToken {
                    kind: UnicodeKind::Local | UnicodeKind::Resource,
                    ..
                })
            ),
        };
        if !valid {
            return Err(SecurityError::InvalidOperandType {
                operator: op.keyword(),
                operand: operand.kind_name(),
            });
        }
        Ok(Self::UnaryLogical(UnaryLogical {
            op,
            operand: Box::new(operand),
        }))
    }

    /// `&&` or `||` node. Any operands are accepted.
    #[must_use]
    #[inline]
    pub fn binary_logical(op: BinaryLogicalOp, lhs: Self, rhs: Self) -> Self {
        Self::BinaryLogical(BinaryLogical {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    /// `lhs && rhs`
    #[must_use]
    #[inline]
    pub fn and(lhs: Self, rhs: Self) -> Self {
        Self::binary_logical(BinaryLogicalOp::And, lhs, rhs)
    }

    /// `lhs || rhs`
    #[must_use]
    #[inline]
    pub fn or(lhs: Self, rhs: Self) -> Self {
        Self::binary_logical(BinaryLogicalOp::Or, lhs, rhs)
    }

    /// `!(operand)`
    #[must_use]
    #[inline]
    pub fn not(operand: Self) -> Self {
        Self::UnaryLogical(UnaryLogical {
            op: UnaryLogicalOp::Not,
            operand: Box::new(operand),
        })
    }

    /// Whether this is a literal that may appear inside a composite.
    #[must_use]
    #[inline]
    pub fn is_literal(&self) -> bool {
        match self {
            Self::Int(_) | Self::Octet(_) | Self::Sid(_) | Self::Composite(_) => true,
            Self::Unicode(token) => !token.kind.is_attribute(),
            _ => false,
        }
    }

    /// Whether this is an attribute reference.
    #[must_use]
    #[inline]
    pub fn is_attribute(&self) -> bool {
        matches!(self, Self::Unicode(token) if token.kind.is_attribute())
    }

    /// Short description of the node kind, used in errors.
    #[must_use]
    #[inline]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Unicode(token) => match token.kind {
                UnicodeKind::Literal => "string literal",
                UnicodeKind::Local => "local attribute",
                UnicodeKind::User => "user attribute",
                UnicodeKind::Resource => "resource attribute",
                UnicodeKind::Device => "device attribute",
            },
            Self::Octet(_) => "octet string",
            Self::Sid(_) => "SID",
            Self::Composite(_) => "composite",
            Self::UnaryRelational(_) | Self::BinaryRelational(_) => "relational expression",
            Self::UnaryLogical(_) | Self::BinaryLogical(_) => "logical expression",
        }
    }
}

/// Postfix token emission.
impl Encode for Operator {
    fn encoded_len(&self) -> usize {
        match self {
            Self::Int(_) => 1 + 8 + 1 + 1,
            Self::Unicode(token) => 1 + 4 + utf16_len(&token.text),
            Self::Octet(bytes) => 1 + 4 + bytes.len(),
            Self::Sid(sid) => 1 + 4 + sid.binary_len(),
            Self::Composite(c) => 1 + 4 + c.elements.iter().map(Self::encoded_len).sum::<usize>(),
            Self::UnaryRelational(node) => node.operand.encoded_len() + 1,
            Self::BinaryRelational(node) => node.lhs.encoded_len() + node.rhs.encoded_len() + 1,
            Self::UnaryLogical(node) => node.operand.encoded_len() + 1,
            Self::BinaryLogical(node) => node.lhs.encoded_len() + node.rhs.encoded_len() + 1,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> SecurityResult<()> {
        match self {
            Self::Int(int) => {
                out.push(int.width.into());
                out.extend_from_slice(&int.value.to_le_bytes());
                out.push(int.sign.into());
                out.push(int.base.into());
            }
            Self::Unicode(token) => {
                out.push(token.kind.into());
                put_u32(out, wire_u32(utf16_len(&token.text), "expression string")?);
                put_utf16(out, &token.text);
            }
            Self::Octet(bytes) => {
                out.push(opcode::OCTET_STRING);
                put_u32(out, wire_u32(bytes.len(), "expression octet string")?);
                out.extend_from_slice(bytes);
            }
            Self::Sid(sid) => {
                out.push(opcode::SID);
                put_u32(out, wire_u32(sid.binary_len(), "expression SID")?);
                sid.encode_into(out)?;
            }
            Self::Composite(c) => {
                out.push(opcode::COMPOSITE);
                let len = c.elements.iter().map(Self::encoded_len).sum::<usize>();
                put_u32(out, wire_u32(len, "expression composite")?);
                for element in &c.elements {
                    element.encode_into(out)?;
                }
            }
            Self::UnaryRelational(node) => {
                node.operand.encode_into(out)?;
                out.push(node.op.into());
            }
            Self::BinaryRelational(node) => {
                node.lhs.encode_into(out)?;
                node.rhs.encode_into(out)?;
                out.push(node.op.into());
            }
            Self::UnaryLogical(node) => {
                node.operand.encode_into(out)?;
                out.push(node.op.into());
            }
            Self::BinaryLogical(node) => {
                node.lhs.encode_into(out)?;
                node.rhs.encode_into(out)?;
                out.push(node.op.into());
            }
        }
        Ok(())
    }
}
