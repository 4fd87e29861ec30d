//! SDDL-style rendering of expression trees.

use core::fmt::{self, Display};

use super::opcode::{IntBase, IntSign, UnaryLogicalOp, UnicodeKind};
use super::operator::{IntLiteral, Operator, UnicodeToken};

impl Display for IntLiteral {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.value.unsigned_abs();
        if self.value < 0 {
            f.write_str("-")?;
        } else if self.sign == IntSign::Plus {
            f.write_str("+")?;
        }
        match self.base {
            IntBase::Octal => write!(f, "0{magnitude:o}"),
            IntBase::Decimal => write!(f, "{magnitude}"),
            IntBase::Hexadecimal => write!(f, "0x{magnitude:x}"),
        }
    }
}

impl Display for UnicodeToken {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            UnicodeKind::Literal => write!(f, "\"{}\"", self.text),
            UnicodeKind::Local => f.write_str(&self.text),
            UnicodeKind::User => write!(f, "@User.{}", self.text),
            UnicodeKind::Resource => write!(f, "@Resource.{}", self.text),
            UnicodeKind::Device => write!(f, "@Device.{}", self.text),
        }
    }
}

impl Display for Operator {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(int) => Display::fmt(int, f),
            Self::Unicode(token) => Display::fmt(token, f),
            Self::Octet(bytes) => {
                f.write_str("#")?;
                bytes.iter().try_for_each(|b| write!(f, "{b:02x}"))
            }
            Self::Sid(sid) => write!(f, "SID({sid})"),
            Self::Composite(c) => {
                f.write_str("{")?;
                for (i, element) in c.elements().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    Display::fmt(element, f)?;
                }
                f.write_str("}")
            }
            Self::UnaryRelational(node) => match node.operand() {
                Self::Sid(_) => write!(f, "({} {{{}}})", node.op().keyword(), node.operand()),
                operand => write!(f, "({} {operand})", node.op().keyword()),
            },
            Self::BinaryRelational(node) => {
                write!(f, "({} {} {})", node.lhs(), node.op().keyword(), node.rhs())
            }
            Self::UnaryLogical(node) => match node.op() {
                UnaryLogicalOp::Not => write!(f, "(!{})", node.operand()),
                op => write!(f, "({} {})", op.keyword(), node.operand()),
            },
            Self::BinaryLogical(node) => {
                write!(f, "({} {} {})", node.lhs(), node.op().keyword(), node.rhs())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
mod tests {
    use super::super::opcode::{BinaryRelationalOp, IntWidth, UnaryRelationalOp};
    use super::*;
    use crate::well_known;

    #[test]
    fn renders_sddl() {
        let finance = Operator::binary_relational(
            BinaryRelationalOp::Equals,
            Operator::user("Department"),
            Operator::string("Finance"),
        )
        .unwrap();
        let admin = Operator::unary_relational(
            UnaryRelationalOp::MemberOf,
            Operator::sid(well_known::BUILTIN_ADMINISTRATORS),
        )
        .unwrap();
        let tree = Operator::or(finance, Operator::not(admin));
        assert_eq!(
            tree.to_string(),
            "((@User.Department == \"Finance\") || (!(Member_of {SID(S-1-5-32-544)})))"
        );
    }

    #[test]
    fn integer_forms() {
        let hex = IntLiteral {
            width: IntWidth::Int32,
            value: 255,
            sign: IntSign::None,
            base: IntBase::Hexadecimal,
        };
        assert_eq!(hex.to_string(), "0xff");
        let negative = IntLiteral {
            value: -8,
            sign: IntSign::Minus,
            base: IntBase::Octal,
            ..hex
        };
        assert_eq!(negative.to_string(), "-010");
        assert_eq!(Operator::octet([0xde, 0xad]).to_string(), "#dead");
    }
}
