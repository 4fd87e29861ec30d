use tracing::trace;

use crate::codec::{Reader, utf16_to_string};
use crate::{SecurityError, SecurityResult, Sid};

use super::opcode::{
    self, BinaryLogicalOp, BinaryRelationalOp, IntBase, IntSign, IntWidth, UnaryLogicalOp,
    UnaryRelationalOp, UnicodeKind,
};
use super::operator::{IntLiteral, Operator};

/// Deepest composite nesting accepted from the wire.
const MAX_COMPOSITE_DEPTH: usize = 32;

/// Deepest operator tree accepted from the wire, counted in nodes from the
/// root to a literal.
const MAX_EXPRESSION_DEPTH: usize = 256;

/// A node on the parse stack with the height of its tree.
type Node = (Operator, usize);

/// Reduces a postfix token stream to the nodes left on the stack.
///
/// Inside a composite (`depth > 0`) only literal tokens may appear.
pub(crate) fn parse_tokens(bytes: &[u8], depth: usize) -> SecurityResult<Vec<Operator>> {
    let mut reader = Reader::new(bytes);
    let mut stack: Vec<Node> = Vec::new();
    while !reader.is_empty() {
        let code = reader.read_u8("expression token")?;
        if code == opcode::PADDING {
            continue;
        }
        let node = match parse_literal(code, &mut reader, depth)? {
            Some(literal) => (literal, 1),
            None if depth > 0 => {
                return Err(SecurityError::MalformedExpression(
                    "operator token inside a composite",
                ));
            }
            None => reduce(code, &mut stack)?,
        };
        if node.1 > MAX_EXPRESSION_DEPTH {
            return Err(SecurityError::MalformedExpression("expression nested too deeply"));
        }
        trace!(code, depth, height = node.1, stack = stack.len(), "reduced expression token");
        stack.push(node);
    }
    Ok(stack.into_iter().map(|(node, _)| node).collect())
}

/// Parses a literal token, or returns `None` when `code` is an operator.
fn parse_literal(
    code: u8,
    reader: &mut Reader<'_>,
    depth: usize,
) -> SecurityResult<Option<Operator>> {
    if let Ok(width) = IntWidth::try_from(code) {
        let value = i64::from_le_bytes(reader.read_array("expression integer")?);
        let sign = IntSign::try_from(reader.read_u8("expression integer")?)
            .map_err(|_| SecurityError::MalformedExpression("invalid integer sign"))?;
        let base = IntBase::try_from(reader.read_u8("expression integer")?)
            .map_err(|_| SecurityError::MalformedExpression("invalid integer base"))?;
        return Ok(Some(Operator::Int(IntLiteral {
            width,
            value,
            sign,
            base,
        })));
    }
    if let Ok(kind) = UnicodeKind::try_from(code) {
        let text = utf16_to_string(reader.read_prefixed("expression string")?)?;
        return Ok(Some(Operator::unicode(kind, text)));
    }
    Ok(Some(match code {
        opcode::OCTET_STRING => Operator::octet(reader.read_prefixed("expression octet string")?),
        opcode::SID => Operator::Sid(Sid::from_bytes(reader.read_prefixed("expression SID")?)?),
        opcode::COMPOSITE => {
            if depth >= MAX_COMPOSITE_DEPTH {
                return Err(SecurityError::MalformedExpression("composite nested too deeply"));
            }
            let body = reader.read_prefixed("expression composite")?;
            Operator::composite(parse_tokens(body, depth + 1)?)?
        }
        _ => return Ok(None),
    }))
}

fn pop(stack: &mut Vec<Node>) -> SecurityResult<Node> {
    stack
        .pop()
        .ok_or(SecurityError::MalformedExpression("operator is missing an operand"))
}

/// Pops the operands of operator `code` and builds its node.
fn reduce(code: u8, stack: &mut Vec<Node>) -> SecurityResult<Node> {
    if let Ok(op) = UnaryRelationalOp::try_from(code) {
        let (operand, height) = pop(stack)?;
        return Ok((Operator::unary_relational(op, operand)?, height + 1));
    }
    if let Ok(op) = BinaryRelationalOp::try_from(code) {
        let (rhs, right) = pop(stack)?;
        let (lhs, left) = pop(stack)?;
        return Ok((Operator::binary_relational(op, lhs, rhs)?, left.max(right) + 1));
    }
    if let Ok(op) = UnaryLogicalOp::try_from(code) {
        let (operand, height) = pop(stack)?;
        return Ok((Operator::unary_logical(op, operand)?, height + 1));
    }
    if let Ok(op) = BinaryLogicalOp::try_from(code) {
        let (rhs, right) = pop(stack)?;
        let (lhs, left) = pop(stack)?;
        return Ok((Operator::binary_logical(op, lhs, rhs), left.max(right) + 1));
    }
    Err(SecurityError::UnknownToken(code))
}
