use super::{Expr, Op};
use crate::qb::Subquery;

/// A boolean expression.
///
/// Usually binary (`left op right`). `NOT` and `EXISTS` have no left operand,
/// and a raw fragment wrapped through
/// [`RawExpr::as_predicate`](super::RawExpr::as_predicate) has only a left one.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub(crate) left: Option<Box<Expr>>,
    pub(crate) op: Option<Op>,
    pub(crate) right: Option<Box<Expr>>,
}

impl Predicate {
    pub(crate) fn binary(left: Expr, op: Op, right: Expr) -> Self {
        Self {
            left: Some(Box::new(left)),
            op: Some(op),
            right: Some(Box::new(right)),
        }
    }

    pub(crate) fn unary(op: Op, right: Expr) -> Self {
        Self {
            left: None,
            op: Some(op),
            right: Some(Box::new(right)),
        }
    }

    pub(crate) fn leaf(left: Expr) -> Self {
        Self {
            left: Some(Box::new(left)),
            op: None,
            right: None,
        }
    }

    pub fn and(self, rhs: Predicate) -> Predicate {
        Predicate::binary(Expr::Predicate(self), Op::And, Expr::Predicate(rhs))
    }

    pub fn or(self, rhs: Predicate) -> Predicate {
        Predicate::binary(Expr::Predicate(self), Op::Or, Expr::Predicate(rhs))
    }
}

/// `NOT (p)`.
pub fn not(p: Predicate) -> Predicate {
    Predicate::unary(Op::Not, Expr::Predicate(p))
}

/// `EXISTS (subquery)`.
pub fn exists(sub: Subquery) -> Predicate {
    Predicate::unary(Op::Exists, Expr::Subquery(sub))
}
