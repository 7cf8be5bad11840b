use std::fmt;

use crate::common::{Result, StoreError};
use crate::tuple::{Schema, Value};

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant value
    Const(Value),
    /// The value of attribute `n` of the record being evaluated
    Attr(usize),
    /// An operator applied to sub-expressions
    Op(Box<Operator>),
}

/// Operators a predicate can use.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    And(Expr, Expr),
    Or(Expr, Expr),
    Not(Expr),
    /// Both sides must have the same type
    Equal(Expr, Expr),
    /// `left < right`; both sides must have the same type
    Smaller(Expr, Expr),
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Const(value.into())
    }

    pub fn attr(index: usize) -> Self {
        Expr::Attr(index)
    }

    /// A predicate that matches every record.
    pub fn always_true() -> Self {
        Expr::Const(Value::Bool(true))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::Op(Box::new(Operator::And(left, right)))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Op(Box::new(Operator::Or(left, right)))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Expr) -> Self {
        Expr::Op(Box::new(Operator::Not(inner)))
    }

    pub fn equal(left: Expr, right: Expr) -> Self {
        Expr::Op(Box::new(Operator::Equal(left, right)))
    }

    pub fn smaller(left: Expr, right: Expr) -> Self {
        Expr::Op(Box::new(Operator::Smaller(left, right)))
    }

    /// Checks that every attribute reference exists in the schema.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        match self {
            Expr::Const(_) => Ok(()),
            Expr::Attr(index) => {
                if *index >= schema.num_attributes() {
                    return Err(StoreError::invalid(format!(
                        "predicate references attribute {}, schema has {}",
                        index,
                        schema.num_attributes()
                    )));
                }
                Ok(())
            }
            Expr::Op(op) => match op.as_ref() {
                Operator::Not(inner) => inner.validate(schema),
                Operator::And(l, r)
                | Operator::Or(l, r)
                | Operator::Equal(l, r)
                | Operator::Smaller(l, r) => {
                    l.validate(schema)?;
                    r.validate(schema)
                }
            },
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(v) => write!(f, "{}", v),
            Expr::Attr(i) => write!(f, "attr{}", i),
            Expr::Op(op) => match op.as_ref() {
                Operator::And(l, r) => write!(f, "({} AND {})", l, r),
                Operator::Or(l, r) => write!(f, "({} OR {})", l, r),
                Operator::Not(e) => write!(f, "(NOT {})", e),
                Operator::Equal(l, r) => write!(f, "({} = {})", l, r),
                Operator::Smaller(l, r) => write!(f, "({} < {})", l, r),
            },
        }
    }
}
