//! Boolean predicates over records.
//!
//! An [`Expr`] is a tree of constants, attribute references and operators.
//! [`eval_expr`] evaluates it against one record, typing attribute
//! references through the record's schema.

mod eval;
mod expression;

pub use eval::*;
pub use expression::*;
