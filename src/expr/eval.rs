use std::cmp::Ordering;
use std::mem;

use crate::common::{Result, StoreError};
use crate::tuple::{Record, Schema, Value};

use super::{Expr, Operator};

/// Evaluates an expression against one record.
pub fn eval_expr(record: &Record, schema: &Schema, expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Const(v) => Ok(v.clone()),
        Expr::Attr(index) => record.get_attr(schema, *index),
        Expr::Op(op) => eval_operator(record, schema, op),
    }
}

/// Evaluates a predicate; the expression must produce a boolean.
pub fn eval_predicate(record: &Record, schema: &Schema, expr: &Expr) -> Result<bool> {
    let value = eval_expr(record, schema, expr)?;
    value.as_bool().ok_or_else(|| {
        StoreError::invalid(format!("predicate {} produced non-boolean {}", expr, value))
    })
}

fn eval_operator(record: &Record, schema: &Schema, op: &Operator) -> Result<Value> {
    let value = match op {
        Operator::And(l, r) => {
            Value::Bool(eval_predicate(record, schema, l)? && eval_predicate(record, schema, r)?)
        }
        Operator::Or(l, r) => {
            Value::Bool(eval_predicate(record, schema, l)? || eval_predicate(record, schema, r)?)
        }
        Operator::Not(inner) => Value::Bool(!eval_predicate(record, schema, inner)?),
        Operator::Equal(l, r) => {
            let ord = compare(&eval_expr(record, schema, l)?, &eval_expr(record, schema, r)?)?;
            Value::Bool(ord == Some(Ordering::Equal))
        }
        Operator::Smaller(l, r) => {
            let ord = compare(&eval_expr(record, schema, l)?, &eval_expr(record, schema, r)?)?;
            Value::Bool(ord == Some(Ordering::Less))
        }
    };
    Ok(value)
}

// None only for unordered floats (NaN)
fn compare(left: &Value, right: &Value) -> Result<Option<Ordering>> {
    if mem::discriminant(left) != mem::discriminant(right) {
        return Err(StoreError::invalid(format!(
            "cannot compare {} with {}",
            left, right
        )));
    }
    Ok(left.compare(right))
}
