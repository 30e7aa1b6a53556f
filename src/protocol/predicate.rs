//! Filter predicates
//!
//! A single comparison between the primary key and a literal, written
//! without spaces as `field>value`, `field<value`, `field=value`, or with
//! the operands swapped (`5<id`).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StrataError};

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Less,
    Greater,
    Equal,
}

impl CompareOp {
    /// Operator with operands swapped (`a < b` ⇔ `b > a`)
    pub fn flip(self) -> Self {
        match self {
            CompareOp::Less => CompareOp::Greater,
            CompareOp::Greater => CompareOp::Less,
            CompareOp::Equal => CompareOp::Equal,
        }
    }

    /// Does `lhs OP rhs` hold, given `lhs.cmp(rhs)`?
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Less => ordering == Ordering::Less,
            CompareOp::Greater => ordering == Ordering::Greater,
            CompareOp::Equal => ordering == Ordering::Equal,
        }
    }

    fn symbol(self) -> char {
        match self {
            CompareOp::Less => '<',
            CompareOp::Greater => '>',
            CompareOp::Equal => '=',
        }
    }
}

/// Unresolved `lhs OP rhs` as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub lhs: String,
    pub op: CompareOp,
    pub rhs: String,
}

impl Predicate {
    /// Orient the predicate around `field`: returns `(op, literal)` such that
    /// the condition reads `field OP literal`, or `None` if neither operand
    /// names the field.
    pub fn resolve(&self, field: &str) -> Option<(CompareOp, &str)> {
        if self.lhs == field {
            Some((self.op, self.rhs.as_str()))
        } else if self.rhs == field {
            Some((self.op.flip(), self.lhs.as_str()))
        } else {
            None
        }
    }
}

impl FromStr for Predicate {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self> {
        let (idx, symbol) = s
            .char_indices()
            .find(|(_, c)| matches!(c, '<' | '>' | '='))
            .ok_or_else(|| StrataError::Parse(format!("no comparison operator in '{}'", s)))?;

        let op = match symbol {
            '<' => CompareOp::Less,
            '>' => CompareOp::Greater,
            _ => CompareOp::Equal,
        };
        let lhs = s[..idx].trim();
        let rhs = s[idx + 1..].trim();

        if lhs.is_empty() || rhs.is_empty() || rhs.contains(['<', '>', '=']) {
            return Err(StrataError::Parse(format!("malformed predicate '{}'", s)));
        }

        Ok(Self {
            lhs: lhs.to_string(),
            op,
            rhs: rhs.to_string(),
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.lhs, self.op.symbol(), self.rhs)
    }
}
