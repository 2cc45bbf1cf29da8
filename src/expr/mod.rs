//! Embedded mini-languages for page selection.
//!
//! Both evaluators are hand-written against a fixed grammar; neither shells
//! out to a general-purpose expression engine, so a crafted selection string
//! can never execute anything outside the arithmetic/boolean subset.
//!
//! - [`pages::parse_page_set`] handles explicit lists and ranges
//!   (`"1,3,5..7,$total"`).
//! - [`condition::select_pages`] evaluates a per-page predicate template
//!   (`"$page % 2 == 1"`).

pub mod condition;
pub mod pages;

use thiserror::Error;

/// Errors produced while parsing or evaluating a selection expression.
///
/// Page-set errors surface to the caller as parameter errors; condition
/// errors are swallowed per page by the deliberate skip policy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("empty page set")]
    EmptyPageSet,

    #[error("invalid page token '{0}'")]
    InvalidPageToken(String),

    #[error("invalid page range '{0}'")]
    InvalidRange(String),

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("type mismatch in expression")]
    TypeMismatch,
}
