//! Predicate expressions attached to pattern components.
//!
//! This module handles:
//! - The `{...}` predicate language (calls combined with `not`/`and`/`or`)
//! - Canonical text generation for predicate expressions
//! - The library of named predicate functions evaluators link against

pub mod library;
pub mod parser;

pub use library::{PredicateFn, PredicateLibrary};

use crate::error::Result;
use crate::path::is_identifier;
use std::fmt;

/// How a predicate function call was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// `isPrimPath`
	Bare,
	/// `name:arg1,arg2`
	Colon,
	/// `name(arg, key=arg)`
	Paren,
}

/// A literal argument value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgValue {
	Bool(bool),
	Int(i64),
	String(String),
}

/// A predicate call argument, optionally passed by keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateArg {
	pub name: Option<String>,
	pub value: ArgValue,
}

/// A call to a named predicate function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateCall {
	pub kind: CallKind,
	pub name: String,
	pub args: Vec<PredicateArg>,
}

/// A boolean combination of predicate function calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PredicateExpr {
	Call(PredicateCall),
	Not(Box<PredicateExpr>),
	/// Juxtaposed terms, `a b`.
	ImpliedAnd(Box<PredicateExpr>, Box<PredicateExpr>),
	And(Box<PredicateExpr>, Box<PredicateExpr>),
	Or(Box<PredicateExpr>, Box<PredicateExpr>),
}

impl PredicateExpr {
	/// Parse predicate text (the contents of a `{...}` tag).
	pub fn parse(text: &str) -> Result<Self> {
		parser::parse_predicate(text, text, 0)
	}

	/// A bare call with no arguments.
	pub fn call(name: impl Into<String>) -> Self {
		PredicateExpr::Call(PredicateCall {
			kind: CallKind::Bare,
			name: name.into(),
			args: Vec::new(),
		})
	}

	/// Names of every function this expression calls, in textual order.
	pub fn function_names(&self) -> Vec<&str> {
		let mut names = Vec::new();
		self.collect_names(&mut names);
		names
	}

	fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
		match self {
			PredicateExpr::Call(call) => names.push(&call.name),
			PredicateExpr::Not(operand) => operand.collect_names(names),
			PredicateExpr::ImpliedAnd(lhs, rhs)
			| PredicateExpr::And(lhs, rhs)
			| PredicateExpr::Or(lhs, rhs) => {
				lhs.collect_names(names);
				rhs.collect_names(names);
			}
		}
	}

	fn precedence(&self) -> u8 {
		match self {
			PredicateExpr::Call(_) => 4,
			PredicateExpr::Not(_) => 3,
			PredicateExpr::ImpliedAnd(..) => 2,
			PredicateExpr::And(..) => 1,
			PredicateExpr::Or(..) => 0,
		}
	}

	fn write_operand(
		&self,
		f: &mut fmt::Formatter<'_>,
		parent_precedence: u8,
		is_rhs: bool,
	) -> fmt::Result {
		let precedence = self.precedence();
		let parenthesize =
			precedence < parent_precedence || (precedence == parent_precedence && is_rhs);
		if parenthesize {
			write!(f, "({})", self)
		} else {
			write!(f, "{}", self)
		}
	}
}

impl fmt::Display for PredicateExpr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let precedence = self.precedence();
		let (lhs, rhs, op) = match self {
			PredicateExpr::Call(call) => return write!(f, "{}", call),
			PredicateExpr::Not(operand) => {
				write!(f, "not ")?;
				return operand.write_operand(f, precedence, false);
			}
			PredicateExpr::ImpliedAnd(lhs, rhs) => (lhs, rhs, " "),
			PredicateExpr::And(lhs, rhs) => (lhs, rhs, " and "),
			PredicateExpr::Or(lhs, rhs) => (lhs, rhs, " or "),
		};
		lhs.write_operand(f, precedence, false)?;
		f.write_str(op)?;
		rhs.write_operand(f, precedence, true)
	}
}

impl fmt::Display for PredicateCall {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)?;
		match self.kind {
			CallKind::Bare => Ok(()),
			CallKind::Colon => {
				if self.args.is_empty() {
					return Ok(());
				}
				f.write_str(":")?;
				write_args(f, &self.args, ",")
			}
			CallKind::Paren => {
				f.write_str("(")?;
				write_args(f, &self.args, ", ")?;
				f.write_str(")")
			}
		}
	}
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[PredicateArg], separator: &str) -> fmt::Result {
	for (i, arg) in args.iter().enumerate() {
		if i > 0 {
			f.write_str(separator)?;
		}
		write!(f, "{}", arg)?;
	}
	Ok(())
}

impl fmt::Display for PredicateArg {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(ref name) = self.name {
			write!(f, "{}=", name)?;
		}
		write!(f, "{}", self.value)
	}
}

impl fmt::Display for ArgValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ArgValue::Bool(b) => write!(f, "{}", b),
			ArgValue::Int(i) => write!(f, "{}", i),
			ArgValue::String(s) if is_identifier(s) && !parser::is_reserved_word(s) => {
				f.write_str(s)
			}
			ArgValue::String(s) => {
				f.write_str("\"")?;
				for c in s.chars() {
					if c == '"' || c == '\\' {
						f.write_str("\\")?;
					}
					write!(f, "{}", c)?;
				}
				f.write_str("\"")
			}
		}
	}
}
