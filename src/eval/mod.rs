//! Matching paths against complete expressions.
//!
//! This module handles:
//! - Compiling an expression's patterns into automata (`matcher`)
//! - Combining per-pattern verdicts through the expression's set algebra
//! - Incremental matching through caller-owned cursors (`cursor`)

mod cursor;
mod matcher;

pub use cursor::SearchCursor;

use crate::error::{PathExprError, Result};
use crate::expression::{Node, PathExpression};
use crate::path::ScenePath;
use crate::predicate::PredicateLibrary;
use matcher::CompiledPattern;

/// The outcome of matching one path.
///
/// When `constant` is set, every descendant of the path has the same
/// `matched` value, so a traversal can stop descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchResult {
	pub matched: bool,
	pub constant: bool,
}

impl MatchResult {
	pub fn constant(matched: bool) -> Self {
		MatchResult {
			matched,
			constant: true,
		}
	}

	pub fn varying(matched: bool) -> Self {
		MatchResult {
			matched,
			constant: false,
		}
	}

	fn complement(self) -> Self {
		MatchResult {
			matched: !self.matched,
			constant: self.constant,
		}
	}

	/// A constant false operand decides an intersection on its own.
	fn and(self, other: MatchResult) -> Self {
		if self.constant && !self.matched {
			return self;
		}
		if other.constant && !other.matched {
			return other;
		}
		MatchResult {
			matched: self.matched && other.matched,
			constant: self.constant && other.constant,
		}
	}
}

/// The expression's set algebra over compiled pattern indices.
#[derive(Debug)]
enum Logic {
	Pattern(usize),
	Complement(Box<Logic>),
	Union(Vec<Logic>),
	Intersection(Box<Logic>, Box<Logic>),
	Difference(Box<Logic>, Box<Logic>),
}

impl Logic {
	fn evaluate(&self, verdicts: &[MatchResult]) -> MatchResult {
		match self {
			Logic::Pattern(index) => verdicts[*index],
			Logic::Complement(operand) => operand.evaluate(verdicts).complement(),
			Logic::Union(children) => {
				let mut matched = false;
				let mut constant = true;
				for child in children {
					let result = child.evaluate(verdicts);
					if result.constant && result.matched {
						return result;
					}
					matched |= result.matched;
					constant &= result.constant;
				}
				MatchResult { matched, constant }
			}
			Logic::Intersection(lhs, rhs) => lhs.evaluate(verdicts).and(rhs.evaluate(verdicts)),
			Logic::Difference(lhs, rhs) => lhs
				.evaluate(verdicts)
				.and(rhs.evaluate(verdicts).complement()),
		}
	}
}

/// A complete expression compiled for matching.
///
/// Evaluators hold no per-call state and can be shared between threads.
#[derive(Debug)]
pub struct Evaluator {
	text: String,
	patterns: Vec<CompiledPattern>,
	logic: Option<Logic>,
}

impl Evaluator {
	/// Compile `expr` against the basic predicate library.
	pub fn build(expr: &PathExpression) -> Result<Self> {
		Self::with_library(expr, &PredicateLibrary::basic())
	}

	/// Compile `expr`, linking predicates against `library`.
	pub fn with_library(expr: &PathExpression, library: &PredicateLibrary) -> Result<Self> {
		if !expr.is_complete() {
			return Err(PathExprError::IncompleteExpression {
				text: expr.text().to_string(),
			});
		}

		let mut patterns = Vec::new();
		let logic = expr
			.root()
			.map(|root| compile_node(root, library, &mut patterns))
			.transpose()?;
		log::debug!(
			"compiled '{}' into {} pattern automata",
			expr.text(),
			patterns.len()
		);

		Ok(Evaluator {
			text: expr.text().to_string(),
			patterns,
			logic,
		})
	}

	/// Text of the compiled expression.
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Match a single absolute path.
	pub fn match_path(&self, path: &ScenePath) -> MatchResult {
		self.start(path).0
	}

	/// Match `path` from the root, returning a cursor for its children.
	pub fn start(&self, path: &ScenePath) -> (MatchResult, SearchCursor) {
		if !path.is_absolute() {
			log::warn!("cannot match non-absolute path <{}>", path);
			let cursor = SearchCursor {
				path: path.clone(),
				states: Vec::new(),
				result: MatchResult::constant(false),
			};
			return (cursor.result, cursor);
		}

		let mut cursor = self.root_cursor();
		for prefix in path.prefixes() {
			cursor = self.step(&cursor, prefix);
		}
		(cursor.result, cursor)
	}

	/// Match `child` given the cursor of its parent.
	///
	/// If `child` is not a direct child of the cursor's path the match is
	/// computed from the root instead.
	pub fn resume(&self, cursor: &SearchCursor, child: &ScenePath) -> (MatchResult, SearchCursor) {
		if !child.is_absolute() || child.parent().as_ref() != Some(&cursor.path) {
			log::debug!(
				"<{}> is not a child of <{}>, matching from the root",
				child,
				cursor.path
			);
			return self.start(child);
		}
		let next = self.step(cursor, child.clone());
		(next.result, next)
	}

	fn root_cursor(&self) -> SearchCursor {
		let states: Vec<_> = self.patterns.iter().map(|p| p.initial_state()).collect();
		let result = self.combine(&states, &ScenePath::absolute_root());
		SearchCursor {
			path: ScenePath::absolute_root(),
			states,
			result,
		}
	}

	fn step(&self, parent: &SearchCursor, path: ScenePath) -> SearchCursor {
		if parent.result.constant {
			return SearchCursor {
				path,
				states: Vec::new(),
				result: parent.result,
			};
		}
		let states: Vec<_> = self
			.patterns
			.iter()
			.zip(&parent.states)
			.map(|(pattern, state)| pattern.advance(state, &path))
			.collect();
		let result = self.combine(&states, &path);
		SearchCursor {
			path,
			states,
			result,
		}
	}

	fn combine(&self, states: &[matcher::PatternState], path: &ScenePath) -> MatchResult {
		let Some(ref logic) = self.logic else {
			return MatchResult::constant(false);
		};
		let verdicts: Vec<_> = self
			.patterns
			.iter()
			.zip(states)
			.map(|(pattern, state)| {
				let verdict = pattern.verdict(state);
				log::trace!("'{}' at <{}>: {:?}", pattern.text(), path, verdict);
				verdict
			})
			.collect();
		logic.evaluate(&verdicts)
	}
}

fn compile_node(
	node: &Node,
	library: &PredicateLibrary,
	patterns: &mut Vec<CompiledPattern>,
) -> Result<Logic> {
	Ok(match node {
		Node::Pattern(pattern) => {
			patterns.push(CompiledPattern::compile(pattern, library)?);
			Logic::Pattern(patterns.len() - 1)
		}
		Node::Reference(reference) => {
			return Err(PathExprError::IncompleteExpression {
				text: reference.to_string(),
			});
		}
		Node::Complement(operand) => {
			Logic::Complement(Box::new(compile_node(operand, library, patterns)?))
		}
		Node::ImpliedUnion(children) | Node::Union(children) => Logic::Union(
			children
				.iter()
				.map(|child| compile_node(child, library, patterns))
				.collect::<Result<_>>()?,
		),
		Node::Intersection(lhs, rhs) => Logic::Intersection(
			Box::new(compile_node(lhs, library, patterns)?),
			Box::new(compile_node(rhs, library, patterns)?),
		),
		Node::Difference(lhs, rhs) => Logic::Difference(
			Box::new(compile_node(lhs, library, patterns)?),
			Box::new(compile_node(rhs, library, patterns)?),
		),
	})
}
