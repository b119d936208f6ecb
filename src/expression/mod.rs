//! Path expressions: set algebra over patterns and references.
//!
//! This module handles:
//! - The expression tree and its canonicalizing constructors
//! - Parsing expression text (`lexer`, `parser`) and regenerating it (`text`)
//! - Substituting references (`resolve`)
//! - Anchoring and renaming pattern prefixes (`rewrite`)

pub(crate) mod lexer;
pub(crate) mod parser;
mod resolve;
mod rewrite;
mod text;

use crate::error::{PathExprError, Result};
use crate::path::ScenePath;
use crate::pattern::PathPattern;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Name of the weaker reference, `%_`.
pub const WEAKER_REFERENCE_NAME: &str = "_";

/// A placeholder for another expression: `%_`, `%:name` or `%/path:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionReference {
	pub path: ScenePath,
	pub name: String,
}

impl ExpressionReference {
	/// The weaker reference `%_`.
	pub fn weaker() -> Self {
		ExpressionReference {
			path: ScenePath::empty(),
			name: WEAKER_REFERENCE_NAME.to_string(),
		}
	}

	/// `%:name`.
	pub fn named(name: impl Into<String>) -> Self {
		ExpressionReference {
			path: ScenePath::empty(),
			name: name.into(),
		}
	}

	pub fn is_weaker(&self) -> bool {
		self.path.is_empty() && self.name == WEAKER_REFERENCE_NAME
	}
}

impl fmt::Display for ExpressionReference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_weaker() {
			f.write_str("%_")
		} else {
			write!(f, "%{}:{}", self.path, self.name)
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnionKind {
	/// Juxtaposition, `a b`.
	Implied,
	/// `a + b` or `a | b`.
	Explicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Node {
	Pattern(PathPattern),
	Reference(ExpressionReference),
	Complement(Box<Node>),
	ImpliedUnion(Vec<Node>),
	Union(Vec<Node>),
	Intersection(Box<Node>, Box<Node>),
	Difference(Box<Node>, Box<Node>),
}

// Trees are `Option<Node>`, with `None` standing for Nothing. The helpers
// below are the only way trees get combined so canonical forms hold.

fn is_everything(node: &Node) -> bool {
	matches!(node, Node::Pattern(pattern) if pattern.has_leading_stretch() && pattern.components().len() == 1)
}

fn everything_node() -> Node {
	Node::Pattern(PathPattern::everything())
}

pub(crate) fn complement(operand: Option<Node>) -> Option<Node> {
	match operand {
		None => Some(everything_node()),
		Some(Node::Complement(inner)) => Some(*inner),
		Some(node) if is_everything(&node) => None,
		Some(node) => Some(Node::Complement(Box::new(node))),
	}
}

pub(crate) fn union(kind: UnionKind, lhs: Option<Node>, rhs: Option<Node>) -> Option<Node> {
	let (lhs, rhs) = match (lhs, rhs) {
		(None, rhs) => return rhs,
		(lhs, None) => return lhs,
		(Some(lhs), Some(rhs)) => (lhs, rhs),
	};
	let mut children = Vec::new();
	for node in [lhs, rhs] {
		match (kind, node) {
			(UnionKind::Implied, Node::ImpliedUnion(nested))
			| (UnionKind::Explicit, Node::Union(nested)) => children.extend(nested),
			(_, node) => children.push(node),
		}
	}
	Some(match kind {
		UnionKind::Implied => Node::ImpliedUnion(children),
		UnionKind::Explicit => Node::Union(children),
	})
}

pub(crate) fn intersection(lhs: Option<Node>, rhs: Option<Node>) -> Option<Node> {
	match (lhs, rhs) {
		(None, _) | (_, None) => None,
		(Some(lhs), rhs) if is_everything(&lhs) => rhs,
		(lhs, Some(rhs)) if is_everything(&rhs) => lhs,
		(Some(lhs), Some(rhs)) => Some(Node::Intersection(Box::new(lhs), Box::new(rhs))),
	}
}

pub(crate) fn difference(lhs: Option<Node>, rhs: Option<Node>) -> Option<Node> {
	match (lhs, rhs) {
		(None, _) => None,
		(lhs, None) => lhs,
		(_, Some(rhs)) if is_everything(&rhs) => None,
		(Some(lhs), rhs) if is_everything(&lhs) => complement(rhs),
		(Some(lhs), Some(rhs)) => Some(Node::Difference(Box::new(lhs), Box::new(rhs))),
	}
}

/// Rebuild `node`, replacing every pattern and reference leaf with `f(leaf)`.
pub(crate) fn map_leaves<E, F>(node: Node, f: &mut F) -> std::result::Result<Option<Node>, E>
where
	F: FnMut(Node) -> std::result::Result<Option<Node>, E>,
{
	Ok(match node {
		Node::Pattern(_) | Node::Reference(_) => f(node)?,
		Node::Complement(operand) => complement(map_leaves(*operand, f)?),
		Node::ImpliedUnion(children) => {
			let mut result = None;
			for child in children {
				result = union(UnionKind::Implied, result, map_leaves(child, f)?);
			}
			result
		}
		Node::Union(children) => {
			let mut result = None;
			for child in children {
				result = union(UnionKind::Explicit, result, map_leaves(child, f)?);
			}
			result
		}
		Node::Intersection(lhs, rhs) => {
			let lhs = map_leaves(*lhs, f)?;
			intersection(lhs, map_leaves(*rhs, f)?)
		}
		Node::Difference(lhs, rhs) => {
			let lhs = map_leaves(*lhs, f)?;
			difference(lhs, map_leaves(*rhs, f)?)
		}
	})
}

fn any_leaf<'a>(node: &'a Node, test: &mut impl FnMut(&'a Node) -> bool) -> bool {
	match node {
		Node::Pattern(_) | Node::Reference(_) => test(node),
		Node::Complement(operand) => any_leaf(operand, test),
		Node::ImpliedUnion(children) | Node::Union(children) => {
			children.iter().any(|child| any_leaf(child, test))
		}
		Node::Intersection(lhs, rhs) | Node::Difference(lhs, rhs) => {
			any_leaf(lhs, test) || any_leaf(rhs, test)
		}
	}
}

/// An immutable path expression.
///
/// Equality compares the canonical tree, so `~~a == a` and every spelling of
/// Nothing or Everything compare equal.
#[derive(Debug, Clone, Default)]
pub struct PathExpression {
	root: Option<Node>,
	text: String,
}

impl PathExpression {
	pub(crate) fn from_root(root: Option<Node>) -> Self {
		let text = text::render(root.as_ref());
		PathExpression { root, text }
	}

	pub(crate) fn root(&self) -> Option<&Node> {
		self.root.as_ref()
	}

	/// The expression matching no paths.
	pub fn nothing() -> Self {
		Self::default()
	}

	/// The expression matching every path, `//`.
	pub fn everything() -> Self {
		Self::from_root(Some(everything_node()))
	}

	/// The expression `%_`.
	pub fn weaker_ref() -> Self {
		Self::from_reference(ExpressionReference::weaker())
	}

	pub fn from_pattern(pattern: PathPattern) -> Self {
		if pattern.is_empty() {
			return Self::nothing();
		}
		Self::from_root(Some(Node::Pattern(pattern)))
	}

	pub fn from_reference(reference: ExpressionReference) -> Self {
		Self::from_root(Some(Node::Reference(reference)))
	}

	/// Parse expression text. Empty or blank text is Nothing.
	pub fn parse(text: &str) -> Result<Self> {
		parser::parse_expression(text).map(Self::from_root)
	}

	pub fn make_complement(expr: PathExpression) -> PathExpression {
		Self::from_root(complement(expr.root))
	}

	/// `a + b`.
	pub fn union(lhs: PathExpression, rhs: PathExpression) -> PathExpression {
		Self::from_root(union(UnionKind::Explicit, lhs.root, rhs.root))
	}

	/// `a b`.
	pub fn implied_union(lhs: PathExpression, rhs: PathExpression) -> PathExpression {
		Self::from_root(union(UnionKind::Implied, lhs.root, rhs.root))
	}

	/// `a & b`.
	pub fn intersection(lhs: PathExpression, rhs: PathExpression) -> PathExpression {
		Self::from_root(intersection(lhs.root, rhs.root))
	}

	/// `a - b`, the paths in `a` but not in `b`.
	pub fn difference(lhs: PathExpression, rhs: PathExpression) -> PathExpression {
		Self::from_root(difference(lhs.root, rhs.root))
	}

	/// Whether this is Nothing.
	pub fn is_empty(&self) -> bool {
		self.root.is_none()
	}

	/// Whether this contains no references.
	pub fn is_complete(&self) -> bool {
		!self.contains_expression_references()
	}

	pub fn contains_expression_references(&self) -> bool {
		self.root
			.as_ref()
			.is_some_and(|root| any_leaf(root, &mut |leaf| matches!(leaf, Node::Reference(_))))
	}

	pub fn contains_weaker_expression_reference(&self) -> bool {
		self.root.as_ref().is_some_and(|root| {
			any_leaf(root, &mut |leaf| {
				matches!(leaf, Node::Reference(reference) if reference.is_weaker())
			})
		})
	}

	/// Every reference leaf, left to right.
	pub fn references(&self) -> Vec<&ExpressionReference> {
		let mut found = Vec::new();
		if let Some(root) = &self.root {
			any_leaf(root, &mut |leaf| {
				if let Node::Reference(reference) = leaf {
					found.push(reference);
				}
				false
			});
		}
		found
	}

	/// Whether every pattern prefix and reference path is absolute.
	pub fn is_absolute(&self) -> bool {
		self.root.as_ref().is_none_or(|root| {
			!any_leaf(root, &mut |leaf| match leaf {
				Node::Pattern(pattern) => !pattern.is_absolute(),
				Node::Reference(reference) => {
					!(reference.path.is_empty() || reference.path.is_absolute())
				}
				_ => false,
			})
		})
	}

	/// Canonical text for this expression.
	pub fn text(&self) -> &str {
		&self.text
	}
}

impl PartialEq for PathExpression {
	fn eq(&self, other: &Self) -> bool {
		self.root == other.root
	}
}

impl Eq for PathExpression {}

impl Hash for PathExpression {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.root.hash(state);
	}
}

impl fmt::Display for PathExpression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text)
	}
}

impl FromStr for PathExpression {
	type Err = PathExprError;

	fn from_str(s: &str) -> Result<Self> {
		PathExpression::parse(s)
	}
}

impl From<PathPattern> for PathExpression {
	fn from(pattern: PathPattern) -> Self {
		PathExpression::from_pattern(pattern)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn e(text: &str) -> PathExpression {
		PathExpression::parse(text).unwrap()
	}

	#[test]
	fn test_nothing_and_everything() {
		let empty = PathExpression::nothing();
		assert!(empty.is_empty());
		assert_eq!(empty, e(""));
		assert_eq!(empty, e("   "));
		assert_eq!(
			PathExpression::make_complement(empty.clone()),
			PathExpression::everything()
		);
		assert_eq!(
			PathExpression::make_complement(PathExpression::everything()),
			empty
		);
		assert_eq!(e("//"), PathExpression::everything());
		assert_eq!(e("~//"), PathExpression::nothing());
		assert_eq!(e("~//").text(), "");
	}

	#[test]
	fn test_complement_cancels() {
		assert_eq!(e("~(~a)"), e("a"));
		assert_eq!(e("~(~(~a))"), e("~a"));
		assert_eq!(e("~(~(~(~a)))"), e("a"));
		assert_eq!(e("// - a"), e("~a"));
		assert_eq!(e("~(// - a)"), e("a"));
		assert_eq!(e("~(// - ~a)"), e("~a"));

		let a = e("/a/b//");
		let twice = PathExpression::make_complement(PathExpression::make_complement(a.clone()));
		assert_eq!(twice, a);
	}

	#[test]
	fn test_constant_folding() {
		let a = e("/a");
		let nothing = PathExpression::nothing;
		let everything = PathExpression::everything;

		assert_eq!(PathExpression::difference(nothing(), a.clone()), nothing());
		assert_eq!(PathExpression::difference(a.clone(), nothing()), a);
		assert_eq!(PathExpression::difference(a.clone(), everything()), nothing());
		assert_eq!(PathExpression::intersection(nothing(), a.clone()), nothing());
		assert_eq!(PathExpression::intersection(everything(), a.clone()), a);
		assert_eq!(PathExpression::intersection(a.clone(), everything()), a);
		assert_eq!(PathExpression::union(nothing(), a.clone()), a);
		assert_eq!(PathExpression::implied_union(a.clone(), nothing()), a);
	}

	#[test]
	fn test_unions_flatten() {
		let ab = PathExpression::implied_union(e("/a"), e("/b"));
		let abc = PathExpression::implied_union(ab, e("/c"));
		assert_eq!(abc, e("/a /b /c"));
		assert_eq!(abc.text(), "/a /b /c");

		let explicit = PathExpression::union(e("/a + /b"), e("/c | /d"));
		assert_eq!(explicit.text(), "/a + /b + /c + /d");
		assert_ne!(explicit, e("/a /b /c /d"));
	}

	#[test]
	fn test_reference_queries() {
		let a = e("/a");
		assert!(!a.contains_expression_references());
		assert!(!a.contains_weaker_expression_reference());
		assert!(a.is_complete());

		let b = e("%_ /b");
		assert!(b.contains_expression_references());
		assert!(b.contains_weaker_expression_reference());
		assert!(!b.is_complete());

		let named = e("/a - %:foo");
		assert!(named.contains_expression_references());
		assert!(!named.contains_weaker_expression_reference());

		let names: Vec<_> = e("%:a (/x - %_) %/w:b")
			.references()
			.into_iter()
			.map(|reference| reference.to_string())
			.collect();
		assert_eq!(names, ["%:a", "%_", "%/w:b"]);
		assert!(a.references().is_empty());
	}

	#[test]
	fn test_is_absolute() {
		assert!(e("/a //b").is_absolute());
		assert!(!e("/a b").is_absolute());
		assert!(e("/a %:foo %/x:bar").is_absolute());
		assert!(!e("%x:bar").is_absolute());
		assert!(PathExpression::nothing().is_absolute());
	}

	#[test]
	fn test_from_pattern() {
		assert!(PathExpression::from_pattern(PathPattern::new()).is_empty());
		let expr: PathExpression = PathPattern::parse("/a//b").unwrap().into();
		assert_eq!(expr, e("/a//b"));
	}

	#[test]
	fn test_reference_display() {
		assert_eq!(ExpressionReference::weaker().to_string(), "%_");
		assert_eq!(ExpressionReference::named("geom").to_string(), "%:geom");
		let with_path = ExpressionReference {
			path: ScenePath::parse("/World").unwrap(),
			name: "lights".to_string(),
		};
		assert_eq!(with_path.to_string(), "%/World:lights");
	}
}
