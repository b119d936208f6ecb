use crate::error::{PathExprError, Result};
use crate::expression::lexer::{Token, TokenKind, tokenize};
use crate::expression::{
	ExpressionReference, Node, UnionKind, WEAKER_REFERENCE_NAME, complement, difference,
	intersection, union,
};
use crate::path::{ScenePath, is_identifier};
use crate::pattern::parse_pattern;

/// Deepest tree, and deepest parenthesis nesting, the parser accepts.
pub(crate) const MAX_DEPTH: usize = 64;

/// Parse expression text into a canonical tree. Blank text is Nothing.
///
/// Precedence, tightest first: operands, `~`, `&`, `-`, juxtaposition,
/// `+`/`|`. Binary operators are left-associative.
pub(crate) fn parse_expression(input: &str) -> Result<Option<Node>> {
	let tokens = tokenize(input)?;
	if tokens.is_empty() {
		return Ok(None);
	}

	let mut parser = ExpressionParser {
		input,
		tokens,
		pos: 0,
		nesting: 0,
	};
	let (root, _) = parser.parse_union()?;
	if let Some(token) = parser.peek() {
		return Err(PathExprError::syntax(
			input,
			token.offset,
			format!("unexpected '{}'", token.text),
		));
	}
	Ok(root)
}

/// A subtree and an upper bound on its depth.
type Parsed = (Option<Node>, usize);

struct ExpressionParser<'a> {
	input: &'a str,
	tokens: Vec<Token<'a>>,
	pos: usize,
	/// Open parentheses around the current token.
	nesting: usize,
}

impl<'a> ExpressionParser<'a> {
	fn peek(&self) -> Option<Token<'a>> {
		self.tokens.get(self.pos).copied()
	}

	fn next_if(&mut self, kind: TokenKind) -> Option<Token<'a>> {
		let token = self.peek().filter(|t| t.kind == kind)?;
		self.pos += 1;
		Some(token)
	}

	fn error_here(&self, message: &str) -> PathExprError {
		let offset = self.peek().map_or(self.input.len(), |t| t.offset);
		PathExprError::syntax(self.input, offset, message)
	}

	fn check_depth(&self, depth: usize, offset: usize) -> Result<usize> {
		if depth > MAX_DEPTH {
			return Err(PathExprError::syntax(
				self.input,
				offset,
				"expression nested too deeply",
			));
		}
		Ok(depth)
	}

	fn parse_union(&mut self) -> Result<Parsed> {
		let (mut lhs, mut depth) = self.parse_implied_union()?;
		let mut children = depth;
		while let Some(op) = self.next_if(TokenKind::Union) {
			let (rhs, rhs_depth) = self.parse_implied_union()?;
			lhs = union(UnionKind::Explicit, lhs, rhs);
			children = children.max(rhs_depth);
			depth = self.check_depth(children + 1, op.offset)?;
		}
		Ok((lhs, depth))
	}

	fn parse_implied_union(&mut self) -> Result<Parsed> {
		let (mut lhs, mut depth) = self.parse_difference()?;
		let mut children = depth;
		while let Some(next) = self.peek().filter(|t| {
			matches!(
				t.kind,
				TokenKind::Pattern
					| TokenKind::Reference
					| TokenKind::LeftParen
					| TokenKind::Complement
			)
		}) {
			let (rhs, rhs_depth) = self.parse_difference()?;
			lhs = union(UnionKind::Implied, lhs, rhs);
			children = children.max(rhs_depth);
			depth = self.check_depth(children + 1, next.offset)?;
		}
		Ok((lhs, depth))
	}

	fn parse_difference(&mut self) -> Result<Parsed> {
		let (mut lhs, mut depth) = self.parse_intersection()?;
		while let Some(op) = self.next_if(TokenKind::Difference) {
			let (rhs, rhs_depth) = self.parse_intersection()?;
			lhs = difference(lhs, rhs);
			depth = self.check_depth(depth.max(rhs_depth) + 1, op.offset)?;
		}
		Ok((lhs, depth))
	}

	fn parse_intersection(&mut self) -> Result<Parsed> {
		let (mut lhs, mut depth) = self.parse_complement()?;
		while let Some(op) = self.next_if(TokenKind::Intersection) {
			let (rhs, rhs_depth) = self.parse_complement()?;
			lhs = intersection(lhs, rhs);
			depth = self.check_depth(depth.max(rhs_depth) + 1, op.offset)?;
		}
		Ok((lhs, depth))
	}

	/// A run of `~` cancels in pairs.
	fn parse_complement(&mut self) -> Result<Parsed> {
		let Some(first) = self.next_if(TokenKind::Complement) else {
			return self.parse_operand();
		};
		let mut negate = true;
		while self.next_if(TokenKind::Complement).is_some() {
			negate = !negate;
		}
		let (operand, depth) = self.parse_operand()?;
		if !negate {
			return Ok((operand, depth));
		}
		let depth = self.check_depth(depth + 1, first.offset)?;
		Ok((complement(operand), depth))
	}

	fn parse_operand(&mut self) -> Result<Parsed> {
		let Some(token) = self.peek() else {
			return Err(self.error_here("unexpected end of expression"));
		};
		match token.kind {
			TokenKind::Pattern => {
				self.pos += 1;
				let pattern = parse_pattern(self.input, token.text, token.offset)?;
				Ok((Some(Node::Pattern(pattern)), 0))
			}
			TokenKind::Reference => {
				self.pos += 1;
				let reference = parse_reference(self.input, token.text, token.offset)?;
				Ok((Some(Node::Reference(reference)), 0))
			}
			TokenKind::LeftParen => {
				self.pos += 1;
				self.nesting = self.check_depth(self.nesting + 1, token.offset)?;
				let inner = self.parse_union()?;
				if self.next_if(TokenKind::RightParen).is_none() {
					return Err(self.error_here("expected ')'"));
				}
				self.nesting -= 1;
				Ok(inner)
			}
			_ => Err(self.error_here("expected a pattern, a reference or '('")),
		}
	}
}

/// Parse `%_`, `%:name` or `%path:name`.
fn parse_reference(input: &str, text: &str, offset: usize) -> Result<ExpressionReference> {
	let body = &text[1..];
	if body == WEAKER_REFERENCE_NAME {
		return Ok(ExpressionReference::weaker());
	}
	let Some(colon) = body.find(':') else {
		return Err(PathExprError::syntax(
			input,
			offset,
			"expected '%_' or '%:name' reference",
		));
	};

	let path = ScenePath::parse(&body[..colon])
		.ok()
		.filter(|path| !path.is_property())
		.ok_or_else(|| PathExprError::syntax(input, offset + 1, "invalid reference path"))?;
	let name = &body[colon + 1..];
	if !is_identifier(name) {
		return Err(PathExprError::syntax(
			input,
			offset + colon + 2,
			"invalid reference name",
		));
	}

	Ok(ExpressionReference {
		path,
		name: name.to_string(),
	})
}
