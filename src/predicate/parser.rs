use crate::error::{PathExprError, Result};
use crate::predicate::{ArgValue, CallKind, PredicateArg, PredicateCall, PredicateExpr};

const RESERVED_WORDS: [&str; 5] = ["and", "or", "not", "true", "false"];

/// Deepest tree, and deepest parenthesis nesting, the parser accepts.
const MAX_DEPTH: usize = 64;

/// A subtree and an upper bound on its depth.
type Parsed = (PredicateExpr, usize);

/// Whether `word` is a keyword of the predicate language.
pub fn is_reserved_word(word: &str) -> bool {
	RESERVED_WORDS.contains(&word)
}

/// Parse `text`, which begins at byte `offset` of `input`.
///
/// Errors report offsets into `input`.
pub(crate) fn parse_predicate(input: &str, text: &str, offset: usize) -> Result<PredicateExpr> {
	let mut parser = PredicateParser {
		input,
		text,
		offset,
		pos: 0,
		nesting: 0,
	};
	parser.skip_whitespace();
	if parser.at_end() {
		return Err(parser.error("empty predicate expression"));
	}
	let (expr, _) = parser.parse_or()?;
	parser.skip_whitespace();
	if !parser.at_end() {
		return Err(parser.error("unexpected text in predicate expression"));
	}
	Ok(expr)
}

struct PredicateParser<'a> {
	input: &'a str,
	text: &'a str,
	offset: usize,
	pos: usize,
	nesting: usize,
}

impl<'a> PredicateParser<'a> {
	fn error(&self, message: impl Into<String>) -> PathExprError {
		PathExprError::syntax(self.input, self.offset + self.pos, message)
	}

	fn rest(&self) -> &'a str {
		&self.text[self.pos..]
	}

	fn at_end(&self) -> bool {
		self.pos >= self.text.len()
	}

	fn peek(&self) -> Option<char> {
		self.rest().chars().next()
	}

	fn skip_whitespace(&mut self) {
		let rest = self.rest();
		self.pos += rest.len() - rest.trim_start().len();
	}

	/// Consume `keyword` if it is the next word.
	fn eat_keyword(&mut self, keyword: &str) -> bool {
		self.skip_whitespace();
		let rest = self.rest();
		if !rest.starts_with(keyword) {
			return false;
		}
		let boundary = rest[keyword.len()..]
			.chars()
			.next()
			.is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'));
		if boundary {
			self.pos += keyword.len();
		}
		boundary
	}

	fn peek_keyword(&mut self, keyword: &str) -> bool {
		let saved = self.pos;
		let found = self.eat_keyword(keyword);
		self.pos = saved;
		found
	}

	fn check_depth(&self, depth: usize, at: usize) -> Result<usize> {
		if depth > MAX_DEPTH {
			return Err(PathExprError::syntax(
				self.input,
				self.offset + at,
				"predicate expression nested too deeply",
			));
		}
		Ok(depth)
	}

	fn parse_or(&mut self) -> Result<Parsed> {
		let (mut lhs, mut depth) = self.parse_and()?;
		while self.eat_keyword("or") {
			let at = self.pos;
			let (rhs, rhs_depth) = self.parse_and()?;
			lhs = PredicateExpr::Or(Box::new(lhs), Box::new(rhs));
			depth = self.check_depth(depth.max(rhs_depth) + 1, at)?;
		}
		Ok((lhs, depth))
	}

	fn parse_and(&mut self) -> Result<Parsed> {
		let (mut lhs, mut depth) = self.parse_implied_and()?;
		while self.eat_keyword("and") {
			let at = self.pos;
			let (rhs, rhs_depth) = self.parse_implied_and()?;
			lhs = PredicateExpr::And(Box::new(lhs), Box::new(rhs));
			depth = self.check_depth(depth.max(rhs_depth) + 1, at)?;
		}
		Ok((lhs, depth))
	}

	fn parse_implied_and(&mut self) -> Result<Parsed> {
		let (mut lhs, mut depth) = self.parse_not()?;
		loop {
			self.skip_whitespace();
			if self.at_end()
				|| self.peek() == Some(')')
				|| self.peek_keyword("and")
				|| self.peek_keyword("or")
			{
				break;
			}
			let at = self.pos;
			let (rhs, rhs_depth) = self.parse_not()?;
			lhs = PredicateExpr::ImpliedAnd(Box::new(lhs), Box::new(rhs));
			depth = self.check_depth(depth.max(rhs_depth) + 1, at)?;
		}
		Ok((lhs, depth))
	}

	fn parse_not(&mut self) -> Result<Parsed> {
		self.skip_whitespace();
		let at = self.pos;
		let mut negations = 0;
		while self.eat_keyword("not") {
			negations += 1;
		}
		let (mut expr, depth) = self.parse_primary()?;
		let depth = self.check_depth(depth + negations, at)?;
		for _ in 0..negations {
			expr = PredicateExpr::Not(Box::new(expr));
		}
		Ok((expr, depth))
	}

	fn parse_primary(&mut self) -> Result<Parsed> {
		self.skip_whitespace();
		if self.peek() == Some('(') {
			self.nesting = self.check_depth(self.nesting + 1, self.pos)?;
			self.pos += 1;
			let inner = self.parse_or()?;
			self.skip_whitespace();
			if self.peek() != Some(')') {
				return Err(self.error("expected ')' in predicate expression"));
			}
			self.pos += 1;
			self.nesting -= 1;
			return Ok(inner);
		}
		Ok((PredicateExpr::Call(self.parse_call()?), 0))
	}

	fn parse_word(&mut self) -> Option<&'a str> {
		let rest = self.rest();
		let len = rest
			.char_indices()
			.find(|&(i, c)| {
				!(c.is_ascii_alphabetic() || c == '_' || (i > 0 && c.is_ascii_digit()))
			})
			.map_or(rest.len(), |(i, _)| i);
		if len == 0 {
			return None;
		}
		self.pos += len;
		Some(&rest[..len])
	}

	fn parse_call(&mut self) -> Result<PredicateCall> {
		let start = self.pos;
		let name = match self.parse_word() {
			Some(word) if !is_reserved_word(word) => word.to_string(),
			_ => {
				self.pos = start;
				return Err(self.error("expected predicate function name"));
			}
		};

		match self.peek() {
			Some(':') => {
				self.pos += 1;
				let mut args = vec![self.parse_arg(false)?];
				while self.peek() == Some(',') {
					self.pos += 1;
					args.push(self.parse_arg(false)?);
				}
				Ok(PredicateCall {
					kind: CallKind::Colon,
					name,
					args,
				})
			}
			Some('(') => {
				self.pos += 1;
				let mut args = Vec::new();
				self.skip_whitespace();
				if self.peek() != Some(')') {
					loop {
						self.skip_whitespace();
						args.push(self.parse_arg(true)?);
						self.skip_whitespace();
						match self.peek() {
							Some(',') => self.pos += 1,
							Some(')') => break,
							_ => return Err(self.error("expected ',' or ')' in argument list")),
						}
					}
				}
				self.pos += 1;
				Ok(PredicateCall {
					kind: CallKind::Paren,
					name,
					args,
				})
			}
			_ => Ok(PredicateCall {
				kind: CallKind::Bare,
				name,
				args: Vec::new(),
			}),
		}
	}

	fn parse_arg(&mut self, allow_keyword: bool) -> Result<PredicateArg> {
		if allow_keyword {
			let saved = self.pos;
			if let Some(word) = self.parse_word() {
				let word = word.to_string();
				if self.peek() == Some('=') {
					self.pos += 1;
					let value = self.parse_value()?;
					return Ok(PredicateArg {
						name: Some(word),
						value,
					});
				}
			}
			self.pos = saved;
		}
		Ok(PredicateArg {
			name: None,
			value: self.parse_value()?,
		})
	}

	fn parse_value(&mut self) -> Result<ArgValue> {
		match self.peek() {
			Some('"') => self.parse_string(),
			Some(c) if c.is_ascii_digit() || c == '-' => {
				let rest = self.rest();
				let len = rest
					.char_indices()
					.find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
					.map_or(rest.len(), |(i, _)| i);
				let value = rest[..len]
					.parse::<i64>()
					.map_err(|_| self.error("invalid integer argument"))?;
				self.pos += len;
				Ok(ArgValue::Int(value))
			}
			_ => match self.parse_word() {
				Some("true") => Ok(ArgValue::Bool(true)),
				Some("false") => Ok(ArgValue::Bool(false)),
				Some(word) => Ok(ArgValue::String(word.to_string())),
				None => Err(self.error("expected argument value")),
			},
		}
	}

	fn parse_string(&mut self) -> Result<ArgValue> {
		let start = self.pos;
		self.pos += 1;
		let mut value = String::new();
		let mut escaped = false;
		let text = self.text;
		for c in text[self.pos..].chars() {
			self.pos += c.len_utf8();
			if escaped {
				value.push(c);
				escaped = false;
			} else if c == '\\' {
				escaped = true;
			} else if c == '"' {
				return Ok(ArgValue::String(value));
			} else {
				value.push(c);
			}
		}
		self.pos = start;
		Err(self.error("unterminated string argument"))
	}
}
