use crate::error::{PathExprError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
	Pattern,
	Reference,
	Complement,
	Intersection,
	Difference,
	Union,
	LeftParen,
	RightParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
	pub kind: TokenKind,
	pub text: &'a str,
	/// Byte offset of `text` in the input.
	pub offset: usize,
}

fn operator_kind(c: char) -> Option<TokenKind> {
	match c {
		'~' => Some(TokenKind::Complement),
		'&' => Some(TokenKind::Intersection),
		'-' => Some(TokenKind::Difference),
		'+' | '|' => Some(TokenKind::Union),
		'(' => Some(TokenKind::LeftParen),
		')' => Some(TokenKind::RightParen),
		_ => None,
	}
}

/// Split expression text into tokens.
///
/// Pattern and reference literals run until whitespace or an operator
/// character, except inside `[...]` and `{...}` groups.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
	let mut tokens = Vec::new();
	let mut pos = 0;
	while let Some(c) = input[pos..].chars().next() {
		if c.is_whitespace() {
			pos += c.len_utf8();
			continue;
		}
		if let Some(kind) = operator_kind(c) {
			tokens.push(Token {
				kind,
				text: &input[pos..pos + 1],
				offset: pos,
			});
			pos += 1;
			continue;
		}

		let len = literal_len(input, pos)?;
		let kind = if c == '%' {
			TokenKind::Reference
		} else {
			TokenKind::Pattern
		};
		tokens.push(Token {
			kind,
			text: &input[pos..pos + len],
			offset: pos,
		});
		pos += len;
	}
	Ok(tokens)
}

fn literal_len(input: &str, start: usize) -> Result<usize> {
	let text = &input[start..];
	// The open group's delimiter and its offset.
	let mut group: Option<(char, usize)> = None;
	let mut quoted = false;
	let mut escaped = false;

	for (i, c) in text.char_indices() {
		if quoted {
			match c {
				_ if escaped => escaped = false,
				'\\' => escaped = true,
				'"' => quoted = false,
				_ => {}
			}
			continue;
		}
		match (group, c) {
			(Some(('{', _)), '"') => quoted = true,
			(Some(('{', _)), '}') | (Some(('[', _)), ']') => group = None,
			(Some(_), _) => {}
			(None, '{' | '[') => group = Some((c, i)),
			(None, c) if c.is_whitespace() || operator_kind(c).is_some() => return Ok(i),
			(None, _) => {}
		}
	}

	match group {
		Some((delimiter, i)) => Err(PathExprError::syntax(
			input,
			start + i,
			format!("unterminated '{}'", delimiter),
		)),
		None => Ok(text.len()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn kinds(input: &str) -> Vec<TokenKind> {
		tokenize(input).unwrap().iter().map(|t| t.kind).collect()
	}

	#[test]
	fn test_tokenize_operators() {
		use TokenKind::*;
		assert_eq!(
			kinds("~(/a & /b) - /c + /d | %_"),
			vec![
				Complement,
				LeftParen,
				Pattern,
				Intersection,
				Pattern,
				RightParen,
				Difference,
				Pattern,
				Union,
				Pattern,
				Union,
				Reference,
			]
		);
	}

	#[test]
	fn test_literals_end_at_operators() {
		let tokens = tokenize("/a//-/b").unwrap();
		let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
		assert_eq!(texts, vec!["/a//", "-", "/b"]);
		assert_eq!(tokens[2].offset, 5);
	}

	#[test]
	fn test_groups_are_opaque() {
		let tokens = tokenize("/a/[a-c]{f(\"x y\", -1)} /b").unwrap();
		let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
		assert_eq!(texts, vec!["/a/[a-c]{f(\"x y\", -1)}", "/b"]);
	}

	#[test]
	fn test_unterminated_group() {
		match tokenize("/a /b{isPrimPath").unwrap_err() {
			PathExprError::Syntax { offset, .. } => assert_eq!(offset, 5),
			other => panic!("Expected Syntax error, got {other:?}"),
		}
		assert!(tokenize("/a/[bc").is_err());
	}

	#[test]
	fn test_blank_input() {
		assert!(tokenize("").unwrap().is_empty());
		assert!(tokenize(" \t\n ").unwrap().is_empty());
	}
}
