//! Single structural path patterns.
//!
//! A pattern is a prefix path followed by matching components. Components are
//! literal names, globs (`foo*`, `[ab]?`), bare predicates (`{isPrimPath}`) or
//! stretches (`//`, zero or more elements). The final component may denote a
//! property (`/World//*.visibility`).

use crate::error::{PathExprError, Result};
use crate::path::{PARENT_ELEMENT, ScenePath, is_identifier, is_property_name};
use crate::predicate::PredicateExpr;
use crate::predicate::parser::parse_predicate;
use std::fmt;
use std::str::FromStr;

/// One matching component of a pattern.
///
/// A component with empty text and no predicate is a stretch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PatternComponent {
	pub text: String,
	pub predicate: Option<PredicateExpr>,
	pub is_literal: bool,
}

impl PatternComponent {
	fn stretch() -> Self {
		Self::default()
	}

	pub fn is_stretch(&self) -> bool {
		self.text.is_empty() && self.predicate.is_none()
	}

	/// A predicate with no name or glob, matching any single element.
	pub fn is_bare_predicate(&self) -> bool {
		self.text.is_empty() && self.predicate.is_some()
	}
}

/// A path pattern and the builder used to edit it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathPattern {
	prefix: ScenePath,
	components: Vec<PatternComponent>,
	is_property: bool,
}

/// Whether `text` is a glob over a single element name.
///
/// Globs use `*`, `?`, and bracketed sets such as `[abc]`, `[a-z]`, `[!x]`.
pub(crate) fn is_glob(text: &str, allow_namespace: bool) -> bool {
	let mut in_brackets = false;
	let mut has_wildcard = false;
	let mut prev = '\0';
	for c in text.chars() {
		match c {
			'[' if !in_brackets => {
				in_brackets = true;
				has_wildcard = true;
			}
			']' if in_brackets && prev != '[' && prev != '!' => in_brackets = false,
			'!' if in_brackets && prev == '[' => {}
			'-' if in_brackets => {}
			'*' | '?' if !in_brackets => has_wildcard = true,
			':' if allow_namespace && !in_brackets => {}
			c if c.is_ascii_alphanumeric() || c == '_' => {}
			_ => return false,
		}
		prev = c;
	}
	has_wildcard && !in_brackets
}

fn check_child_text(text: &str) -> std::result::Result<bool, &'static str> {
	if text.is_empty() || is_identifier(text) || text == PARENT_ELEMENT {
		Ok(true)
	} else if is_glob(text, false) {
		Ok(false)
	} else {
		Err("invalid prim name or glob")
	}
}

fn check_property_text(text: &str) -> std::result::Result<bool, &'static str> {
	if is_property_name(text) {
		Ok(true)
	} else if is_glob(text, true) {
		Ok(false)
	} else {
		Err("invalid property name or glob")
	}
}

impl PathPattern {
	/// The empty pattern. It has an empty prefix and matches nothing.
	pub fn new() -> Self {
		Self::default()
	}

	/// `//`: every absolute path.
	pub fn everything() -> Self {
		PathPattern {
			prefix: ScenePath::absolute_root(),
			components: vec![PatternComponent::stretch()],
			is_property: false,
		}
	}

	/// `.//`: every path relative to the anchor.
	pub fn every_descendant() -> Self {
		PathPattern {
			prefix: ScenePath::reflexive(),
			components: vec![PatternComponent::stretch()],
			is_property: false,
		}
	}

	/// A pattern matching exactly `prefix`.
	pub fn with_prefix(prefix: ScenePath) -> Self {
		let mut pattern = Self::new();
		pattern.set_prefix(prefix);
		pattern
	}

	/// Parse a single pattern literal.
	pub fn parse(text: &str) -> Result<Self> {
		parse_pattern(text, text, 0)
	}

	pub fn is_empty(&self) -> bool {
		self.prefix.is_empty()
	}

	pub fn prefix(&self) -> &ScenePath {
		&self.prefix
	}

	pub fn components(&self) -> &[PatternComponent] {
		&self.components
	}

	pub fn is_property(&self) -> bool {
		self.is_property
	}

	pub fn is_absolute(&self) -> bool {
		self.prefix.is_absolute()
	}

	pub fn has_leading_stretch(&self) -> bool {
		self.prefix.is_absolute_root() && self.components.first().is_some_and(|c| c.is_stretch())
	}

	pub fn has_trailing_stretch(&self) -> bool {
		!self.is_property && self.components.last().is_some_and(|c| c.is_stretch())
	}

	/// Every predicate expression in component order.
	pub fn predicate_exprs(&self) -> impl Iterator<Item = &PredicateExpr> {
		self.components.iter().filter_map(|c| c.predicate.as_ref())
	}

	pub fn can_append_child(&self, text: &str) -> bool {
		!self.is_property && check_child_text(text).is_ok()
	}

	/// Append a child component.
	///
	/// Empty text with no predicate appends a stretch. A literal name appended
	/// while there are no components is folded into the prefix.
	pub fn append_child(
		&mut self,
		text: &str,
		predicate: Option<PredicateExpr>,
	) -> Result<&mut Self> {
		if self.is_property {
			return Err(PathExprError::invalid_path(
				self.to_string(),
				"cannot append a child to a property pattern",
			));
		}
		let is_literal =
			check_child_text(text).map_err(|reason| PathExprError::invalid_path(text, reason))?;

		if self.prefix.is_empty() {
			self.prefix = ScenePath::reflexive();
		}

		if text.is_empty() && predicate.is_none() {
			return Ok(self.append_stretch_if_possible());
		}

		if self.components.is_empty() && predicate.is_none() && is_literal {
			self.prefix = self.prefix.append_child(text)?;
			return Ok(self);
		}
		if text == PARENT_ELEMENT {
			return Err(PathExprError::invalid_path(
				self.to_string(),
				"'..' may only lead a relative pattern",
			));
		}

		self.components.push(PatternComponent {
			text: text.to_string(),
			predicate,
			is_literal: is_literal && !text.is_empty(),
		});
		Ok(self)
	}

	pub fn can_append_property(&self, text: &str) -> bool {
		!self.is_property
			&& !(self.prefix.is_absolute_root() && self.components.is_empty())
			&& check_property_text(text).is_ok()
	}

	/// Append a property component, ending the pattern.
	///
	/// A pattern ending in a stretch first gets a `*` prim component.
	pub fn append_property(
		&mut self,
		text: &str,
		predicate: Option<PredicateExpr>,
	) -> Result<&mut Self> {
		if !self.can_append_property(text) {
			return Err(PathExprError::invalid_path(
				format!("{}.{}", self, text),
				"cannot append this property to the pattern",
			));
		}
		let is_literal =
			check_property_text(text).map_err(|reason| PathExprError::invalid_path(text, reason))?;

		if self.prefix.is_empty() {
			self.prefix = ScenePath::reflexive();
		}
		if self.has_trailing_stretch() {
			self.components.push(PatternComponent {
				text: "*".to_string(),
				predicate: None,
				is_literal: false,
			});
		}

		if self.components.is_empty() && predicate.is_none() && is_literal {
			self.prefix = self.prefix.append_property(text)?;
		} else {
			self.components.push(PatternComponent {
				text: text.to_string(),
				predicate,
				is_literal,
			});
		}
		self.is_property = true;
		Ok(self)
	}

	pub fn append_stretch_if_possible(&mut self) -> &mut Self {
		if !self.is_property && !self.has_trailing_stretch() {
			if self.prefix.is_empty() {
				self.prefix = ScenePath::reflexive();
			}
			self.components.push(PatternComponent::stretch());
		}
		self
	}

	pub fn remove_trailing_stretch(&mut self) -> &mut Self {
		if self.has_trailing_stretch() {
			self.components.pop();
		}
		self
	}

	/// Remove the last component. Does nothing once only the prefix is left.
	pub fn remove_trailing_component(&mut self) -> &mut Self {
		if self.components.pop().is_some() {
			self.is_property = false;
		}
		self
	}

	/// Replace the prefix. A property prefix drops every component.
	pub fn set_prefix(&mut self, prefix: ScenePath) -> &mut Self {
		if prefix.is_property() {
			self.components.clear();
			self.is_property = true;
		} else if self.components.is_empty() {
			self.is_property = false;
		}
		self.prefix = prefix;
		self
	}

	pub fn text(&self) -> String {
		self.to_string()
	}
}

impl fmt::Display for PathPattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let first_is_stretch = self.components.first().is_none_or(|c| c.is_stretch());
		if self.prefix.is_absolute_root() {
			if self.components.is_empty() {
				f.write_str("/")?;
			}
		} else if self.prefix.is_reflexive() {
			if first_is_stretch {
				f.write_str(".")?;
			}
		} else {
			write!(f, "{}", self.prefix)?;
		}

		let last = self.components.len().saturating_sub(1);
		for (i, component) in self.components.iter().enumerate() {
			if component.is_stretch() {
				f.write_str("//")?;
				continue;
			}
			if self.is_property && i == last {
				f.write_str(".")?;
			} else if i == 0 && self.prefix.is_reflexive() {
				// leading component of a relative pattern
			} else if i > 0 && self.components[i - 1].is_stretch() {
				// already separated by the stretch
			} else {
				f.write_str("/")?;
			}
			f.write_str(&component.text)?;
			if let Some(ref predicate) = component.predicate {
				write!(f, "{{{}}}", predicate)?;
			}
		}
		Ok(())
	}
}

impl FromStr for PathPattern {
	type Err = PathExprError;

	fn from_str(s: &str) -> Result<Self> {
		PathPattern::parse(s)
	}
}

/// Index of the first `/` or `.` at or after `start` that is outside any
/// `[...]` or `{...}` group.
fn element_end(text: &str, start: usize) -> usize {
	let mut brackets = false;
	let mut braces = 0usize;
	let mut quoted = false;
	let mut escaped = false;
	for (i, c) in text[start..].char_indices() {
		if quoted {
			match c {
				_ if escaped => escaped = false,
				'\\' => escaped = true,
				'"' => quoted = false,
				_ => {}
			}
			continue;
		}
		match c {
			'"' if braces > 0 => quoted = true,
			'{' => braces += 1,
			'}' => braces = braces.saturating_sub(1),
			'[' if braces == 0 => brackets = true,
			']' if braces == 0 => brackets = false,
			'/' | '.' if braces == 0 && !brackets => return start + i,
			_ => {}
		}
	}
	text.len()
}

/// Split `name{predicate}` into its parts, parsing the predicate.
fn split_predicate(
	input: &str,
	element: &str,
	offset: usize,
) -> Result<(String, Option<PredicateExpr>)> {
	let Some(open) = element.find('{') else {
		return Ok((element.to_string(), None));
	};
	if !element.ends_with('}') {
		return Err(PathExprError::syntax(
			input,
			offset + open,
			"unterminated or misplaced predicate",
		));
	}
	let body = &element[open + 1..element.len() - 1];
	let predicate = parse_predicate(input, body, offset + open + 1)?;
	Ok((element[..open].to_string(), Some(predicate)))
}

/// Parse the pattern literal `text`, found at byte `offset` of `input`.
pub(crate) fn parse_pattern(input: &str, text: &str, offset: usize) -> Result<PathPattern> {
	let error = |pos: usize, message: &str| PathExprError::syntax(input, offset + pos, message);
	let to_syntax = |pos: usize| move |e: PathExprError| match e {
		PathExprError::InvalidPath { reason, .. } => PathExprError::syntax(input, offset + pos, reason),
		other => other,
	};

	if text.is_empty() {
		return Err(error(0, "empty pattern"));
	}

	let mut pattern = PathPattern::new();
	let mut pos = 0;
	// Whether the next element was introduced by a single `/`.
	let mut after_slash = false;
	let mut leading = true;

	if text.starts_with('/') {
		pattern.set_prefix(ScenePath::absolute_root());
		pos = 1;
		if text[pos..].starts_with('/') {
			pattern.append_stretch_if_possible();
			pos += 1;
		}
		leading = false;
	} else {
		pattern.set_prefix(ScenePath::reflexive());
	}

	while pos < text.len() {
		let rest = &text[pos..];

		if leading {
			let dots = if rest.starts_with("..") {
				2
			} else if rest.starts_with('.') {
				1
			} else {
				0
			};
			let after = rest[dots..].chars().next();
			if dots > 0 && after.is_none_or(|c| c == '/') {
				if dots == 2 {
					pattern.append_child(PARENT_ELEMENT, None).map_err(to_syntax(pos))?;
				} else if pos != 0 {
					return Err(error(pos, "misplaced '.' element"));
				}
				pos += dots;
				if text[pos..].starts_with("//") {
					pattern.append_stretch_if_possible();
					pos += 2;
					leading = false;
					after_slash = false;
				} else if text[pos..].starts_with('/') {
					pos += 1;
					after_slash = true;
				}
				continue;
			}
			leading = false;
		}

		let end = element_end(text, pos);
		let element = &text[pos..end];
		let next = text[end..].chars().next();

		if element.is_empty() && next != Some('.') {
			return Err(error(pos, "empty path element"));
		}
		if !element.is_empty() {
			let (name, predicate) = split_predicate(input, element, offset + pos)?;
			pattern.append_child(&name, predicate).map_err(to_syntax(pos))?;
		} else if after_slash {
			return Err(error(pos, "empty path element"));
		}
		pos = end;

		match next {
			Some('.') => {
				pos += 1;
				let end = element_end(text, pos);
				if end != text.len() {
					return Err(error(end, "a property must be the final element"));
				}
				let element = &text[pos..];
				let (name, predicate) = split_predicate(input, element, offset + pos)?;
				if name.is_empty() {
					return Err(error(pos, "empty property name"));
				}
				if !pattern.can_append_property(&name) {
					return Err(error(pos, "cannot append a property here"));
				}
				pattern.append_property(&name, predicate).map_err(to_syntax(pos))?;
				pos = text.len();
			}
			Some('/') if text[pos..].starts_with("//") => {
				pattern.append_stretch_if_possible();
				pos += 2;
				after_slash = false;
				if text[pos..].starts_with('/') {
					return Err(error(pos, "too many '/' characters"));
				}
			}
			Some('/') => {
				pos += 1;
				after_slash = true;
				if pos == text.len() {
					return Err(error(pos - 1, "trailing '/' in pattern"));
				}
			}
			_ => {}
		}
	}

	Ok(pattern)
}
