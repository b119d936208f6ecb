use crate::error::{PathExprError, Result};
use std::fmt;
use std::str::FromStr;

/// Element text that steps to the parent in a relative path.
pub const PARENT_ELEMENT: &str = "..";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Anchor {
	#[default]
	Empty,
	Relative,
	Absolute,
}

/// A hierarchical namespace path: prim name elements, optionally ending in a
/// property element.
///
/// Examples: `/`, `/World/geom`, `/World/geom.visibility`, `geom/mesh`,
/// `../sibling`, `.`, and the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScenePath {
	anchor: Anchor,
	prims: Vec<String>,
	property: Option<String>,
}

/// Whether `text` is a valid prim name.
pub fn is_identifier(text: &str) -> bool {
	let mut chars = text.chars();
	match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `text` is a valid, possibly namespaced, property name.
pub fn is_property_name(text: &str) -> bool {
	!text.is_empty() && text.split(':').all(is_identifier)
}

impl ScenePath {
	/// The empty path.
	pub fn empty() -> Self {
		Self::default()
	}

	/// The absolute root path `/`.
	pub fn absolute_root() -> Self {
		ScenePath {
			anchor: Anchor::Absolute,
			..Self::default()
		}
	}

	/// The reflexive relative path `.`.
	pub fn reflexive() -> Self {
		ScenePath {
			anchor: Anchor::Relative,
			..Self::default()
		}
	}

	/// Parse a path from text.
	pub fn parse(text: &str) -> Result<Self> {
		if text.is_empty() {
			return Ok(Self::empty());
		}

		let (anchor, body) = match text.strip_prefix('/') {
			Some(rest) => (Anchor::Absolute, rest),
			None => (Anchor::Relative, text),
		};

		let mut path = ScenePath {
			anchor,
			..Self::default()
		};
		if body.is_empty() {
			return Ok(path);
		}

		let segments: Vec<&str> = body.split('/').collect();
		let last = segments.len() - 1;
		for (i, segment) in segments.iter().enumerate() {
			match *segment {
				"" => return Err(PathExprError::invalid_path(text, "empty path element")),
				"." => {
					if anchor == Anchor::Absolute || i != 0 {
						return Err(PathExprError::invalid_path(text, "misplaced '.' element"));
					}
					continue;
				}
				PARENT_ELEMENT => {
					if anchor == Anchor::Absolute || path.prims.iter().any(|p| p != PARENT_ELEMENT) {
						return Err(PathExprError::invalid_path(
							text,
							"'..' may only lead a relative path",
						));
					}
					path.prims.push(PARENT_ELEMENT.to_string());
					continue;
				}
				_ => {}
			}

			let (name, property) = match segment.find('.') {
				Some(dot) => (&segment[..dot], Some(&segment[dot + 1..])),
				None => (*segment, None),
			};

			if property.is_some() && i != last {
				return Err(PathExprError::invalid_path(
					text,
					"a property must be the final element",
				));
			}

			if name.is_empty() {
				// Only `.prop`, a property of the reflexive path, has no prim name.
				if anchor != Anchor::Relative || segments.len() != 1 || property.is_none() {
					return Err(PathExprError::invalid_path(text, "empty prim name"));
				}
			} else if !is_identifier(name) {
				return Err(PathExprError::invalid_path(
					text,
					format!("invalid prim name '{}'", name),
				));
			} else {
				path.prims.push(name.to_string());
			}

			if let Some(prop) = property {
				if !is_property_name(prop) {
					return Err(PathExprError::invalid_path(
						text,
						format!("invalid property name '{}'", prop),
					));
				}
				path.property = Some(prop.to_string());
			}
		}

		if path.anchor == Anchor::Absolute && path.prims.is_empty() && path.property.is_some() {
			return Err(PathExprError::invalid_path(
				text,
				"the absolute root cannot have properties",
			));
		}

		Ok(path)
	}

	pub fn is_empty(&self) -> bool {
		self.anchor == Anchor::Empty
	}

	pub fn is_absolute(&self) -> bool {
		self.anchor == Anchor::Absolute
	}

	pub fn is_absolute_root(&self) -> bool {
		self.is_absolute() && self.prims.is_empty() && self.property.is_none()
	}

	pub fn is_reflexive(&self) -> bool {
		self.anchor == Anchor::Relative && self.prims.is_empty() && self.property.is_none()
	}

	/// Whether this path ends in a property element.
	pub fn is_property(&self) -> bool {
		self.property.is_some()
	}

	/// Whether this path names a prim (not a property, root, `.` or `..`).
	pub fn is_prim(&self) -> bool {
		self.property.is_none()
			&& self
				.prims
				.last()
				.is_some_and(|name| name != PARENT_ELEMENT)
	}

	/// Number of elements, counting the property element if present.
	pub fn element_count(&self) -> usize {
		self.prims.len() + usize::from(self.property.is_some())
	}

	/// The final element's name.
	///
	/// Empty for the empty path and the absolute root, `.` for the reflexive
	/// path.
	pub fn name(&self) -> &str {
		if let Some(ref prop) = self.property {
			return prop;
		}
		match self.prims.last() {
			Some(name) => name,
			None if self.anchor == Anchor::Relative => ".",
			None => "",
		}
	}

	/// The path with the final element removed.
	pub fn parent(&self) -> Option<ScenePath> {
		if self.property.is_some() {
			return Some(ScenePath {
				property: None,
				..self.clone()
			});
		}
		if self.prims.is_empty() {
			return None;
		}
		let mut parent = self.clone();
		parent.prims.pop();
		Some(parent)
	}

	/// Append a prim child element. `..` is accepted on relative paths.
	pub fn append_child(&self, name: &str) -> Result<ScenePath> {
		if self.is_empty() {
			return Err(PathExprError::invalid_path(
				name,
				"cannot append to the empty path",
			));
		}
		if self.is_property() {
			return Err(PathExprError::invalid_path(
				self.to_string(),
				"cannot append a child to a property path",
			));
		}

		let mut child = self.clone();
		if name == PARENT_ELEMENT {
			let ends_in_name = child.prims.last().is_some_and(|last| last != PARENT_ELEMENT);
			if ends_in_name {
				child.prims.pop();
			} else if child.anchor == Anchor::Relative {
				child.prims.push(name.to_string());
			} else {
				return Err(PathExprError::invalid_path(
					self.to_string(),
					"cannot ascend above the absolute root",
				));
			}
			return Ok(child);
		}

		if !is_identifier(name) {
			return Err(PathExprError::invalid_path(
				name,
				format!("invalid prim name '{}'", name),
			));
		}
		child.prims.push(name.to_string());
		Ok(child)
	}

	/// Append a property element to a prim path (or to `.`).
	pub fn append_property(&self, name: &str) -> Result<ScenePath> {
		if !(self.is_prim() || self.is_reflexive()) {
			return Err(PathExprError::invalid_path(
				self.to_string(),
				"properties can only be appended to prim paths",
			));
		}
		if !is_property_name(name) {
			return Err(PathExprError::invalid_path(
				name,
				format!("invalid property name '{}'", name),
			));
		}
		Ok(ScenePath {
			property: Some(name.to_string()),
			..self.clone()
		})
	}

	/// Whether `prefix` is this path or one of its ancestors.
	pub fn has_prefix(&self, prefix: &ScenePath) -> bool {
		if self.is_empty() || prefix.is_empty() || self.anchor != prefix.anchor {
			return false;
		}
		if prefix.property.is_some() {
			return self == prefix;
		}
		self.prims.len() >= prefix.prims.len() && self.prims[..prefix.prims.len()] == prefix.prims[..]
	}

	/// Every prefix of this path that ends in an element, shortest first.
	///
	/// The result has `element_count()` entries and ends with this path.
	pub fn prefixes(&self) -> Vec<ScenePath> {
		let mut result = Vec::with_capacity(self.element_count());
		for i in 1..=self.prims.len() {
			result.push(ScenePath {
				anchor: self.anchor,
				prims: self.prims[..i].to_vec(),
				property: None,
			});
		}
		if self.property.is_some() {
			result.push(self.clone());
		}
		result
	}

	/// Anchor a relative path to the absolute prim path `anchor`.
	///
	/// Absolute and empty paths are returned unchanged.
	pub fn make_absolute(&self, anchor: &ScenePath) -> Result<ScenePath> {
		if self.anchor != Anchor::Relative {
			return Ok(self.clone());
		}
		if !anchor.is_absolute() || anchor.is_property() {
			return Err(PathExprError::invalid_path(
				anchor.to_string(),
				"anchor must be an absolute prim path",
			));
		}

		let mut prims = anchor.prims.clone();
		for name in &self.prims {
			if name == PARENT_ELEMENT {
				if prims.pop().is_none() {
					return Err(PathExprError::invalid_path(
						self.to_string(),
						format!("ascends above the absolute root from <{}>", anchor),
					));
				}
			} else {
				prims.push(name.clone());
			}
		}

		if prims.is_empty() && self.property.is_some() {
			return Err(PathExprError::invalid_path(
				self.to_string(),
				"the absolute root cannot have properties",
			));
		}

		Ok(ScenePath {
			anchor: Anchor::Absolute,
			prims,
			property: self.property.clone(),
		})
	}

	/// Rewrite the `old_prefix` portion of this path to `new_prefix`.
	///
	/// Paths that do not have `old_prefix`, and rewrites that would produce an
	/// invalid path, are returned unchanged.
	pub fn replace_prefix(&self, old_prefix: &ScenePath, new_prefix: &ScenePath) -> ScenePath {
		if new_prefix.is_empty() || !self.has_prefix(old_prefix) {
			return self.clone();
		}
		if old_prefix.is_property() {
			return new_prefix.clone();
		}

		let remainder = &self.prims[old_prefix.prims.len()..];
		let has_tail = !remainder.is_empty() || self.property.is_some();
		if new_prefix.is_property() && has_tail {
			return self.clone();
		}
		if new_prefix.prims.is_empty() && remainder.is_empty() && self.property.is_some() {
			return self.clone();
		}

		let mut prims = new_prefix.prims.clone();
		prims.extend(remainder.iter().cloned());
		ScenePath {
			anchor: new_prefix.anchor,
			prims,
			property: self.property.clone().or_else(|| new_prefix.property.clone()),
		}
	}
}

impl fmt::Display for ScenePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.anchor {
			Anchor::Empty => return Ok(()),
			Anchor::Absolute => write!(f, "/{}", self.prims.join("/"))?,
			Anchor::Relative if self.prims.is_empty() => {
				if self.property.is_none() {
					write!(f, ".")?;
				}
			}
			Anchor::Relative => write!(f, "{}", self.prims.join("/"))?,
		}
		if let Some(ref prop) = self.property {
			write!(f, ".{}", prop)?;
		}
		Ok(())
	}
}

impl FromStr for ScenePath {
	type Err = PathExprError;

	fn from_str(s: &str) -> Result<Self> {
		ScenePath::parse(s)
	}
}
