use crate::error::{PathExprError, Result};
use crate::expression::{Node, PathExpression, map_leaves};
use crate::path::ScenePath;
use std::convert::Infallible;

impl PathExpression {
	/// Anchor every relative pattern prefix and reference path to `anchor`.
	pub fn make_absolute(&self, anchor: &ScenePath) -> Result<PathExpression> {
		if !anchor.is_absolute() || anchor.is_property() {
			return Err(PathExprError::invalid_path(
				anchor.to_string(),
				"anchor must be an absolute prim path",
			));
		}
		let Some(root) = self.root.clone() else {
			return Ok(self.clone());
		};

		let root = map_leaves(root, &mut |leaf| {
			Ok::<_, PathExprError>(Some(match leaf {
				Node::Pattern(mut pattern) => {
					if !pattern.is_absolute() {
						let prefix = pattern.prefix().make_absolute(anchor)?;
						pattern.set_prefix(prefix);
					}
					Node::Pattern(pattern)
				}
				Node::Reference(mut reference) => {
					reference.path = reference.path.make_absolute(anchor)?;
					Node::Reference(reference)
				}
				other => other,
			}))
		})?;
		Ok(PathExpression::from_root(root))
	}

	/// Rename `old_prefix` to `new_prefix` in every pattern prefix and
	/// reference path that has it.
	pub fn replace_prefix(&self, old_prefix: &ScenePath, new_prefix: &ScenePath) -> PathExpression {
		let Some(root) = self.root.clone() else {
			return self.clone();
		};

		let Ok(root) = map_leaves::<Infallible, _>(root, &mut |leaf| {
			Ok(Some(match leaf {
				Node::Pattern(mut pattern) => {
					let prefix = pattern.prefix().replace_prefix(old_prefix, new_prefix);
					if !prefix.is_property() || pattern.components().is_empty() {
						pattern.set_prefix(prefix);
					}
					Node::Pattern(pattern)
				}
				Node::Reference(mut reference) => {
					reference.path = reference.path.replace_prefix(old_prefix, new_prefix);
					Node::Reference(reference)
				}
				other => other,
			}))
		});
		PathExpression::from_root(root)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn e(text: &str) -> PathExpression {
		PathExpression::parse(text).unwrap()
	}

	fn p(text: &str) -> ScenePath {
		ScenePath::parse(text).unwrap()
	}

	#[test]
	fn test_make_absolute() {
		let expr = e("foo ../bar baz//qux");
		assert!(!expr.is_absolute());
		let absolute = expr.make_absolute(&p("/World/test")).unwrap();
		assert!(absolute.is_absolute());
		assert!(absolute.is_complete());
		assert_eq!(absolute, e("/World/test/foo /World/bar /World/test/baz//qux"));
	}

	#[test]
	fn test_make_absolute_leaves_absolute_patterns() {
		let expr = e("/a - child//{isPrimPath} .attr");
		let absolute = expr.make_absolute(&p("/prim")).unwrap();
		assert_eq!(absolute, e("/a - /prim/child//{isPrimPath} /prim.attr"));
	}

	#[test]
	fn test_make_absolute_references() {
		let expr = e("%_ %sub:geom %:lights");
		let absolute = expr.make_absolute(&p("/World")).unwrap();
		assert_eq!(absolute, e("%_ %/World/sub:geom %:lights"));
		assert!(!absolute.is_complete());
	}

	#[test]
	fn test_make_absolute_everything() {
		let absolute = e(".//").make_absolute(&p("/")).unwrap();
		assert_eq!(absolute, PathExpression::everything());
	}

	#[test]
	fn test_make_absolute_errors() {
		assert!(e("foo").make_absolute(&p("rel")).is_err());
		assert!(e("foo").make_absolute(&p("/a.b")).is_err());
		assert!(e("../../x").make_absolute(&p("/a")).is_err());
	}

	#[test]
	fn test_replace_prefix() {
		let expr = e("/World/test/foo /World/bar /World/test/baz//qux /Worldly /Other");
		let home = expr.replace_prefix(&p("/World"), &p("/Home"));
		assert_eq!(home, e("/Home/test/foo /Home/bar /Home/test/baz//qux /Worldly /Other"));
	}

	#[test]
	fn test_replace_prefix_references() {
		let expr = e("%/World/a:geom - %:other");
		let home = expr.replace_prefix(&p("/World"), &p("/Home"));
		assert_eq!(home, e("%/Home/a:geom - %:other"));
	}
}
