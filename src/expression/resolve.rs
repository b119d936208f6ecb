use crate::expression::{ExpressionReference, Node, PathExpression, map_leaves};
use std::convert::Infallible;

impl PathExpression {
	/// Replace every reference with `resolve(reference)`.
	///
	/// Substitutes that contain references are resolved again with the same
	/// callback until none remain, so `resolve` must not be cyclic. Returning
	/// Nothing removes the reference.
	pub fn resolve_references<F>(&self, mut resolve: F) -> PathExpression
	where
		F: FnMut(&ExpressionReference) -> PathExpression,
	{
		if !self.contains_expression_references() {
			return self.clone();
		}
		PathExpression::from_root(resolve_root(self.root.clone(), &mut resolve))
	}

	/// Replace each `%_` with `weaker`, leaving named references in place.
	///
	/// Any `%_` inside `weaker` is kept, so `c.compose_over(&b).compose_over(&a)`
	/// layers `c` over `b` over `a`.
	pub fn compose_over(&self, weaker: &PathExpression) -> PathExpression {
		let Some(root) = self.root.clone() else {
			return self.clone();
		};
		if !self.contains_weaker_expression_reference() {
			return self.clone();
		}
		let Ok(root) = map_leaves::<Infallible, _>(root, &mut |leaf| {
			Ok(match leaf {
				Node::Reference(reference) if reference.is_weaker() => weaker.root.clone(),
				other => Some(other),
			})
		});
		PathExpression::from_root(root)
	}
}

fn resolve_root<F>(root: Option<Node>, resolve: &mut F) -> Option<Node>
where
	F: FnMut(&ExpressionReference) -> PathExpression,
{
	let Ok(resolved) = map_leaves::<Infallible, _>(root?, &mut |leaf| {
		Ok(match leaf {
			Node::Reference(reference) => {
				let substitute = resolve(&reference);
				log::trace!("resolved {} to '{}'", reference, substitute);
				if substitute.contains_expression_references() {
					resolve_root(substitute.root, &mut *resolve)
				} else {
					substitute.root
				}
			}
			other => Some(other),
		})
	});
	resolved
}
