use crate::error::{PathExprError, Result};
use crate::path::ScenePath;
use crate::predicate::{PredicateArg, PredicateExpr};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Signature of a predicate function.
pub type PredicateFn = dyn Fn(&ScenePath, &[PredicateArg]) -> bool + Send + Sync;

/// Named predicate functions that `{...}` tags may call.
#[derive(Clone, Default)]
pub struct PredicateLibrary {
	functions: HashMap<String, Arc<PredicateFn>>,
}

impl PredicateLibrary {
	/// An empty library.
	pub fn new() -> Self {
		Self::default()
	}

	/// The library with `isPrimPath` and `isPropertyPath`.
	pub fn basic() -> Self {
		Self::new()
			.define("isPrimPath", |path, _| path.is_prim())
			.define("isPropertyPath", |path, _| path.is_property())
	}

	/// Add (or replace) a predicate function.
	pub fn define<F>(mut self, name: impl Into<String>, function: F) -> Self
	where
		F: Fn(&ScenePath, &[PredicateArg]) -> bool + Send + Sync + 'static,
	{
		self.functions.insert(name.into(), Arc::new(function));
		self
	}

	pub fn contains(&self, name: &str) -> bool {
		self.functions.contains_key(name)
	}

	/// Bind every call in `expr` to this library's functions.
	pub(crate) fn link(&self, expr: &PredicateExpr) -> Result<LinkedPredicate> {
		Ok(match expr {
			PredicateExpr::Call(call) => {
				let function = self.functions.get(&call.name).ok_or_else(|| {
					PathExprError::UnknownPredicate {
						name: call.name.clone(),
					}
				})?;
				LinkedPredicate::Call {
					function: Arc::clone(function),
					args: call.args.clone(),
				}
			}
			PredicateExpr::Not(operand) => LinkedPredicate::Not(Box::new(self.link(operand)?)),
			PredicateExpr::ImpliedAnd(lhs, rhs) | PredicateExpr::And(lhs, rhs) => {
				LinkedPredicate::And(Box::new(self.link(lhs)?), Box::new(self.link(rhs)?))
			}
			PredicateExpr::Or(lhs, rhs) => {
				LinkedPredicate::Or(Box::new(self.link(lhs)?), Box::new(self.link(rhs)?))
			}
		})
	}
}

impl fmt::Debug for PredicateLibrary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.functions.keys().collect();
		names.sort();
		f.debug_struct("PredicateLibrary")
			.field("functions", &names)
			.finish()
	}
}

/// A predicate expression bound to library functions.
#[derive(Clone)]
pub(crate) enum LinkedPredicate {
	Call {
		function: Arc<PredicateFn>,
		args: Vec<PredicateArg>,
	},
	Not(Box<LinkedPredicate>),
	And(Box<LinkedPredicate>, Box<LinkedPredicate>),
	Or(Box<LinkedPredicate>, Box<LinkedPredicate>),
}

impl LinkedPredicate {
	pub(crate) fn evaluate(&self, path: &ScenePath) -> bool {
		match self {
			LinkedPredicate::Call { function, args } => function(path, args),
			LinkedPredicate::Not(operand) => !operand.evaluate(path),
			LinkedPredicate::And(lhs, rhs) => lhs.evaluate(path) && rhs.evaluate(path),
			LinkedPredicate::Or(lhs, rhs) => lhs.evaluate(path) || rhs.evaluate(path),
		}
	}
}

impl fmt::Debug for LinkedPredicate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LinkedPredicate::Call { args, .. } => f.debug_struct("Call").field("args", args).finish(),
			LinkedPredicate::Not(operand) => f.debug_tuple("Not").field(operand).finish(),
			LinkedPredicate::And(lhs, rhs) => f.debug_tuple("And").field(lhs).field(rhs).finish(),
			LinkedPredicate::Or(lhs, rhs) => f.debug_tuple("Or").field(lhs).field(rhs).finish(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::predicate::ArgValue;

	fn p(text: &str) -> ScenePath {
		ScenePath::parse(text).unwrap()
	}

	#[test]
	fn test_basic_library() {
		let library = PredicateLibrary::basic();
		assert!(library.contains("isPrimPath"));
		assert!(library.contains("isPropertyPath"));
		assert!(!library.contains("isMesh"));

		let prim = library.link(&PredicateExpr::call("isPrimPath")).unwrap();
		assert!(prim.evaluate(&p("/a")));
		assert!(!prim.evaluate(&p("/a.b")));

		let prop = library.link(&PredicateExpr::call("isPropertyPath")).unwrap();
		assert!(prop.evaluate(&p("/a.b")));
		assert!(!prop.evaluate(&p("/a")));
	}

	#[test]
	fn test_link_unknown_function() {
		let library = PredicateLibrary::basic();
		let expr = PredicateExpr::parse("isPrimPath and isMesh").unwrap();
		match library.link(&expr).unwrap_err() {
			PathExprError::UnknownPredicate { name } => assert_eq!(name, "isMesh"),
			_ => panic!("Expected UnknownPredicate error"),
		}
	}

	#[test]
	fn test_logic_and_arguments() {
		let library = PredicateLibrary::basic().define("nameLength", |path, args| {
			matches!(args.first(), Some(PredicateArg { value: ArgValue::Int(n), .. })
				if path.name().len() as i64 == *n)
		});
		let expr = PredicateExpr::parse("isPrimPath and not nameLength:3").unwrap();
		let linked = library.link(&expr).unwrap();
		assert!(linked.evaluate(&p("/ab")));
		assert!(!linked.evaluate(&p("/abc")));
		assert!(!linked.evaluate(&p("/ab.cd")));

		let either = library
			.link(&PredicateExpr::parse("isPropertyPath or nameLength(3)").unwrap())
			.unwrap();
		assert!(either.evaluate(&p("/abc")));
		assert!(either.evaluate(&p("/a.b")));
		assert!(!either.evaluate(&p("/ab")));
	}
}
