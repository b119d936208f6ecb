use crate::error::{PathExprError, Result};
use crate::eval::MatchResult;
use crate::path::ScenePath;
use crate::pattern::PathPattern;
use crate::predicate::PredicateLibrary;
use crate::predicate::library::LinkedPredicate;
use regex::Regex;

/// How a component tests an element's name.
#[derive(Debug)]
enum NameMatcher {
	Literal(String),
	Glob(Regex),
	/// Bare predicate: any single name.
	Any,
}

/// Which kind of element a component may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
	Prim,
	Property,
	Either,
}

#[derive(Debug)]
struct Step {
	name: NameMatcher,
	kind: ElementKind,
	predicate: Option<LinkedPredicate>,
}

impl Step {
	fn matches(&self, element: &ScenePath) -> bool {
		let kind_ok = match self.kind {
			ElementKind::Prim => element.is_prim(),
			ElementKind::Property => element.is_property(),
			ElementKind::Either => true,
		};
		if !kind_ok {
			return false;
		}
		let name_ok = match self.name {
			NameMatcher::Literal(ref name) => element.name() == name,
			NameMatcher::Glob(ref regex) => regex.is_match(element.name()),
			NameMatcher::Any => true,
		};
		name_ok && self.predicate.as_ref().is_none_or(|p| p.evaluate(element))
	}
}

/// Where one pattern stands after consuming the elements of a path so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PatternState {
	/// The path is a proper ancestor of the pattern prefix.
	Pending,
	/// Live automaton positions; `positions[k]` means `k` steps consumed.
	Active(Vec<bool>),
	/// The verdict for this path and all its descendants.
	Constant(bool),
}

/// A pattern compiled to an automaton over path elements.
///
/// Positions run from `0` to `steps.len()`. A stretch is a self-loop on the
/// position it precedes, so `stretch_before[steps.len()]` is a trailing
/// stretch.
#[derive(Debug)]
pub(crate) struct CompiledPattern {
	text: String,
	prefix: ScenePath,
	steps: Vec<Step>,
	stretch_before: Vec<bool>,
}

/// Translate a glob into an anchored regex.
pub(crate) fn glob_to_regex(glob: &str) -> String {
	let mut out = String::from("^(?:");
	let mut in_brackets = false;
	let mut prev = '\0';
	for c in glob.chars() {
		match c {
			'[' if !in_brackets => {
				in_brackets = true;
				out.push('[');
			}
			'!' if in_brackets && prev == '[' => out.push('^'),
			']' if in_brackets => {
				in_brackets = false;
				out.push(']');
			}
			'-' if in_brackets => out.push('-'),
			'*' if !in_brackets => out.push_str(".*"),
			'?' if !in_brackets => out.push('.'),
			c => out.push_str(&regex::escape(&c.to_string())),
		}
		prev = c;
	}
	out.push_str(")$");
	out
}

fn compile_glob(glob: &str) -> Result<Regex> {
	Regex::new(&glob_to_regex(glob)).map_err(|source| PathExprError::InvalidGlob {
		pattern: glob.to_string(),
		source,
	})
}

impl CompiledPattern {
	pub(crate) fn compile(pattern: &PathPattern, library: &PredicateLibrary) -> Result<Self> {
		let components = pattern.components();
		let mut steps = Vec::new();
		let mut stretch_before = vec![false];

		for (i, component) in components.iter().enumerate() {
			if component.is_stretch() {
				if let Some(last) = stretch_before.last_mut() {
					*last = true;
				}
				continue;
			}
			let is_property_step = pattern.is_property() && i + 1 == components.len();
			let (name, kind) = if component.is_bare_predicate() {
				(NameMatcher::Any, ElementKind::Either)
			} else if component.is_literal {
				(NameMatcher::Literal(component.text.clone()), ElementKind::Prim)
			} else {
				(NameMatcher::Glob(compile_glob(&component.text)?), ElementKind::Prim)
			};
			let kind = match (is_property_step, kind) {
				(true, ElementKind::Prim) => ElementKind::Property,
				(_, kind) => kind,
			};
			let predicate = component
				.predicate
				.as_ref()
				.map(|expr| library.link(expr))
				.transpose()?;
			steps.push(Step {
				name,
				kind,
				predicate,
			});
			stretch_before.push(false);
		}

		if !pattern.is_absolute() {
			log::warn!(
				"pattern '{}' is not absolute and will not match any path",
				pattern
			);
		}

		Ok(CompiledPattern {
			text: pattern.to_string(),
			prefix: pattern.prefix().clone(),
			steps,
			stretch_before,
		})
	}

	pub(crate) fn text(&self) -> &str {
		&self.text
	}

	/// State at the absolute root, before any element is consumed.
	pub(crate) fn initial_state(&self) -> PatternState {
		if self.prefix.is_absolute_root() {
			PatternState::Active(self.start_positions())
		} else if self.prefix.is_absolute() {
			PatternState::Pending
		} else {
			PatternState::Constant(false)
		}
	}

	fn start_positions(&self) -> Vec<bool> {
		let mut positions = vec![false; self.steps.len() + 1];
		positions[0] = true;
		positions
	}

	/// Advance `state` over the last element of `path`.
	pub(crate) fn advance(&self, state: &PatternState, path: &ScenePath) -> PatternState {
		match state {
			PatternState::Constant(_) => state.clone(),
			PatternState::Pending => {
				if *path == self.prefix {
					let mut positions = self.start_positions();
					self.close_over_bare_predicates(&mut positions, path);
					PatternState::Active(positions)
				} else if self.prefix.has_prefix(path) {
					PatternState::Pending
				} else {
					PatternState::Constant(false)
				}
			}
			PatternState::Active(positions) => {
				let n = self.steps.len();
				let mut next = vec![false; n + 1];
				for k in (0..=n).filter(|&k| positions[k]) {
					if self.stretch_before[k] {
						next[k] = true;
					}
					if k < n && self.steps[k].matches(path) {
						next[k + 1] = true;
					}
				}
				self.close_over_bare_predicates(&mut next, path);
				if next.iter().any(|&live| live) {
					PatternState::Active(next)
				} else {
					PatternState::Constant(false)
				}
			}
		}
	}

	/// A bare predicate right after a stretch may match the element the
	/// stretch starts from, so it can be satisfied without consuming one.
	fn close_over_bare_predicates(&self, positions: &mut [bool], path: &ScenePath) {
		for k in 0..self.steps.len() {
			let step = &self.steps[k];
			if positions[k]
				&& self.stretch_before[k]
				&& matches!(step.name, NameMatcher::Any)
				&& step.matches(path)
			{
				positions[k + 1] = true;
			}
		}
	}

	/// The verdict a state implies for the path that produced it.
	pub(crate) fn verdict(&self, state: &PatternState) -> MatchResult {
		match state {
			PatternState::Pending => MatchResult::varying(false),
			PatternState::Constant(matched) => MatchResult::constant(*matched),
			PatternState::Active(positions) => {
				let n = self.steps.len();
				if positions[n] && self.stretch_before[n] {
					MatchResult::constant(true)
				} else {
					MatchResult::varying(positions[n])
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn compile(text: &str) -> CompiledPattern {
		CompiledPattern::compile(&PathPattern::parse(text).unwrap(), &PredicateLibrary::basic())
			.unwrap()
	}

	fn run(pattern: &CompiledPattern, path: &str) -> MatchResult {
		let path = ScenePath::parse(path).unwrap();
		let mut state = pattern.initial_state();
		for prefix in path.prefixes() {
			state = pattern.advance(&state, &prefix);
		}
		pattern.verdict(&state)
	}

	#[test]
	fn test_glob_to_regex() {
		assert_eq!(glob_to_regex("foo*"), "^(?:foo.*)$");
		assert_eq!(glob_to_regex("f?o"), "^(?:f.o)$");
		assert_eq!(glob_to_regex("[!a-c]x"), "^(?:[^a-c]x)$");
		assert_eq!(glob_to_regex("ns:*"), "^(?:ns:.*)$");

		let regex = compile_glob("[ab]?*").unwrap();
		assert!(regex.is_match("ax"));
		assert!(regex.is_match("bxyz"));
		assert!(!regex.is_match("cx"));
		assert!(!regex.is_match("a"));
	}

	#[test]
	fn test_literal_and_glob_steps() {
		let pattern = compile("/foo/bar/*");
		assert!(!run(&pattern, "/foo").matched);
		assert!(!run(&pattern, "/foo/bar").matched);
		assert!(run(&pattern, "/foo/bar/a").matched);
		assert!(!run(&pattern, "/foo/bar/a/x").matched);
		assert!(!run(&pattern, "/foo/bar.a").matched);
		assert!(run(&pattern, "/foo/bar/a/x").constant);
		assert!(run(&pattern, "/other").constant);
	}

	#[test]
	fn test_stretch_backtracks() {
		let pattern = compile("/foo*//bar");
		assert!(run(&pattern, "/foo/x/y/z/bar").matched);
		assert!(run(&pattern, "/foo/bar/bar").matched);
		assert!(!run(&pattern, "/foo/x/y/z/bar/baz").matched);
		assert!(!run(&pattern, "/foo/x/y/z/bar/baz").constant);
		assert!(!run(&pattern, "/foo/x/y/z/bar.baz").matched);
		assert!(run(&pattern, "/fooBar/x/bar").matched);
		assert!(!run(&pattern, "/fo/x/bar").matched);
	}

	#[test]
	fn test_property_step() {
		let pattern = compile("/a//*.vis*");
		assert!(run(&pattern, "/a/b.visibility").matched);
		assert!(run(&pattern, "/a/b/c.vis").matched);
		assert!(!run(&pattern, "/a.vis").matched);
		assert!(!run(&pattern, "/a/b/vis").matched);
		assert!(!run(&pattern, "/a/b.other").matched);
	}

	#[test]
	fn test_bare_predicate_after_stretch_matches_start() {
		let pattern = compile("/foo//{isPrimPath}");
		assert!(run(&pattern, "/foo").matched);
		assert!(run(&pattern, "/foo/a/b").matched);
		assert!(!run(&pattern, "/foo/a.b").matched);

		let pattern = compile("/a//{isPropertyPath}");
		assert!(!run(&pattern, "/a").matched);
		assert!(run(&pattern, "/a.b").matched);
		assert!(run(&pattern, "/a/b/c.d").matched);
	}

	#[test]
	fn test_prefix_states() {
		let pattern = compile("/prefix/path//");
		assert_eq!(run(&pattern, "/"), MatchResult::varying(false));
		assert_eq!(run(&pattern, "/prefix"), MatchResult::varying(false));
		assert_eq!(run(&pattern, "/prefix/path"), MatchResult::constant(true));
		assert_eq!(run(&pattern, "/prefix/wrong"), MatchResult::constant(false));

		let pattern = compile("/a/b.c");
		assert_eq!(run(&pattern, "/a/b"), MatchResult::varying(false));
		assert_eq!(run(&pattern, "/a/b.c"), MatchResult::varying(true));
		assert_eq!(run(&pattern, "/a/b.d"), MatchResult::constant(false));
	}

	#[test]
	fn test_relative_pattern_never_matches() {
		let pattern = compile("foo//");
		assert_eq!(pattern.initial_state(), PatternState::Constant(false));
		assert_eq!(run(&pattern, "/foo"), MatchResult::constant(false));
	}

	#[test]
	fn test_unknown_predicate() {
		let pattern = PathPattern::parse("/a/{isMesh}").unwrap();
		let result = CompiledPattern::compile(&pattern, &PredicateLibrary::basic());
		assert!(matches!(result, Err(PathExprError::UnknownPredicate { .. })));
	}
}
