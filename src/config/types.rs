use crate::error::{PathExprError, Result};
use crate::expression::{ExpressionReference, PathExpression, WEAKER_REFERENCE_NAME};
use crate::path::is_identifier;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Top-level configuration from a `.pathexpr.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
	/// If true, stop directory cascade and jump directly to ~/.pathexpr.toml.
	#[serde(default)]
	pub root: bool,

	/// If true, ignore every other config file, including ~/.pathexpr.toml.
	#[serde(default)]
	pub no_external_lookup: bool,

	/// Environment variable name that, if truthy, skips ~/.pathexpr.toml lookup.
	#[serde(default)]
	pub root_config_lookup_disable_env_var: Option<String>,

	/// Expressions that `%:name` references resolve to.
	#[serde(default)]
	pub references: BTreeMap<String, String>,
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	pub config: Config,
	pub path: PathBuf,
}

/// A reference definition with the config file it came from.
#[derive(Debug, Clone)]
pub struct ReferenceWithSource {
	pub expression: PathExpression,
	pub source: PathBuf,
}

/// Reference definitions merged across the cascade.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
	/// Definitions by name. The config nearest the start directory wins.
	pub references: BTreeMap<String, ReferenceWithSource>,
}

impl Config {
	/// Parse every reference definition.
	///
	/// Names must be identifiers other than `_`, and each definition must be
	/// a well-formed expression.
	pub fn expressions(&self, path: &Path) -> Result<BTreeMap<String, PathExpression>> {
		self.references
			.iter()
			.map(|(name, text)| {
				let invalid = |source| PathExprError::InvalidReference {
					name: name.clone(),
					path: path.to_path_buf(),
					source: Box::new(source),
				};
				if !is_identifier(name) || name == WEAKER_REFERENCE_NAME {
					return Err(invalid(PathExprError::syntax(
						name,
						0,
						"reference names must be identifiers other than '_'",
					)));
				}
				let expression = PathExpression::parse(text).map_err(invalid)?;
				Ok((name.clone(), expression))
			})
			.collect()
	}

	pub fn validate(&self, path: &Path) -> Result<()> {
		self.expressions(path).map(|_| ())
	}
}

impl MergedConfig {
	pub fn reference(&self, name: &str) -> Option<&ReferenceWithSource> {
		self.references.get(name)
	}

	/// Resolve `reference` against the merged definitions.
	///
	/// Only `%:name` references are defined by config files; anything else
	/// resolves to Nothing.
	pub fn resolve(&self, reference: &ExpressionReference) -> PathExpression {
		if !reference.path.is_empty() {
			log::debug!("no config definition for {}, using Nothing", reference);
			return PathExpression::nothing();
		}
		match self.reference(&reference.name) {
			Some(found) => found.expression.clone(),
			None => {
				log::debug!("no config definition for {}, using Nothing", reference);
				PathExpression::nothing()
			}
		}
	}

	/// Names of the definitions `name` refers to.
	fn dependencies(&self, name: &str) -> Vec<&str> {
		self.reference(name).map_or_else(Vec::new, |found| {
			found
				.expression
				.references()
				.into_iter()
				.filter(|reference| reference.path.is_empty() && !reference.is_weaker())
				.map(|reference| reference.name.as_str())
				.collect()
		})
	}

	/// Reject definitions that reach themselves through `%:name` references,
	/// which [`MergedConfig::resolver`] could never finish resolving.
	pub fn check_cycles(&self) -> Result<()> {
		let mut done: BTreeSet<&str> = BTreeSet::new();

		for start in self.references.keys() {
			if done.contains(start.as_str()) {
				continue;
			}
			// The current chain of names, each with its unvisited dependencies.
			let mut stack = vec![(start.as_str(), self.dependencies(start))];
			while let Some((name, pending)) = stack.last_mut() {
				let name = *name;
				let Some(next) = pending.pop() else {
					done.insert(name);
					stack.pop();
					continue;
				};
				if done.contains(next) {
					continue;
				}
				if let Some(first) = stack.iter().position(|(on_chain, _)| *on_chain == next) {
					let cycle = stack[first..]
						.iter()
						.map(|(on_chain, _)| *on_chain)
						.chain([next])
						.map(|on_chain| format!("%:{}", on_chain))
						.collect::<Vec<_>>()
						.join(" -> ");
					let source = self
						.reference(next)
						.map(|found| found.source.clone())
						.unwrap_or_default();
					return Err(PathExprError::InvalidReference {
						name: next.to_string(),
						path: source,
						source: Box::new(PathExprError::ReferenceCycle { cycle }),
					});
				}
				stack.push((next, self.dependencies(next)));
			}
		}

		Ok(())
	}

	/// A callback for [`PathExpression::resolve_references`].
	pub fn resolver(&self) -> impl FnMut(&ExpressionReference) -> PathExpression + '_ {
		move |reference| self.resolve(reference)
	}
}
