use crate::config::types::Config;
use crate::error::{PathExprError, Result};
use std::path::Path;

/// Parse a config file from the given path.
pub fn parse_config_file(path: &Path) -> Result<Config> {
	let content = std::fs::read_to_string(path).map_err(|source| PathExprError::ConfigReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse and validate config text. `path` is only used in errors.
pub fn parse_config_str(content: &str, path: &Path) -> Result<Config> {
	let config: Config =
		toml::from_str(content).map_err(|source| PathExprError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		})?;

	config.validate(path)?;

	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expression::PathExpression;
	use std::path::PathBuf;

	#[test]
	fn test_parse_empty_config() {
		let path = PathBuf::from("test.toml");
		let config = parse_config_str("", &path).unwrap();

		assert!(!config.root);
		assert!(!config.no_external_lookup);
		assert!(config.root_config_lookup_disable_env_var.is_none());
		assert!(config.references.is_empty());
	}

	#[test]
	fn test_parse_cascade_flags() {
		let content = r#"
root = true
no-external-lookup = true
root-config-lookup-disable-env-var = "CI"
"#;
		let path = PathBuf::from("test.toml");
		let config = parse_config_str(content, &path).unwrap();

		assert!(config.root);
		assert!(config.no_external_lookup);
		assert_eq!(
			config.root_config_lookup_disable_env_var,
			Some("CI".to_string())
		);
	}

	#[test]
	fn test_parse_references() {
		let content = r#"
[references]
geom = "/World/geom//"
lights = "//Light* - %:geom"
"#;
		let path = PathBuf::from("test.toml");
		let config = parse_config_str(content, &path).unwrap();
		let expressions = config.expressions(&path).unwrap();

		assert_eq!(expressions.len(), 2);
		assert_eq!(
			expressions["geom"],
			PathExpression::parse("/World/geom//").unwrap()
		);
		assert!(expressions["lights"].contains_expression_references());
	}

	#[test]
	fn test_invalid_reference_expression() {
		let content = r#"
[references]
broken = "/World/geom - "
"#;
		let path = PathBuf::from("test.toml");
		match parse_config_str(content, &path).unwrap_err() {
			PathExprError::InvalidReference { name, path, source } => {
				assert_eq!(name, "broken");
				assert_eq!(path, PathBuf::from("test.toml"));
				assert!(matches!(*source, PathExprError::Syntax { .. }));
			}
			other => panic!("Expected InvalidReference error, got {other:?}"),
		}
	}

	#[test]
	fn test_invalid_reference_names() {
		for name in ["\"my-geom\"", "_", "\"1st\""] {
			let content = format!("[references]\n{} = \"/a\"\n", name);
			let result = parse_config_str(&content, Path::new("test.toml"));
			assert!(
				matches!(result, Err(PathExprError::InvalidReference { .. })),
				"expected {name} to be rejected"
			);
		}
	}

	#[test]
	fn test_malformed_toml() {
		let result = parse_config_str("references = 3", Path::new("test.toml"));
		assert!(matches!(result, Err(PathExprError::ConfigParseError { .. })));
	}
}
