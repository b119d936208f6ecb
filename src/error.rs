use std::path::PathBuf;

/// Library-level structured errors for pathexpr.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum PathExprError {
	#[error("Syntax error at offset {offset}: {message}")]
	Syntax {
		offset: usize,
		message: String,
		input: String,
	},

	#[error("Invalid path <{path}>: {reason}")]
	InvalidPath { path: String, reason: String },

	#[error("Cannot build evaluator for incomplete expression: {text}")]
	IncompleteExpression { text: String },

	#[error("Unknown predicate function: {name}")]
	UnknownPredicate { name: String },

	#[error("Invalid glob pattern: {pattern}")]
	InvalidGlob {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid expression for reference '{name}' in {path}")]
	InvalidReference {
		name: String,
		path: PathBuf,
		#[source]
		source: Box<PathExprError>,
	},

	#[error("Reference cycle: {cycle}")]
	ReferenceCycle { cycle: String },

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

impl PathExprError {
	pub(crate) fn syntax(input: &str, offset: usize, message: impl Into<String>) -> Self {
		PathExprError::Syntax {
			offset,
			message: message.into(),
			input: input.to_string(),
		}
	}

	pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
		PathExprError::InvalidPath {
			path: path.into(),
			reason: reason.into(),
		}
	}
}

/// Result type alias using PathExprError.
pub type Result<T> = std::result::Result<T, PathExprError>;
