use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use pathexpr::config::{discover_configs, load_merged_config, merge_configs, user_config_path};
use pathexpr::{Evaluator, PathExprError, PathExpression, ScenePath};

#[derive(Parser)]
#[command(name = "pathexpr")]
#[command(
	author,
	version,
	about = "Parse, compose and evaluate path expressions over hierarchical paths"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the canonical text of an expression
	Parse {
		expression: String,
	},
	/// Evaluate an expression against one or more paths
	Match {
		expression: String,
		#[arg(required = true)]
		paths: Vec<String>,
		/// Expression that `%_` refers to
		#[arg(long, value_name = "EXPR")]
		weaker: Option<String>,
	},
	/// Compose expressions, strongest first, over each other's `%_`
	Compose {
		#[arg(required = true)]
		expressions: Vec<String>,
	},
	/// Anchor relative patterns and reference paths to a prim path
	Absolute {
		expression: String,
		#[arg(long, value_name = "PATH")]
		anchor: String,
	},
	/// Replace a path prefix in every pattern and reference path
	ReplacePrefix {
		expression: String,
		old: String,
		new: String,
	},
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display every config file in the cascade and its references
	Show,
	/// Check all config files for errors
	Validate,
}

fn main() -> ExitCode {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Parse { expression } => handle_parse(&expression),
		Commands::Match {
			expression,
			paths,
			weaker,
		} => handle_match(&expression, &paths, weaker.as_deref()),
		Commands::Compose { expressions } => handle_compose(&expressions),
		Commands::Absolute { expression, anchor } => handle_absolute(&expression, &anchor),
		Commands::ReplacePrefix { expression, old, new } => {
			handle_replace_prefix(&expression, &old, &new)
		}
		Commands::Config { action } => match action {
			ConfigAction::Show => handle_config_show(),
			ConfigAction::Validate => handle_config_validate(),
		},
	}
}

fn parse_expression(text: &str) -> Result<PathExpression> {
	PathExpression::parse(text).with_context(|| format!("Invalid expression '{}'", text))
}

fn parse_path(text: &str) -> Result<ScenePath> {
	ScenePath::parse(text).with_context(|| format!("Invalid path '{}'", text))
}

fn handle_parse(text: &str) -> Result<ExitCode> {
	match PathExpression::parse(text) {
		Ok(expr) => {
			println!("{}", expr);
			Ok(ExitCode::SUCCESS)
		}
		Err(PathExprError::Syntax {
			offset,
			message,
			input,
		}) => {
			let column = input.get(..offset).map_or(0, |head| head.chars().count());
			eprintln!("error: {} (offset {})", message, offset);
			eprintln!("  {}", input);
			eprintln!("  {}^", " ".repeat(column));
			Ok(ExitCode::FAILURE)
		}
		Err(e) => Err(e).with_context(|| format!("Invalid expression '{}'", text)),
	}
}

fn handle_match(text: &str, paths: &[String], weaker: Option<&str>) -> Result<ExitCode> {
	let mut expr = parse_expression(text)?;
	if let Some(weaker) = weaker {
		expr = expr.compose_over(&parse_expression(weaker)?);
	}

	if expr.contains_expression_references() {
		let cwd = std::env::current_dir().context("Failed to get current directory")?;
		let config = load_merged_config(&cwd).context("Failed to load configuration")?;
		expr = expr.resolve_references(config.resolver());
	}

	let evaluator = Evaluator::build(&expr)
		.with_context(|| format!("Failed to build evaluator for '{}'", expr))?;

	for text in paths {
		let path = parse_path(text)?;
		let result = evaluator.match_path(&path);
		println!(
			"{}\t{}\t{}",
			path,
			result.matched,
			if result.constant { "constant" } else { "varying" }
		);
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_compose(texts: &[String]) -> Result<ExitCode> {
	let mut composed: Option<PathExpression> = None;
	for text in texts {
		let expr = parse_expression(text)?;
		composed = Some(match composed {
			Some(stronger) => stronger.compose_over(&expr),
			None => expr,
		});
	}

	println!("{}", composed.unwrap_or_default());
	Ok(ExitCode::SUCCESS)
}

fn handle_absolute(text: &str, anchor: &str) -> Result<ExitCode> {
	let expr = parse_expression(text)?;
	let anchor = parse_path(anchor)?;
	let absolute = expr
		.make_absolute(&anchor)
		.with_context(|| format!("Cannot anchor '{}' at {}", expr, anchor))?;

	println!("{}", absolute);
	Ok(ExitCode::SUCCESS)
}

fn handle_replace_prefix(text: &str, old: &str, new: &str) -> Result<ExitCode> {
	let expr = parse_expression(text)?;
	let old = parse_path(old)?;
	let new = parse_path(new)?;

	println!("{}", expr.replace_prefix(&old, &new));
	Ok(ExitCode::SUCCESS)
}

fn handle_config_show() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let configs = discover_configs(&cwd).context("Failed to discover config files")?;

	if configs.is_empty() {
		println!("No configuration files found.");
	} else {
		println!("Configuration files (in cascade order):\n");

		for loaded in &configs {
			println!("# Source: {}", loaded.path.display());
			println!("# root: {}", loaded.config.root);
			println!("# no-external-lookup: {}", loaded.config.no_external_lookup);
			if let Some(ref env_var) = loaded.config.root_config_lookup_disable_env_var {
				println!("# root-config-lookup-disable-env-var: {}", env_var);
			}
			println!("# references: {}", loaded.config.references.len());

			let expressions = loaded
				.config
				.expressions(&loaded.path)
				.with_context(|| format!("Invalid config {}", loaded.path.display()))?;
			for (name, expr) in &expressions {
				println!("  %:{} = {}", name, expr);
			}
			println!();
		}
	}

	if let Ok(user_path) = user_config_path() {
		println!("User config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	let checked = discover_configs(&cwd)
		.and_then(|configs| merge_configs(&configs).map(|_| configs));
	match checked {
		Ok(configs) => {
			if configs.is_empty() {
				println!("No configuration files found.");
			} else {
				println!("All configuration files are valid:");
				for loaded in &configs {
					println!(
						"  {} ({} references)",
						loaded.path.display(),
						loaded.config.references.len()
					);
				}
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {:?}", anyhow::Error::from(e));
			Ok(ExitCode::FAILURE)
		}
	}
}
