use crate::config::parser::parse_config_file;
use crate::config::types::{LoadedConfig, MergedConfig, ReferenceWithSource};
use crate::error::{PathExprError, Result};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".pathexpr.toml";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.pathexpr.toml`
/// 2. If found and `root = true`, skip to user config only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.pathexpr.toml (unless disabled)
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = Some(start_dir);

	while let Some(dir) = current_dir {
		let config_path = dir.join(CONFIG_FILE_NAME);

		if config_path.exists() {
			let config = parse_config_file(&config_path)?;
			log::debug!("loaded config {}", config_path.display());

			let isolated = config.no_external_lookup;
			let root = config.root;
			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if isolated {
				return Ok(configs);
			}
			if root {
				break;
			}
		}

		current_dir = dir.parent();
	}

	if let Some(user_config) = load_user_config(&configs)? {
		configs.push(user_config);
	}

	Ok(configs)
}

/// Load the user's ~/.pathexpr.toml if it exists and isn't disabled.
fn load_user_config(existing_configs: &[LoadedConfig]) -> Result<Option<LoadedConfig>> {
	for loaded in existing_configs {
		if let Some(ref env_var) = loaded.config.root_config_lookup_disable_env_var
			&& is_env_truthy(env_var)
		{
			log::debug!("user config disabled by ${}", env_var);
			return Ok(None);
		}
	}

	let path = user_config_path()?;
	if path.exists() {
		let config = parse_config_file(&path)?;
		log::debug!("loaded user config {}", path.display());
		Ok(Some(LoadedConfig { config, path }))
	} else {
		Ok(None)
	}
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var_name: &str) -> bool {
	std::env::var(var_name).is_ok_and(|value| is_truthy(&value))
}

fn is_truthy(value: &str) -> bool {
	let lower = value.to_lowercase();
	!value.is_empty() && lower != "0" && lower != "false" && lower != "no"
}

/// Merge multiple configs into a single effective config.
///
/// Configs come in cascade order, so the first definition of a name wins.
/// Fails if the merged definitions refer to each other in a cycle.
pub fn merge_configs(configs: &[LoadedConfig]) -> Result<MergedConfig> {
	let mut merged = MergedConfig::default();

	for loaded in configs {
		for (name, expression) in loaded.config.expressions(&loaded.path)? {
			if let Some(existing) = merged.references.get(&name) {
				log::debug!(
					"%:{} from {} is shadowed by {}",
					name,
					loaded.path.display(),
					existing.source.display()
				);
				continue;
			}
			merged.references.insert(
				name,
				ReferenceWithSource {
					expression,
					source: loaded.path.clone(),
				},
			);
		}
	}

	merged.check_cycles()?;
	Ok(merged)
}

/// Convenience function to discover, load, and merge configs from a directory.
pub fn load_merged_config(start_dir: &Path) -> Result<MergedConfig> {
	let configs = discover_configs(start_dir)?;
	merge_configs(&configs)
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(PathExprError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}
