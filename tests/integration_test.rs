#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but replacement requires nightly

use predicates::prelude::*;
use std::fs;

fn pathexpr_cmd() -> assert_cmd::Command {
	assert_cmd::Command::cargo_bin("pathexpr").unwrap()
}

/// A temp dir whose config cuts off the cascade and the user config.
fn isolated_config_dir(references: &str) -> tempfile::TempDir {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(
		temp_dir.path().join(".pathexpr.toml"),
		format!("no-external-lookup = true\n\n[references]\n{}", references),
	)
	.unwrap();
	temp_dir
}

// ============================================================================
// CLI flag tests
// ============================================================================

#[test]
fn test_help_flag() {
	pathexpr_cmd()
		.arg("--help")
		.assert()
		.success()
		.stdout(predicate::str::contains("path expressions"));
}

#[test]
fn test_version_flag() {
	pathexpr_cmd()
		.arg("--version")
		.assert()
		.success()
		.stdout(predicate::str::contains("pathexpr"));
}

#[test]
fn test_no_args_shows_help() {
	pathexpr_cmd()
		.assert()
		.failure()
		.stderr(predicate::str::contains("Usage"));
}

// ============================================================================
// parse tests
// ============================================================================

#[test]
fn test_parse_prints_canonical_text() {
	pathexpr_cmd()
		.args(["parse", "  /a   (/b//)  - ~~/c"])
		.assert()
		.success()
		.stdout("/a /b// - /c\n");
}

#[test]
fn test_parse_explicit_union() {
	pathexpr_cmd()
		.args(["parse", "/a | /b + /c"])
		.assert()
		.success()
		.stdout("/a + /b + /c\n");
}

#[test]
fn test_parse_error_points_at_offset() {
	pathexpr_cmd()
		.args(["parse", "/a -"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("offset 4"))
		.stderr(predicate::str::contains("  /a -\n      ^"));
}

#[test]
fn test_parse_rejects_deep_nesting() {
	let nested = format!("{}/a{}", "(".repeat(1000), ")".repeat(1000));
	pathexpr_cmd()
		.args(["parse", &nested])
		.assert()
		.failure()
		.stderr(predicate::str::contains("expression nested too deeply"));
}

#[test]
fn test_parse_long_complement_run() {
	let negated = format!("{}/a", "~".repeat(20_001));
	pathexpr_cmd()
		.args(["parse", &negated])
		.assert()
		.success()
		.stdout("~/a\n");
}

// ============================================================================
// match tests
// ============================================================================

#[test]
fn test_match_reports_constancy() {
	pathexpr_cmd()
		.args([
			"match",
			"/World// - /World/cameras//",
			"/World",
			"/World/cameras/cam1",
			"/Other",
		])
		.assert()
		.success()
		.stdout(
			"/World\ttrue\tvarying\n/World/cameras/cam1\tfalse\tconstant\n/Other\tfalse\tconstant\n",
		);
}

#[test]
fn test_match_with_weaker() {
	pathexpr_cmd()
		.args(["match", "%_ - /a/b//", "/a/c", "/a/b/c", "--weaker", "/a//"])
		.assert()
		.success()
		.stdout("/a/c\ttrue\tconstant\n/a/b/c\tfalse\tconstant\n");
}

#[test]
fn test_match_resolves_config_references() {
	let temp_dir = isolated_config_dir("geom = \"/World/geom//\"\n");

	pathexpr_cmd()
		.args(["match", "%:geom", "/World/geom/mesh", "/World/lights"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout("/World/geom/mesh\ttrue\tconstant\n/World/lights\tfalse\tconstant\n");
}

#[test]
fn test_match_unknown_reference_is_nothing() {
	let temp_dir = isolated_config_dir("");

	pathexpr_cmd()
		.args(["match", "%:missing", "/a"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout("/a\tfalse\tconstant\n");
}

#[test]
fn test_match_unknown_predicate_fails() {
	pathexpr_cmd()
		.args(["match", "/a/{isMesh}", "/a/b"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("Unknown predicate function: isMesh"));
}

#[test]
fn test_match_invalid_path_fails() {
	pathexpr_cmd()
		.args(["match", "/a", "/a/"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("Invalid path '/a/'"));
}

// ============================================================================
// compose / rewrite tests
// ============================================================================

#[test]
fn test_compose_strongest_first() {
	pathexpr_cmd()
		.args(["compose", "/a %_", "/b %_", "/c"])
		.assert()
		.success()
		.stdout("/a /b /c\n");
}

#[test]
fn test_compose_keeps_unresolved_weaker() {
	pathexpr_cmd()
		.args(["compose", "%_ - /x", "/b %_"])
		.assert()
		.success()
		.stdout("(/b %_) - /x\n");
}

#[test]
fn test_absolute() {
	pathexpr_cmd()
		.args(["absolute", "foo// - ../bar", "--anchor", "/World/set"])
		.assert()
		.success()
		.stdout("/World/set/foo// - /World/bar\n");
}

#[test]
fn test_absolute_rejects_relative_anchor() {
	pathexpr_cmd()
		.args(["absolute", "foo", "--anchor", "World"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("Cannot anchor"));
}

#[test]
fn test_replace_prefix() {
	pathexpr_cmd()
		.args(["replace-prefix", "/a/b// %/a:x", "/a", "/c"])
		.assert()
		.success()
		.stdout("/c/b// %/c:x\n");
}

// ============================================================================
// config tests
// ============================================================================

#[test]
fn test_config_validate_valid() {
	let temp_dir = isolated_config_dir("geom = \"/World/geom//\"\n");

	pathexpr_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("All configuration files are valid"))
		.stdout(predicate::str::contains("(1 references)"));
}

#[test]
fn test_config_validate_invalid_reference() {
	let temp_dir = isolated_config_dir("broken = \"/a &\"\n");

	pathexpr_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stderr(predicate::str::contains("Configuration error"))
		.stderr(predicate::str::contains("reference 'broken'"));
}

#[test]
fn test_config_validate_invalid_toml() {
	let temp_dir = tempfile::tempdir().unwrap();
	fs::write(temp_dir.path().join(".pathexpr.toml"), "references = [").unwrap();

	pathexpr_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_config_validate_reference_cycle() {
	let temp_dir = isolated_config_dir("a = \"/x %:b\"\nb = \"/y %:a\"\n");

	pathexpr_cmd()
		.args(["config", "validate"])
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.stderr(predicate::str::contains("Reference cycle: %:a -> %:b -> %:a"));
}

#[test]
fn test_match_reference_cycle_fails() {
	let temp_dir = isolated_config_dir("a = \"/x %:b\"\nb = \"/y %:a\"\n");

	pathexpr_cmd()
		.args(["match", "%:a", "/x"])
		.current_dir(temp_dir.path())
		.assert()
		.failure()
		.code(1)
		.stderr(predicate::str::contains("Failed to load configuration"))
		.stderr(predicate::str::contains("Reference cycle"));
}

#[test]
fn test_config_show_lists_references() {
	let temp_dir = isolated_config_dir("geom = \"/World/geom//\"\nlights = \"//Light*  - %:geom\"\n");

	pathexpr_cmd()
		.args(["config", "show"])
		.current_dir(temp_dir.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("# no-external-lookup: true"))
		.stdout(predicate::str::contains("%:geom = /World/geom//"))
		.stdout(predicate::str::contains("%:lights = //Light* - %:geom"));
}

#[test]
fn test_nearest_config_wins() {
	let temp_dir = isolated_config_dir("geom = \"/Far//\"\n");
	let nested = temp_dir.path().join("shot");
	fs::create_dir(&nested).unwrap();
	fs::write(
		nested.join(".pathexpr.toml"),
		"[references]\ngeom = \"/Near//\"\n",
	)
	.unwrap();

	pathexpr_cmd()
		.args(["match", "%:geom", "/Near/x", "/Far/x"])
		.current_dir(&nested)
		.assert()
		.success()
		.stdout("/Near/x\ttrue\tconstant\n/Far/x\tfalse\tconstant\n");
}
