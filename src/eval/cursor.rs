use crate::eval::MatchResult;
use crate::eval::matcher::PatternState;
use crate::path::ScenePath;

/// Evaluation state for one path, used to resume matching at its children.
///
/// Cursors are plain values owned by the caller. Resuming never modifies the
/// parent cursor, so every sibling can resume from the same one.
#[derive(Debug, Clone)]
pub struct SearchCursor {
	pub(crate) path: ScenePath,
	pub(crate) states: Vec<PatternState>,
	pub(crate) result: MatchResult,
}

impl SearchCursor {
	/// The path this cursor was produced for.
	pub fn path(&self) -> &ScenePath {
		&self.path
	}

	/// The result for [`SearchCursor::path`].
	pub fn result(&self) -> MatchResult {
		self.result
	}

	/// Whether every descendant shares this cursor's result.
	pub fn is_constant(&self) -> bool {
		self.result.constant
	}
}
