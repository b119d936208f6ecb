//! Path expressions: set algebra over hierarchical paths.
//!
//! A [`PathExpression`] combines [`PathPattern`]s and references to other
//! expressions with complement, union, intersection and difference. An
//! [`Evaluator`] decides membership for a [`ScenePath`], and reports when the
//! answer holds for every descendant too, so tree traversals can prune.
//!
//! This library provides:
//! - Parsing and canonical text generation for expressions and patterns
//! - Reference resolution and `%_` composition
//! - Incremental, pruning-aware evaluation with caller-owned cursors
//! - Named reference definitions loaded from `.pathexpr.toml` cascades
//!
//! # Example
//!
//! ```
//! use pathexpr::{Evaluator, PathExpression, ScenePath};
//!
//! let expr = PathExpression::parse("/World// - /World/cameras//").unwrap();
//! let evaluator = Evaluator::build(&expr).unwrap();
//!
//! let root = ScenePath::parse("/World").unwrap();
//! let (result, cursor) = evaluator.start(&root);
//! assert!(result.matched);
//!
//! let cameras = root.append_child("cameras").unwrap();
//! let (result, _) = evaluator.resume(&cursor, &cameras);
//! assert!(!result.matched);
//! assert!(result.constant);
//! ```

pub mod config;
pub mod error;
pub mod eval;
pub mod expression;
pub mod path;
pub mod pattern;
pub mod predicate;

pub use error::{PathExprError, Result};
pub use eval::{Evaluator, MatchResult, SearchCursor};
pub use expression::{ExpressionReference, PathExpression};
pub use path::ScenePath;
pub use pattern::PathPattern;
pub use predicate::PredicateLibrary;
