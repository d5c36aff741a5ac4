//! Heuristic syntax checks and repairs for Mermaid diagram source.
//!
//! Mermaid's flowchart parser rejects a handful of patterns that show up often
//! in hand-written diagrams (parenthesized ranges inside node labels, stray
//! `>` after arrows, and so on). This crate detects and rewrites those
//! patterns before the diagram reaches the renderer.
//!
//! Both entry points are pure string functions:
//! - [`validate`] reports known-bad patterns without changing anything
//! - [`fix`] rewrites the source and lists the rules that changed it
//!
//! The checks are pattern heuristics, not a grammar. An empty issue list means
//! no known-bad pattern was found, not that the diagram is valid.
//!
//! # Example
//!
//! ```
//! let source = "graph TB\n    MS --> >API";
//!
//! let issues = mermshot_syntax::validate(source);
//! assert_eq!(issues, vec!["Malformed arrow syntax detected".to_owned()]);
//!
//! let result = mermshot_syntax::fix(source);
//! assert!(result.fixed.contains("MS --> API"));
//! assert!(result.is_changed());
//! ```

mod fix;
mod validate;

pub use fix::{FixResult, fix};
pub use validate::validate;
