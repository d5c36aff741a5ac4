//! Conservative rewrites for known Mermaid parser failures.
//!
//! Rules run in a fixed order and each one sees the output of the previous
//! rule, so a later rule can match text shaped by an earlier one (the
//! parentheses rule exposes hyphen chains to the range rule, for instance).

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `[Label<br/>Text (X-Y)More]` -> `[Label<br/>Text X-YMore]`
static BR_LABEL_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\[.*?<br/>.*?)\(([^)]+)\)([^\]]*\])").unwrap());

/// `[Value (X+Y)]` -> `[Value X+Y]`
static MATH_EXPR_PARENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\[.*?)\(([A-Za-z0-9]+[-+*/][A-Za-z0-9]+)\)(.*?\])").unwrap()
});

/// `[Videos 1B-2B-3B]` -> `[Videos 1B to 2B to 3B]`
static HYPHEN_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\[.*?)(?-u:\b)([A-Za-z0-9]+)-([A-Za-z0-9]+)-([A-Za-z0-9]+)(?-u:\b)(.*?\])",
    )
    .unwrap()
});

static MALFORMED_ARROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-->\s*>").unwrap());

static ARROW_SPACING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*-->\s*").unwrap());

static QUOTED_SUBGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"subgraph\s+"([^"]*)"(\s*\n)"#).unwrap());

const ARROW: &str = " --> ";

/// Result of [`fix`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixResult {
    /// Rewritten diagram source.
    pub fixed: String,
    /// Human-readable description of each rule that changed the source, in
    /// the order the rules ran.
    pub changes: Vec<String>,
}

impl FixResult {
    /// Whether any rule changed the source.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Rewrite Mermaid source to avoid known parser failures.
///
/// Applied rules, in order:
/// 1. strip parentheses inside `<br/>` node labels
/// 2. strip parentheses around `token op token` expressions in labels
/// 3. rewrite `A-B-C` chains in labels to `A to B to C` when the label
///    mentions "video" or a token contains a digit
/// 4. collapse `--> >` into a single arrow
/// 5. normalize spacing around every arrow
/// 6. normalize `subgraph "label"` spacing
///
/// Rules 5 and 6 only report a change when they actually altered the text,
/// so clean input comes back with no changes.
#[must_use]
pub fn fix(source: &str) -> FixResult {
    let mut fixed = source.to_owned();
    let mut changes = Vec::new();

    let count = BR_LABEL_PARENS.find_iter(&fixed).count();
    if count > 0 {
        fixed = BR_LABEL_PARENS.replace_all(&fixed, "$1$2$3").into_owned();
        changes.push(format!(
            "Removed {count} problematic parentheses in node labels"
        ));
    }

    let count = MATH_EXPR_PARENS.find_iter(&fixed).count();
    if count > 0 {
        fixed = MATH_EXPR_PARENS.replace_all(&fixed, "$1$2$3").into_owned();
        changes.push(format!(
            "Fixed {count} mathematical expressions in node labels"
        ));
    }

    if HYPHEN_RANGE.is_match(&fixed) {
        fixed = HYPHEN_RANGE
            .replace_all(&fixed, |caps: &Captures<'_>| {
                rewrite_range(caps, &mut changes)
            })
            .into_owned();
    }

    if MALFORMED_ARROW.is_match(&fixed) {
        fixed = MALFORMED_ARROW.replace_all(&fixed, ARROW).into_owned();
        changes.push("Fixed malformed arrow syntax".to_owned());
    }

    let normalized = ARROW_SPACING.replace_all(&fixed, ARROW);
    if normalized != fixed {
        fixed = normalized.into_owned();
        changes.push("Normalized arrow spacing".to_owned());
    }

    let normalized = QUOTED_SUBGRAPH.replace_all(&fixed, "subgraph \"$1\"$2");
    if normalized != fixed {
        fixed = normalized.into_owned();
        changes.push("Fixed subgraph quote formatting".to_owned());
    }

    FixResult { fixed, changes }
}

/// Replacement for a single hyphen-chain match.
///
/// Compound identifiers such as `[user-auth-service]` are left alone; only
/// chains that look like ranges (video context or numeric tokens) change.
fn rewrite_range(caps: &Captures<'_>, changes: &mut Vec<String>) -> String {
    let whole = &caps[0];
    let (prefix, start, middle, end, suffix) = (&caps[1], &caps[2], &caps[3], &caps[4], &caps[5]);

    let numeric = [start, middle, end]
        .iter()
        .any(|token| token.chars().any(|c| c.is_ascii_digit()));
    if !whole.to_lowercase().contains("video") && !numeric {
        return whole.to_owned();
    }

    changes.push(format!(
        "Converted range notation: {start}-{middle}-{end} -> {start} to {middle} to {end}"
    ));
    format!("{prefix}{start} to {middle} to {end}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fix_parentheses_in_br_labels() {
        let input = "graph TB\n        QSN --> SN[Shard N<br/>Videos (N-1)B-NB]";

        let result = fix(input);

        assert!(result.fixed.contains("Videos N to 1B to NB"));
        assert!(
            result
                .changes
                .iter()
                .any(|change| change.contains("problematic parentheses"))
        );
    }

    #[test]
    fn test_fix_reports_parentheses_count() {
        let input = "graph TB\n    A[One<br/>(a)]\n    B[Two<br/>(b)]";

        let result = fix(input);

        assert_eq!(result.fixed, "graph TB\n    A[One<br/>a]\n    B[Two<br/>b]");
        assert_eq!(
            result.changes,
            vec!["Removed 2 problematic parentheses in node labels".to_owned()]
        );
    }

    #[test]
    fn test_fix_math_in_br_label() {
        let input = "graph TB\n        A --> B[Result<br/>Value (X+Y)]";

        let result = fix(input);

        assert!(result.fixed.contains("Value X+Y"));
        assert!(result.changes.iter().any(|change| {
            change.contains("mathematical expressions") || change.contains("problematic parentheses")
        }));
    }

    #[test]
    fn test_fix_math_expression_in_label() {
        let input = "graph TB\n    A --> B[Total (X*Y) items]";

        let result = fix(input);

        assert_eq!(result.fixed, "graph TB\n    A --> B[Total X*Y items]");
        assert_eq!(
            result.changes,
            vec!["Fixed 1 mathematical expressions in node labels".to_owned()]
        );
    }

    #[test]
    fn test_fix_malformed_arrows() {
        let input = "graph TB\n        MS --> >API\n        DB --> > Cache";

        let result = fix(input);

        assert!(result.fixed.contains("MS --> API"));
        assert!(result.fixed.contains("DB --> Cache"));
        assert!(
            result
                .changes
                .contains(&"Fixed malformed arrow syntax".to_owned())
        );
    }

    #[test]
    fn test_fix_normalizes_arrow_spacing() {
        let input = "graph TB\n        A-->B\n        C  -->  D";

        let result = fix(input);

        assert!(result.fixed.contains("A --> B"));
        assert!(result.fixed.contains("C --> D"));
        assert_eq!(result.changes, vec!["Normalized arrow spacing".to_owned()]);
    }

    #[test]
    fn test_fix_range_in_video_context() {
        let input = "graph TB\n        QS --> S[Shard 1<br/>Videos 1B-2B-3B]";

        let result = fix(input);

        assert!(result.fixed.contains("Videos 1B to 2B to 3B"));
        assert_eq!(
            result.changes,
            vec!["Converted range notation: 1B-2B-3B -> 1B to 2B to 3B".to_owned()]
        );
    }

    #[test]
    fn test_fix_leaves_compound_identifiers() {
        let input = "graph TB\n    A --> B[user-auth-service]";

        let result = fix(input);

        assert_eq!(result.fixed, input);
        assert!(result.changes.is_empty());
    }

    #[test]
    fn test_fix_range_after_non_ascii_letter() {
        let input = "graph TB\n    A --> B[é1-2-3]";

        let result = fix(input);

        assert_eq!(result.fixed, "graph TB\n    A --> B[é1 to 2 to 3]");
        assert_eq!(
            result.changes,
            vec!["Converted range notation: 1-2-3 -> 1 to 2 to 3".to_owned()]
        );
    }

    #[test]
    fn test_fix_quoted_subgraph_spacing() {
        let input = "graph TB\n    subgraph   \"Backend\"\n    A --> B\n    end";

        let result = fix(input);

        assert!(result.fixed.contains("subgraph \"Backend\"\n"));
        assert_eq!(
            result.changes,
            vec!["Fixed subgraph quote formatting".to_owned()]
        );
    }

    #[test]
    fn test_fix_clean_source_unchanged() {
        let input = "graph TB\n        A --> B[Simple Node]";

        let result = fix(input);

        assert_eq!(result.fixed, input);
        assert!(result.changes.is_empty());
        assert!(!result.is_changed());
    }

    #[test]
    fn test_fix_is_idempotent_on_own_output() {
        let input = "graph TB\n    QSN-->SN[Shard N<br/>Videos (N-1)B-NB]\n    MS --> >API";

        let first = fix(input);
        let second = fix(&first.fixed);

        assert!(first.is_changed());
        assert_eq!(second.fixed, first.fixed);
        assert!(second.changes.is_empty());
    }
}
