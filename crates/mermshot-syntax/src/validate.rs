//! Detection of Mermaid patterns known to break the parser.

use std::sync::LazyLock;

use regex::Regex;

static MATH_IN_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*[-+*/][^)]*\)").unwrap());

static HYPHEN_PARENS_IN_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\([^)]*-[^)]*\).*?\]").unwrap());

static MALFORMED_ARROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-->\s*>").unwrap());

static ARROW_NO_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-->\S").unwrap());

static ARROW_WIDE_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-->\s{2,}").unwrap());

static UNQUOTED_SUBGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"subgraph\s+[^"\s]"#).unwrap());

/// Check Mermaid source for patterns known to cause parsing issues.
///
/// Each check contributes at most one issue, always in this order:
/// math in parentheses, hyphenated parentheses in node labels, malformed
/// arrows, inconsistent arrow spacing, unquoted subgraph labels.
#[must_use]
pub fn validate(source: &str) -> Vec<String> {
    let checks: [(bool, &str); 5] = [
        (
            MATH_IN_PARENS.is_match(source),
            "Mathematical expressions in parentheses may cause parsing issues",
        ),
        (
            HYPHEN_PARENS_IN_LABEL.is_match(source),
            "Parentheses with hyphens in node labels may cause parsing issues",
        ),
        (
            MALFORMED_ARROW.is_match(source),
            "Malformed arrow syntax detected",
        ),
        (
            ARROW_NO_SPACE.is_match(source) || ARROW_WIDE_SPACE.is_match(source),
            "Inconsistent spacing around arrows",
        ),
        (
            UNQUOTED_SUBGRAPH.is_match(source),
            "Subgraph labels should be quoted",
        ),
    ];

    checks
        .into_iter()
        .filter(|(found, _)| *found)
        .map(|(_, issue)| issue.to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detects_math_in_parentheses() {
        let issues = validate("graph TB\n    A --> B[Value (X-Y)]");

        assert!(
            issues.contains(&"Mathematical expressions in parentheses may cause parsing issues".to_owned())
        );
    }

    #[test]
    fn test_detects_hyphen_parentheses_in_labels() {
        let issues = validate("graph TB\n    A --> B[Shard (N-1)]");

        assert!(
            issues.contains(&"Parentheses with hyphens in node labels may cause parsing issues".to_owned())
        );
    }

    #[test]
    fn test_detects_malformed_arrow() {
        let issues = validate("graph TB\n    MS --> >API");

        assert!(issues.contains(&"Malformed arrow syntax detected".to_owned()));
    }

    #[test]
    fn test_detects_wide_arrow_spacing() {
        let issues = validate("graph TB\n    A-->  B");

        assert_eq!(issues, vec!["Inconsistent spacing around arrows".to_owned()]);
    }

    #[test]
    fn test_detects_missing_arrow_spacing() {
        let issues = validate("graph TB\n    A-->B");

        assert_eq!(issues, vec!["Inconsistent spacing around arrows".to_owned()]);
    }

    #[test]
    fn test_detects_unquoted_subgraph() {
        let issues = validate("graph TB\n    subgraph Backend\n    A --> B\n    end");

        assert_eq!(issues, vec!["Subgraph labels should be quoted".to_owned()]);
    }

    #[test]
    fn test_quoted_subgraph_is_clean() {
        let issues = validate("graph TB\n    subgraph \"Backend\"\n    A --> B\n    end");

        assert!(issues.is_empty());
    }

    #[test]
    fn test_valid_source_has_no_issues() {
        let issues = validate("graph TB\n    A --> B[Valid Node]");

        assert!(issues.is_empty());
    }

    #[test]
    fn test_issues_follow_fixed_order() {
        let source = "graph TB\n    subgraph Core\n    A --> >B[Shard (N-1)]\n    end";

        let issues = validate(source);

        assert_eq!(
            issues,
            vec![
                "Mathematical expressions in parentheses may cause parsing issues".to_owned(),
                "Parentheses with hyphens in node labels may cause parsing issues".to_owned(),
                "Malformed arrow syntax detected".to_owned(),
                "Subgraph labels should be quoted".to_owned(),
            ]
        );
    }

    #[test]
    fn test_one_issue_per_pattern() {
        let issues = validate("graph TB\n    A-->B\n    C-->D\n    E-->  F");

        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_validate_is_deterministic() {
        let source = "graph TB\n    A-->B[Value (X+Y)]";

        assert_eq!(validate(source), validate(source));
    }
}
