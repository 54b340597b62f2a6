//! Human-readable line diffs of JSON documents

use crate::error::{Error, Result};
use serde_json::Value;
use similar::{Algorithm, DiffOp, capture_diff_slices};

/// Unchanged runs at least this long are shortened
pub const CONTEXT_ELISION: usize = 6;

/// Lines kept at each end of a shortened run
const CONTEXT_KEEP: usize = 2;

/// Render a line diff between the pretty-printed forms of two documents
pub fn render(old: &Value, new: &Value) -> Result<String> {
    Ok(render_lines(&pretty(old)?, &pretty(new)?))
}

/// Render a line diff between two texts.
///
/// Removed lines are prefixed with `-`, added lines with `+` and context
/// lines with a space. Long context runs keep their first and last two lines
/// around a `...` marker.
pub fn render_lines(old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();

    let mut out = Vec::new();
    for op in capture_diff_slices(Algorithm::Myers, &old_lines, &new_lines) {
        match op {
            DiffOp::Equal { old_index, len, .. } => {
                push_context(&mut out, &old_lines[old_index..old_index + len]);
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => push_prefixed(&mut out, '-', &old_lines[old_index..old_index + old_len]),
            DiffOp::Insert {
                new_index, new_len, ..
            } => push_prefixed(&mut out, '+', &new_lines[new_index..new_index + new_len]),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                push_prefixed(&mut out, '-', &old_lines[old_index..old_index + old_len]);
                push_prefixed(&mut out, '+', &new_lines[new_index..new_index + new_len]);
            }
        }
    }
    out.join("\n")
}

fn pretty(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Serialize {
        what: "object for diff".to_string(),
        message: e.to_string(),
    })
}

fn push_prefixed(out: &mut Vec<String>, prefix: char, lines: &[&str]) {
    out.extend(lines.iter().map(|line| format!("{prefix}{line}")));
}

fn push_context(out: &mut Vec<String>, lines: &[&str]) {
    if lines.len() < CONTEXT_ELISION {
        push_prefixed(out, ' ', lines);
        return;
    }
    push_prefixed(out, ' ', &lines[..CONTEXT_KEEP]);
    out.push("...".to_string());
    push_prefixed(out, ' ', &lines[lines.len() - CONTEXT_KEEP..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_changed_scalar() {
        let diff = render(&json!({"spec": {"size": 1}}), &json!({"spec": {"size": 3}})).unwrap();
        let lines: Vec<&str> = diff.lines().collect();

        assert_eq!(
            lines,
            vec![
                " {",
                "   \"spec\": {",
                "-    \"size\": 1",
                "+    \"size\": 3",
                "   }",
                " }",
            ]
        );
    }

    #[test]
    fn test_long_context_is_elided() {
        let old = "l1\nl2\nl3\nl4\nl5\nl6\nl7\nold";
        let new = "l1\nl2\nl3\nl4\nl5\nl6\nl7\nnew";

        assert_eq!(
            render_lines(old, new),
            " l1\n l2\n...\n l6\n l7\n-old\n+new"
        );
    }

    #[test]
    fn test_short_context_is_kept() {
        let old = "a\nb\nc\nd\ne\nx";
        let new = "a\nb\nc\nd\ne\ny";

        assert_eq!(render_lines(old, new), " a\n b\n c\n d\n e\n-x\n+y");
    }

    #[test]
    fn test_added_key() {
        let diff = render(&json!({"a": 1}), &json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(
            diff,
            " {\n-  \"a\": 1\n+  \"a\": 1,\n+  \"b\": 2\n }"
        );
    }

    #[test]
    fn test_identical_documents_have_no_markers() {
        let doc = json!({"a": [1, 2], "b": {"c": true}});
        let diff = render(&doc, &doc).unwrap();
        assert!(!diff.lines().any(|l| l.starts_with('+') || l.starts_with('-')));
    }
}
