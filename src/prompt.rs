use crate::github::ChangedFile;

/// Marker replaced by the rendered changed-file list.
pub const FILE_LIST_PLACEHOLDER: &str = "{{file_list}}";
/// Marker replaced by the raw unified diff.
pub const DIFF_PLACEHOLDER: &str = "{{diff}}";

/// System instruction used when no override is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a seasoned GitHub PR review assistant.

Task: From the given git diff, output markdown with exactly the four numbered sections:
1. Summary of key changes
2. Changed code flow
3. Risk and review points
4. Review guide

Rules
- Keep headings and order exactly as above.
- Use concise bullets; sub-items with \"-\" or \"1-1\".
- No file-by-file detail.";

/// Render the changed-file list as one "- filename" line per file,
/// preserving page-retrieval order.
pub fn render_file_list(files: &[ChangedFile]) -> String {
    files
        .iter()
        .map(|f| format!("- {}", f.filename))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user prompt from an optional template, the rendered file list
/// and the raw diff.
///
/// A template containing either placeholder gets both substituted, first
/// occurrence only; further occurrences are left as literal text. Without a
/// template (or with one that names no placeholder) the default envelope is
/// used: a changed-files block followed by a fenced diff block, prefixed by
/// the raw template text when one was given.
pub fn assemble(template: Option<&str>, file_list: &str, diff: &str) -> String {
    let template = template.map(str::trim).unwrap_or("");

    if template.contains(FILE_LIST_PLACEHOLDER) || template.contains(DIFF_PLACEHOLDER) {
        return template
            .replacen(FILE_LIST_PLACEHOLDER, file_list, 1)
            .replacen(DIFF_PLACEHOLDER, diff, 1);
    }

    let blocks = format!("### Changed files\n{file_list}\n### Diff\n```diff\n{diff}\n```");
    if template.is_empty() {
        blocks
    } else {
        format!("{template}\n\n{blocks}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<ChangedFile> {
        names
            .iter()
            .map(|n| ChangedFile {
                filename: n.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_render_file_list() {
        let rendered = render_file_list(&files(&["a.go", "b.go"]));
        assert_eq!(rendered, "- a.go\n- b.go");
    }

    #[test]
    fn test_render_empty_file_list() {
        assert_eq!(render_file_list(&[]), "");
    }

    #[test]
    fn test_template_substitution() {
        let prompt = assemble(
            Some("Files:\n{{file_list}}\n\nChanges:\n{{diff}}"),
            "- a.go",
            "@@ -1 +1 @@",
        );
        assert_eq!(prompt, "Files:\n- a.go\n\nChanges:\n@@ -1 +1 @@");
    }

    #[test]
    fn test_substitution_is_first_occurrence_only() {
        let prompt = assemble(Some("{{diff}} and again {{diff}}"), "", "CHANGES");
        assert_eq!(prompt, "CHANGES and again {{diff}}");
    }

    #[test]
    fn test_single_placeholder_is_enough() {
        let prompt = assemble(Some("Just the diff: {{diff}}"), "- ignored.rs", "DIFF");
        assert_eq!(prompt, "Just the diff: DIFF");
    }

    #[test]
    fn test_default_envelope_without_template() {
        let prompt = assemble(None, "- a.go\n- b.go", "--- a/a.go\n+++ b/a.go");
        let files_at = prompt.find("### Changed files").unwrap();
        let diff_at = prompt.find("### Diff").unwrap();
        assert!(files_at < diff_at);
        assert!(prompt.contains("- a.go\n- b.go"));
        assert!(prompt.contains("```diff\n--- a/a.go\n+++ b/a.go\n```"));
    }

    #[test]
    fn test_template_without_placeholders_becomes_prefix() {
        let prompt = assemble(Some("Focus on error handling."), "- a.go", "DIFF");
        assert!(prompt.starts_with("Focus on error handling.\n\n### Changed files"));
        assert!(prompt.contains("```diff\nDIFF\n```"));
    }

    #[test]
    fn test_blank_template_treated_as_absent() {
        let prompt = assemble(Some("   \n"), "- a.go", "DIFF");
        assert!(prompt.starts_with("### Changed files"));
    }
}
