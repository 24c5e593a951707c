//! Prompt formatting of selected context for review generation.

use std::fmt::Write;

use crate::selector::ContextSelection;

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap text in a CDATA section, splitting any `]]>` it contains.
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

/// Render a selection as `<related_code>` blocks, one per reviewed file.
///
/// Match content is wrapped in CDATA, so code containing the block delimiters
/// cannot close them. Returns an empty string when no file has matches.
#[must_use]
pub fn format_as_context(selection: &ContextSelection) -> String {
    if selection.matches.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    for (reviewed, matches) in &selection.matches {
        let _ = writeln!(out, "<related_code for=\"{}\">", escape_attr(reviewed));
        for m in matches {
            let _ = write!(out, "  <match file=\"{}\"", escape_attr(&m.filepath));
            if let Some((from, to)) = m.line_range {
                let _ = write!(out, " lines=\"{from}-{to}\"");
            }
            let _ = writeln!(out, " score=\"{:.2}\">", m.score);
            out.push_str(&cdata(&m.content));
            out.push('\n');
            out.push_str("  </match>\n");
        }
        out.push_str("</related_code>\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchResult;

    fn hit(filepath: &str, score: f32, line_range: Option<(usize, usize)>) -> MatchResult {
        MatchResult {
            id: format!("{filepath}-0"),
            content: "function add(a, b): number { return a + b; }".to_string(),
            filepath: filepath.to_string(),
            repo: "acme/web".to_string(),
            score,
            line_range,
        }
    }

    #[test]
    fn empty_selection_is_empty_string() {
        assert_eq!(format_as_context(&ContextSelection::default()), "");
    }

    #[test]
    fn renders_blocks_per_reviewed_file() {
        let mut selection = ContextSelection::default();
        selection
            .matches
            .insert("src/a.ts".into(), vec![hit("src/b.ts", 0.934, Some((1, 12)))]);
        selection
            .matches
            .insert("src/c.ts".into(), vec![hit("src/d.ts", 0.85, None)]);

        let xml = format_as_context(&selection);
        assert!(xml.contains("<related_code for=\"src/a.ts\">"));
        assert!(xml.contains("<match file=\"src/b.ts\" lines=\"1-12\" score=\"0.93\">"));
        assert!(xml.contains("<match file=\"src/d.ts\" score=\"0.85\">"));
        assert!(xml.contains("function add(a, b)"));
        assert_eq!(xml.matches("</related_code>").count(), 2);
        assert!(xml.find("src/a.ts").unwrap() < xml.find("src/c.ts").unwrap());
    }

    #[test]
    fn attributes_are_escaped() {
        let mut selection = ContextSelection::default();
        selection
            .matches
            .insert("a\"<b>.ts".into(), vec![hit("x&y.ts", 0.9, None)]);
        let xml = format_as_context(&selection);
        assert!(xml.contains("for=\"a&quot;&lt;b&gt;.ts\""));
        assert!(xml.contains("file=\"x&amp;y.ts\""));
    }

    #[test]
    fn failures_alone_render_nothing() {
        let mut selection = ContextSelection::default();
        selection.failed.push(crate::selector::FailedFile {
            path: "a.ts".into(),
            error: "boom".into(),
        });
        assert_eq!(format_as_context(&selection), "");
    }

    #[test]
    fn content_cannot_close_blocks() {
        let mut selection = ContextSelection::default();
        let mut m = hit("src/tpl.ts", 0.9, None);
        m.content = "const t = \"</match></related_code>\"; // a[b[0]]>1".to_string();
        selection.matches.insert("src/a.ts".into(), vec![m]);

        let xml = format_as_context(&selection);
        assert_eq!(xml.matches("\n  </match>\n").count(), 1);
        assert!(xml.contains("<![CDATA[const t = \"</match></related_code>\";"));
        assert!(xml.contains("a[b[0]]]]><![CDATA[>1]]>"));
        assert!(xml.trim_end().ends_with("  </match>\n</related_code>"));
    }
}
