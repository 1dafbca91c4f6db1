//! Single-pass structural scan of a note body.
//!
//! Extracts headings, links (markdown, autolinks and [[cross-references]]),
//! fenced code blocks and checklist items. Nothing inside a fence is indexed
//! except the block itself.

use notecurator_types::{ChecklistItem, CodeBlock, Header, Link, LinkKind};
use regex::Regex;
use std::sync::LazyLock;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.*?)(?:[ \t]+#+)?[ \t]*$").unwrap());
static CHECKLIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+\[([ xX])\]\s+(.*?)\s*$").unwrap()
});
static ASSIGNEE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@?([A-Za-z][\w.\-]*(?: [A-Za-z][\w.\-]*)?):\s+(.+)$").unwrap()
});
static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\]]*)\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#).unwrap()
});
static AUTOLINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(https?://[^>\s]+)>").unwrap());
static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[\[([^\]\|]+)(?:\|([^\]]+))?\]\]").unwrap());
static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]*`").unwrap());

/// Leading words that look like `Name:` but are task markers, not people
const NON_ASSIGNEES: &[&str] = &["todo", "note", "fixme", "done", "wip", "update", "idea", "question"];

/// Structural facts about a note body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralIndex {
    pub headers: Vec<Header>,
    pub links: Vec<Link>,
    pub code_blocks: Vec<CodeBlock>,
    pub checklist: Vec<ChecklistItem>,
}

struct OpenFence {
    marker: char,
    len: usize,
    language: Option<String>,
    line: usize,
    content: Vec<String>,
}

/// Scan `body`, numbering lines from `first_line` (1-based file line of the body's first line).
pub fn scan_body(body: &str, first_line: usize) -> StructuralIndex {
    let mut index = StructuralIndex::default();
    let mut fence: Option<OpenFence> = None;

    for (i, line) in body.lines().enumerate() {
        let line_no = first_line + i;

        if let Some(open) = fence.as_mut() {
            if closes_fence(line, open.marker, open.len) {
                if let Some(done) = fence.take() {
                    index.code_blocks.push(CodeBlock {
                        language: done.language,
                        content: done.content.join("\n"),
                        line: done.line,
                    });
                }
            } else {
                open.content.push(line.to_string());
            }
            continue;
        }

        if let Some((marker, len, info)) = opens_fence(line) {
            fence = Some(OpenFence {
                marker,
                len,
                language: info,
                line: line_no,
                content: Vec::new(),
            });
            continue;
        }

        if let Some(cap) = HEADING_RE.captures(line) {
            let text = cap[2].trim().to_string();
            if !text.is_empty() {
                index.headers.push(Header {
                    level: cap[1].len() as u8,
                    text,
                    line: line_no,
                });
            }
        }

        if let Some(cap) = CHECKLIST_RE.captures(line) {
            let completed = &cap[1] != " ";
            let (assignee, text) = split_assignee(&cap[2]);
            index.checklist.push(ChecklistItem {
                text,
                completed,
                assignee,
                line: line_no,
            });
        }

        scan_links(line, line_no, &mut index.links);
    }

    // Unterminated fence runs to the end of the body
    if let Some(open) = fence {
        index.code_blocks.push(CodeBlock {
            language: open.language,
            content: open.content.join("\n"),
            line: open.line,
        });
    }

    index
}

fn opens_fence(line: &str) -> Option<(char, usize, Option<String>)> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let marker = trimmed.chars().next()?;
    if marker != '`' && marker != '~' {
        return None;
    }
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    let info = trimmed[len..].trim();
    if marker == '`' && info.contains('`') {
        return None;
    }
    let language = info
        .split_whitespace()
        .next()
        .map(|s| s.trim_start_matches('{').trim_end_matches('}').to_lowercase())
        .filter(|s| !s.is_empty());
    Some((marker, len, language))
}

fn closes_fence(line: &str, marker: char, len: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= len && trimmed.chars().all(|c| c == marker)
}

/// Split a leading `Name:` prefix off a checklist item.
fn split_assignee(text: &str) -> (Option<String>, String) {
    if let Some(cap) = ASSIGNEE_RE.captures(text) {
        let name = cap[1].to_string();
        if !NON_ASSIGNEES.contains(&name.to_lowercase().as_str()) {
            return (Some(name), cap[2].trim().to_string());
        }
    }
    (None, text.to_string())
}

fn scan_links(line: &str, line_no: usize, links: &mut Vec<Link>) {
    // Blank out inline code so `[[examples]]` in backticks are not indexed
    let line = INLINE_CODE_RE.replace_all(line, |caps: &regex::Captures| " ".repeat(caps[0].len()));

    for cap in WIKILINK_RE.captures_iter(&line) {
        let target = cap[1].trim().to_string();
        if target.is_empty() {
            continue;
        }
        links.push(Link {
            kind: LinkKind::Internal,
            target,
            display: cap.get(2).map(|m| m.as_str().trim().to_string()),
            line: line_no,
        });
    }

    for cap in MD_LINK_RE.captures_iter(&line) {
        if &cap[1] == "!" {
            continue;
        }
        let target = cap[3].to_string();
        let kind = match classify_target(&target) {
            Some(kind) => kind,
            None => continue,
        };
        let display = cap[2].trim();
        links.push(Link {
            kind,
            target,
            display: if display.is_empty() { None } else { Some(display.to_string()) },
            line: line_no,
        });
    }

    for cap in AUTOLINK_RE.captures_iter(&line) {
        links.push(Link {
            kind: LinkKind::External,
            target: cap[1].to_string(),
            display: None,
            line: line_no,
        });
    }
}

/// External for http(s), internal for relative paths, None for anchors and other schemes.
fn classify_target(target: &str) -> Option<LinkKind> {
    let lower = target.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(LinkKind::External)
    } else if target.starts_with('#')
        || lower.contains("://")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
    {
        None
    } else {
        Some(LinkKind::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "# Weekly Sync\n\
\n\
## Agenda\n\
- [ ] Alice: prepare the budget\n\
- [x] Ship release notes\n\
- [ ] TODO: book a room\n\
\n\
See [[Project Plan|the plan]] and [docs](https://example.com/docs).\n\
Also <https://example.org> and ![img](pic.png) and [local](notes/other.md).\n\
\n\
```rust\n\
// [[not a link]]\n\
fn main() {}\n\
```\n\
\n\
### Notes ###\n";

    #[test]
    fn test_headers_with_levels_and_lines() {
        let index = scan_body(BODY, 5);
        let headers: Vec<(u8, &str, usize)> = index
            .headers
            .iter()
            .map(|h| (h.level, h.text.as_str(), h.line))
            .collect();
        assert_eq!(
            headers,
            vec![(1, "Weekly Sync", 5), (2, "Agenda", 7), (3, "Notes", 20)]
        );
    }

    #[test]
    fn test_checklist_and_assignees() {
        let index = scan_body(BODY, 1);
        assert_eq!(index.checklist.len(), 3);
        assert_eq!(index.checklist[0].assignee.as_deref(), Some("Alice"));
        assert_eq!(index.checklist[0].text, "prepare the budget");
        assert!(!index.checklist[0].completed);
        assert!(index.checklist[1].completed);
        assert_eq!(index.checklist[1].assignee, None);
        assert_eq!(index.checklist[2].assignee, None);
        assert_eq!(index.checklist[2].text, "TODO: book a room");
    }

    #[test]
    fn test_links() {
        let index = scan_body(BODY, 1);
        let summary: Vec<(LinkKind, &str)> = index
            .links
            .iter()
            .map(|l| (l.kind, l.target.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (LinkKind::Internal, "Project Plan"),
                (LinkKind::External, "https://example.com/docs"),
                (LinkKind::Internal, "notes/other.md"),
                (LinkKind::External, "https://example.org"),
            ]
        );
        assert_eq!(index.links[0].display.as_deref(), Some("the plan"));
        assert_eq!(index.links[1].display.as_deref(), Some("docs"));
    }

    #[test]
    fn test_code_blocks() {
        let index = scan_body(BODY, 1);
        assert_eq!(index.code_blocks.len(), 1);
        let block = &index.code_blocks[0];
        assert_eq!(block.language.as_deref(), Some("rust"));
        assert_eq!(block.line, 11);
        assert!(block.content.contains("fn main"));
    }

    #[test]
    fn test_unterminated_fence_and_tilde() {
        let index = scan_body("~~~\nplain\n~~~\n```python\nprint(1)\n", 1);
        assert_eq!(index.code_blocks.len(), 2);
        assert_eq!(index.code_blocks[0].language, None);
        assert_eq!(index.code_blocks[1].language.as_deref(), Some("python"));
        assert_eq!(index.code_blocks[1].content, "print(1)");
    }

    #[test]
    fn test_inline_code_not_linked() {
        let index = scan_body("Use `[[wikilinks]]` like [[Real]].", 1);
        assert_eq!(index.links.len(), 1);
        assert_eq!(index.links[0].target, "Real");
    }

    #[test]
    fn test_anchor_and_mailto_skipped() {
        let index = scan_body("[top](#top) [mail](mailto:a@b.c)", 1);
        assert!(index.links.is_empty());
    }
}
