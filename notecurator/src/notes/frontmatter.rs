//! Split, parse and render the YAML metadata block at the top of a note.
//!
//! The block opens with a `---` line on the very first line and closes with a
//! `---` (or `...`) line. Anything that fails to parse as a YAML mapping is
//! reported as malformed and yields empty metadata.

use notecurator_types::{Metadata, MetadataValue};
use serde_yaml::Value as YamlValue;

/// Result of splitting raw note text into metadata block and body
#[derive(Debug, Clone, PartialEq)]
pub struct FrontmatterSplit {
    /// Raw YAML between the delimiters, if a complete block was found
    pub yaml: Option<String>,
    pub body: String,
    /// 1-based file line on which the body starts
    pub body_start_line: usize,
    /// Set when the text opens a block that never closes
    pub unterminated: bool,
}

/// Split content into (metadata yaml, body).
pub fn split_frontmatter(content: &str) -> FrontmatterSplit {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let opens = lines
        .next()
        .map(|first| first.trim_end() == "---")
        .unwrap_or(false);
    if !opens {
        return FrontmatterSplit {
            yaml: None,
            body: content.to_string(),
            body_start_line: 1,
            unterminated: false,
        };
    }

    let mut offset = content.split_inclusive('\n').next().map(str::len).unwrap_or(0);
    let yaml_start = offset;
    let mut line_no = 1;
    for line in lines {
        line_no += 1;
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = content[yaml_start..offset].to_string();
            let body = content[offset + line.len()..].to_string();
            return FrontmatterSplit {
                yaml: Some(yaml),
                body,
                body_start_line: line_no + 1,
                unterminated: false,
            };
        }
        offset += line.len();
    }

    FrontmatterSplit {
        yaml: None,
        body: content.to_string(),
        body_start_line: 1,
        unterminated: true,
    }
}

/// Parse a YAML metadata block into an ordered map.
pub fn parse_metadata(yaml: &str) -> Result<Metadata, String> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::new());
    }

    let value: YamlValue =
        serde_yaml::from_str(yaml).map_err(|e| format!("invalid YAML: {}", e))?;

    match value {
        YamlValue::Null => Ok(Metadata::new()),
        YamlValue::Mapping(mapping) => Ok(mapping
            .into_iter()
            .map(|(k, v)| (yaml_key(&k), from_yaml(v)))
            .collect()),
        _ => Err("metadata block is not a key-value mapping".to_string()),
    }
}

/// Render metadata + body back into note text.
///
/// A note that had no metadata block and still has no metadata is returned as the bare body.
pub fn render_note(metadata: &Metadata, body: &str, had_block: bool) -> Result<String, String> {
    if metadata.is_empty() {
        if had_block {
            return Ok(format!("---\n---\n{}", body));
        }
        return Ok(body.to_string());
    }

    let yaml = serde_yaml::to_string(metadata)
        .map_err(|e| format!("Failed to serialize metadata: {}", e))?;
    Ok(format!("---\n{}---\n{}", yaml, body))
}

fn yaml_key(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &YamlValue) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_default()
}

fn from_yaml(value: YamlValue) -> MetadataValue {
    match value {
        YamlValue::Null => MetadataValue::Null,
        YamlValue::Bool(b) => MetadataValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else {
                MetadataValue::Float(n.as_f64().unwrap_or_default())
            }
        }
        YamlValue::String(s) => MetadataValue::Text(s),
        YamlValue::Sequence(items) => {
            MetadataValue::List(items.into_iter().map(from_yaml).collect())
        }
        YamlValue::Mapping(mapping) => MetadataValue::Map(
            mapping
                .into_iter()
                .map(|(k, v)| (yaml_key(&k), from_yaml(v)))
                .collect(),
        ),
        YamlValue::Tagged(tagged) => from_yaml(tagged.value),
    }
}
