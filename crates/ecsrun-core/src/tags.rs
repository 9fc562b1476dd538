use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Parse a `KEY=VALUE,KEY2=VALUE2` tag list. Empty segments are skipped;
/// values may be empty and may contain `=`.
pub fn parse_tags(s: &str) -> Result<Vec<Tag>, String> {
    let mut tags = Vec::new();
    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('=') {
            Some((key, value)) if !key.is_empty() => tags.push(Tag::new(key, value)),
            _ => return Err(format!("invalid tag format: {}", part)),
        }
    }
    Ok(tags)
}
