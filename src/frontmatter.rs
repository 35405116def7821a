//! Front matter splitting for content files.
//!
//! Every article is a text file whose metadata sits in a YAML block fenced by
//! `---` lines at the very top, followed by the markdown/MDX body:
//!
//! ```text
//! ---
//! title: Updated China Visa Requirements for 2025
//! date: 2025-01-15
//! category: Policy Updates
//! ---
//! China has updated several visa application requirements...
//! ```
//!
//! The metadata is exposed as a flat `key -> string` mapping. Callers apply
//! their own per-key defaults; this module only reports what the file says.
//!
//! ## Value mapping
//!
//! | YAML value | Exposed as |
//! |------------|------------|
//! | string | the string, unchanged (an explicit `""` stays `""`) |
//! | number / boolean | its textual form (`2025`, `true`) |
//! | `null` / `~` / empty | absent |
//! | sequence / mapping | absent |
//!
//! Unquoted ISO dates (`date: 2025-01-15`) are plain strings in YAML 1.2,
//! so they come through verbatim.
//!
//! A file that does not open with a `---` line has no front matter: the whole
//! text is the body. A file that opens a block but never closes it is an error,
//! as is a block that is not valid YAML or not a mapping.

use serde_yaml::Value;
use std::collections::BTreeMap;
use thiserror::Error;

const DELIMITER: &str = "---";

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("front matter block is not closed by a `---` line")]
    Unterminated,
    #[error("invalid YAML in front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,
}

/// Metadata block of a content file as a typed string mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    fields: BTreeMap<String, String>,
}

impl FrontMatter {
    /// Value for `key`, or `None` when the key is absent (or null/non-scalar).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Value for `key`, falling back to `default` only when the key is absent.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn from_yaml(yaml: &str) -> Result<Self, FrontMatterError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let mapping = match serde_yaml::from_str::<Value>(yaml)? {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(Self::default()),
            _ => return Err(FrontMatterError::NotAMapping),
        };

        let fields = mapping
            .iter()
            .filter_map(|(key, value)| Some((scalar_to_string(key)?, scalar_to_string(value)?)))
            .collect();
        Ok(Self { fields })
    }
}

/// A content file split into metadata and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub front_matter: FrontMatter,
    pub body: String,
}

/// Split raw file text into front matter and body.
///
/// The body starts on the line after the closing delimiter, so the line break
/// that ends the fence is not part of it.
pub fn parse(raw: &str) -> Result<Document, FrontMatterError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let (opening, rest) = split_first_line(text);
    if opening.trim_end() != DELIMITER {
        return Ok(Document {
            front_matter: FrontMatter::default(),
            body: text.to_string(),
        });
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let front_matter = FrontMatter::from_yaml(&rest[..offset])?;
            let body = rest[offset + line.len()..].to_string();
            return Ok(Document { front_matter, body });
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

fn split_first_line(text: &str) -> (&str, &str) {
    match text.find('\n') {
        Some(pos) => (&text[..pos], &text[pos + 1..]),
        None => (text, ""),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
