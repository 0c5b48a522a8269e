//! Path templates such as `/user/{id}`.
//!
//! The same parser backs both sides of a call: route tables use it to check
//! that handlers declare every placeholder, and the remote client uses it to
//! substitute arguments into outbound paths.

use std::collections::HashSet;
use std::fmt;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped when a value is substituted into a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("path template must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("unbalanced braces in path template: {0}")]
    Unbalanced(String),

    #[error("invalid placeholder name {name:?} in path template {template}")]
    InvalidPlaceholder { template: String, name: String },

    #[error("placeholder {{{name}}} must span a whole path segment in {template}")]
    PartialSegment { template: String, name: String },

    #[error("placeholder {{{name}}} appears more than once in {template}")]
    DuplicatePlaceholder { template: String, name: String },

    #[error("no value bound for placeholder {{{0}}}")]
    Unbound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Placeholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    parts: Vec<Part>,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        if !raw.starts_with('/') {
            return Err(TemplateError::MissingLeadingSlash(raw.to_string()));
        }

        let mut parts = Vec::new();
        let mut seen = HashSet::new();
        let mut rest = raw;

        while let Some(open) = rest.find(['{', '}']) {
            if rest.as_bytes()[open] == b'}' {
                return Err(TemplateError::Unbalanced(raw.to_string()));
            }

            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| TemplateError::Unbalanced(raw.to_string()))?;
            let name = &after[..close];

            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(TemplateError::InvalidPlaceholder {
                    template: raw.to_string(),
                    name: name.to_string(),
                });
            }

            let tail = &after[close + 1..];
            if !rest[..open].ends_with('/') || !(tail.is_empty() || tail.starts_with('/')) {
                return Err(TemplateError::PartialSegment {
                    template: raw.to_string(),
                    name: name.to_string(),
                });
            }

            if !seen.insert(name) {
                return Err(TemplateError::DuplicatePlaceholder {
                    template: raw.to_string(),
                    name: name.to_string(),
                });
            }

            parts.push(Part::Literal(rest[..open].to_string()));
            parts.push(Part::Placeholder(name.to_string()));
            rest = tail;
        }

        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Placeholder(name) => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholders().any(|p| p == name)
    }

    /// Substitute every placeholder with the value returned by `value`,
    /// percent-encoded as a single path segment.
    pub fn expand<F>(&self, mut value: F) -> Result<String, TemplateError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut path = String::with_capacity(self.raw.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => path.push_str(text),
                Part::Placeholder(name) => {
                    let raw = value(name).ok_or_else(|| TemplateError::Unbound(name.clone()))?;
                    path.extend(utf8_percent_encode(&raw, SEGMENT));
                }
            }
        }
        Ok(path)
    }

    /// The template in axum's route syntax (`/user/:id`)
    pub fn axum_path(&self) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                Part::Literal(text) => text.clone(),
                Part::Placeholder(name) => format!(":{}", name),
            })
            .collect()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
