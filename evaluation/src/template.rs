//! Prompt templates with named slots.
//!
//! A template is parsed once into literal text and `{slot}` references. `{{` and `}}`
//! render as literal braces; a brace that does not enclose a valid slot name is kept
//! as-is, so parsing never fails. Rendering fails with [`TemplateError::MissingSlot`]
//! when a value for a referenced slot is not supplied.

use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Missing value for template slot `{slot}`")]
    MissingSlot { slot: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(String),
}

/// Immutable text template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    segments: Vec<Segment>,
    slots: BTreeSet<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let segments = parse(&template);
        let slots = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Slot(name) => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect();

        Self {
            template,
            segments,
            slots,
        }
    }

    /// Raw template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Names of every slot the template references.
    pub fn slots(&self) -> &BTreeSet<String> {
        &self.slots
    }

    /// Fill every slot from `vars`. Unused entries in `vars` are ignored.
    pub fn format(&self, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
        if let Some(missing) = self
            .slots
            .iter()
            .find(|slot| !vars.iter().any(|(name, _)| name == slot))
        {
            return Err(TemplateError::MissingSlot {
                slot: missing.clone(),
            });
        }

        let mut rendered = String::with_capacity(self.template.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Slot(name) => {
                    // Presence checked above.
                    if let Some((_, value)) = vars.iter().find(|(key, _)| key == name) {
                        rendered.push_str(value);
                    }
                }
            }
        }
        Ok(rendered)
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn is_slot_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if let Some(Segment::Literal(last)) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(Segment::Literal(text.to_string()));
    }
}

fn parse(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                push_literal(&mut segments, "{");
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                push_literal(&mut segments, "}");
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                while let Some(&next) = chars.peek() {
                    if next == '}' {
                        chars.next();
                        closed = true;
                        break;
                    }
                    if next == '{' {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }

                if closed && is_slot_name(&name) {
                    segments.push(Segment::Slot(name));
                } else {
                    push_literal(&mut segments, "{");
                    push_literal(&mut segments, &name);
                    if closed {
                        push_literal(&mut segments, "}");
                    }
                }
            }
            other => {
                let mut buf = [0u8; 4];
                push_literal(&mut segments, other.encode_utf8(&mut buf));
            }
        }
    }

    segments
}

/// A template given either as raw text or as an already-built [`PromptTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    RawText(String),
    Built(PromptTemplate),
}

impl TemplateSource {
    pub fn into_template(self) -> PromptTemplate {
        match self {
            TemplateSource::RawText(text) => PromptTemplate::new(text),
            TemplateSource::Built(template) => template,
        }
    }
}

impl From<&str> for TemplateSource {
    fn from(text: &str) -> Self {
        TemplateSource::RawText(text.to_string())
    }
}

impl From<String> for TemplateSource {
    fn from(text: String) -> Self {
        TemplateSource::RawText(text)
    }
}

impl From<PromptTemplate> for TemplateSource {
    fn from(template: PromptTemplate) -> Self {
        TemplateSource::Built(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_collected() {
        let template = PromptTemplate::new("Q: {query_str}\nC: {context_str}\nAgain: {query_str}");
        let slots: Vec<&str> = template.slots().iter().map(String::as_str).collect();
        assert_eq!(slots, vec!["context_str", "query_str"]);
    }

    #[test]
    fn test_format_fills_every_occurrence() {
        let template = PromptTemplate::new("{a} and {b} and {a}");
        let rendered = template.format(&[("a", "x"), ("b", "y")]).unwrap();
        assert_eq!(rendered, "x and y and x");
    }

    #[test]
    fn test_format_missing_slot() {
        let template = PromptTemplate::new("Query: {query_str}\nContext: {context_str}");
        let err = template.format(&[("query_str", "q")]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingSlot {
                slot: "context_str".to_string()
            }
        );
    }

    #[test]
    fn test_extra_values_are_ignored() {
        let template = PromptTemplate::new("only {one}");
        let rendered = template.format(&[("one", "1"), ("two", "2")]).unwrap();
        assert_eq!(rendered, "only 1");
    }

    #[test]
    fn test_escaped_and_stray_braces() {
        let template = PromptTemplate::new("{{literal}} {not a slot} {0} } {slot}");
        assert_eq!(template.slots().len(), 1);
        let rendered = template.format(&[("slot", "v")]).unwrap();
        assert_eq!(rendered, "{literal} {not a slot} {0} } v");

        let unclosed = PromptTemplate::new("tail {open");
        assert!(unclosed.slots().is_empty());
        assert_eq!(unclosed.format(&[]).unwrap(), "tail {open");
    }

    #[test]
    fn test_substituted_values_are_not_reparsed() {
        let template = PromptTemplate::new("{query_str}");
        let rendered = template.format(&[("query_str", "{context_str}")]).unwrap();
        assert_eq!(rendered, "{context_str}");
    }

    #[test]
    fn test_template_source_resolution() {
        let built = PromptTemplate::new("Built {x}");
        assert_eq!(TemplateSource::from(built.clone()).into_template(), built);

        let raw = TemplateSource::from("Raw {y}").into_template();
        assert_eq!(raw.template(), "Raw {y}");
        assert!(raw.slots().contains("y"));
        assert_eq!(raw.to_string(), "Raw {y}");
    }
}
