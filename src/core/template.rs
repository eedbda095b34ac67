/// Field templates: slot parsing, guarded clauses, and RON loading.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::schema::character::NarrativeField;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template parse error: {0}")]
    TemplateParse(String),
    #[error("unknown narrative field '{0}'")]
    UnknownField(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Resolved slot values, keyed by slot name.
pub type Slots = FxHashMap<String, String>;

/// Case transform applied to a slot value: `{slot|lower}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    Lower,
    Upper,
    Capitalize,
}

impl Filter {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "lower" => Some(Self::Lower),
            "upper" => Some(Self::Upper),
            "capitalize" => Some(Self::Capitalize),
            _ => None,
        }
    }

    pub(crate) fn apply(self, value: &str) -> String {
        match self {
            Self::Lower => value.to_lowercase(),
            Self::Upper => value.to_uppercase(),
            Self::Capitalize => {
                let mut chars = value.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// Slot interpolation: `{name}` or `{name|filter}`.
    Slot { name: String, filter: Option<Filter> },
}

/// A parsed template: literal text and slot references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub segments: Vec<TemplateSegment>,
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{slot}` → `Slot`
    /// - `{slot|lower}` / `{slot|upper}` / `{slot|capitalize}` → filtered `Slot`
    /// - `{{` / `}}` → literal braces
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Template, TemplateError> {
        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            if chars[i] == '{' {
                if i + 1 < len && chars[i + 1] == '{' {
                    literal_buf.push('{');
                    i += 2;
                    continue;
                }

                if !literal_buf.is_empty() {
                    segments.push(TemplateSegment::Literal(std::mem::take(&mut literal_buf)));
                }

                let start = i + 1;
                let mut end = start;
                let mut closed = false;
                while end < len {
                    if chars[end] == '{' {
                        return Err(TemplateError::TemplateParse(
                            "nested braces are not allowed".to_string(),
                        ));
                    }
                    if chars[end] == '}' {
                        closed = true;
                        break;
                    }
                    end += 1;
                }

                if !closed {
                    return Err(TemplateError::TemplateParse("unclosed brace".to_string()));
                }

                let content: String = chars[start..end].iter().collect();
                if content.is_empty() {
                    return Err(TemplateError::TemplateParse("empty braces".to_string()));
                }

                segments.push(Self::parse_segment(&content)?);
                i = end + 1;
            } else if chars[i] == '}' {
                if i + 1 < len && chars[i + 1] == '}' {
                    literal_buf.push('}');
                    i += 2;
                    continue;
                }
                return Err(TemplateError::TemplateParse(
                    "unmatched closing brace".to_string(),
                ));
            } else {
                literal_buf.push(chars[i]);
                i += 1;
            }
        }

        if !literal_buf.is_empty() {
            segments.push(TemplateSegment::Literal(literal_buf));
        }

        Ok(Template { segments })
    }

    fn parse_segment(content: &str) -> Result<TemplateSegment, TemplateError> {
        let (name, filter) = match content.split_once('|') {
            Some((name, filter_name)) => {
                let filter = Filter::parse(filter_name.trim()).ok_or_else(|| {
                    TemplateError::TemplateParse(format!(
                        "unknown filter '{}' in '{{{}}}'",
                        filter_name, content
                    ))
                })?;
                (name.trim(), Some(filter))
            }
            None => (content.trim(), None),
        };

        if name.is_empty() {
            return Err(TemplateError::TemplateParse(format!(
                "missing slot name in '{{{}}}'",
                content
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TemplateError::TemplateParse(format!(
                "invalid slot name '{}'",
                name
            )));
        }

        Ok(TemplateSegment::Slot {
            name: name.to_string(),
            filter,
        })
    }

    /// Render against resolved slots. Unknown slots render as empty text.
    pub fn render(&self, slots: &Slots) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Slot { name, filter } => {
                    let value = slots.get(name).map(String::as_str).unwrap_or("");
                    match filter {
                        Some(f) => out.push_str(&f.apply(value)),
                        None => out.push_str(value),
                    }
                }
            }
        }
        out
    }

    /// Names of every slot this template reads.
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Slot { name, .. } => Some(name.as_str()),
            TemplateSegment::Literal(_) => None,
        })
    }
}

/// One sentence (or fragment) of a field, emitted only when its
/// `requires` slots are all filled and its `excludes` slots are all empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub requires: Vec<String>,
    pub excludes: Vec<String>,
    pub template: Template,
}

impl Clause {
    pub fn parse(text: &str) -> Result<Clause, TemplateError> {
        Ok(Clause {
            requires: Vec::new(),
            excludes: Vec::new(),
            template: Template::parse(text)?,
        })
    }

    pub fn applies(&self, slots: &Slots) -> bool {
        let filled = |name: &String| slots.get(name).is_some_and(|v| !v.trim().is_empty());
        self.requires.iter().all(filled) && !self.excludes.iter().any(filled)
    }

    /// Every slot the clause depends on, guards included.
    pub fn referenced_slots(&self) -> impl Iterator<Item = &str> {
        self.template
            .slot_names()
            .chain(self.requires.iter().map(String::as_str))
            .chain(self.excludes.iter().map(String::as_str))
    }
}

/// How one narrative field is written: ordered clauses, a joiner placed
/// between emitted clauses, and a terminator appended when any was emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub joiner: String,
    pub terminator: String,
    pub clauses: Vec<Clause>,
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self {
            joiner: " ".to_string(),
            terminator: String::new(),
            clauses: Vec::new(),
        }
    }
}

/// Field specs for the six narrative fields of one questionnaire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpecSet {
    pub fields: FxHashMap<NarrativeField, FieldSpec>,
}

// RON deserialization helpers. Clause text is parsed into templates after
// deserializing.

fn default_joiner() -> String {
    " ".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Clause")]
pub(crate) struct RonClause {
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    excludes: Vec<String>,
    text: String,
}

impl RonClause {
    pub(crate) fn into_clause(self) -> Result<Clause, TemplateError> {
        Ok(Clause {
            requires: self.requires,
            excludes: self.excludes,
            template: Template::parse(&self.text)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Field")]
struct RonField {
    #[serde(default = "default_joiner")]
    joiner: String,
    #[serde(default)]
    terminator: String,
    clauses: Vec<RonClause>,
}

/// Build a field spec from its RON parts.
pub(crate) fn field_spec_from_ron(
    joiner: String,
    terminator: String,
    clauses: Vec<RonClause>,
) -> Result<FieldSpec, TemplateError> {
    let clauses = clauses
        .into_iter()
        .map(RonClause::into_clause)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FieldSpec {
        joiner,
        terminator,
        clauses,
    })
}

impl FieldSpecSet {
    /// Load a field spec set from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<FieldSpecSet, TemplateError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a field spec set from a RON string.
    pub fn parse_ron(input: &str) -> Result<FieldSpecSet, TemplateError> {
        let raw: HashMap<String, RonField> = ron::from_str(input)?;
        let mut fields = FxHashMap::default();

        for (key, ron_field) in raw {
            let field =
                NarrativeField::from_key(&key).ok_or_else(|| TemplateError::UnknownField(key))?;
            let spec = field_spec_from_ron(ron_field.joiner, ron_field.terminator, ron_field.clauses)?;
            fields.insert(field, spec);
        }

        Ok(FieldSpecSet { fields })
    }

    pub fn get(&self, field: NarrativeField) -> Option<&FieldSpec> {
        self.fields.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge another set into this one. Fields from `other` replace
    /// fields in `self`.
    pub fn merge(&mut self, other: FieldSpecSet) {
        for (field, spec) in other.fields {
            self.fields.insert(field, spec);
        }
    }
}
