//! Note types (models) and card-generation requirements.
//!
//! A [`NoteType`] names its fields, lists its card templates and carries one
//! [`Requirement`] per template. The requirement decides whether a given
//! note produces a card for that template, based on which of the note's
//! fields are non-empty.
//!
//! # Example
//!
//! ```
//! use ankit_apkg::{NoteType, Requirement, Template};
//!
//! # fn main() -> ankit_apkg::Result<()> {
//! let model = NoteType::new(
//!     Some(1_234_567_890),
//!     "Vocabulary",
//!     vec!["Word".to_string(), "Meaning".to_string()],
//!     vec![Template::new("Recall", "{{Word}}", "{{FrontSide}}<hr>{{Meaning}}")],
//!     vec![Requirement::all([0, 1])],
//! )?;
//!
//! let note = model.create_note(["chat", ""], Vec::<String>::new(), None)?;
//! assert!(model.cards_for(&note).is_empty());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::hash::guid_for;
use crate::ids::random_id;
use crate::note::Note;

static FIELD_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("valid field reference pattern"));

/// Default card styling.
pub const DEFAULT_CSS: &str = r#".card {
    font-family: arial;
    font-size: 20px;
    text-align: center;
    color: black;
    background-color: white;
}"#;

/// Card template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Template name.
    pub name: String,

    /// Question-side format.
    pub question: String,

    /// Answer-side format.
    pub answer: String,
}

impl Template {
    /// Create a template.
    pub fn new(
        name: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// How a requirement's field set is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementKind {
    /// Every listed field must be non-empty.
    All,
    /// At least one listed field must be non-empty.
    Any,
    /// Every listed field must be empty.
    None,
}

/// Card-generation rule for one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    kind: RequirementKind,
    fields: BTreeSet<usize>,
}

impl Requirement {
    /// Create a requirement.
    pub fn new(kind: RequirementKind, fields: impl IntoIterator<Item = usize>) -> Self {
        Self {
            kind,
            fields: fields.into_iter().collect(),
        }
    }

    /// All of `fields` must be non-empty.
    pub fn all(fields: impl IntoIterator<Item = usize>) -> Self {
        Self::new(RequirementKind::All, fields)
    }

    /// Any of `fields` must be non-empty.
    pub fn any(fields: impl IntoIterator<Item = usize>) -> Self {
        Self::new(RequirementKind::Any, fields)
    }

    /// None of `fields` may be non-empty.
    pub fn none(fields: impl IntoIterator<Item = usize>) -> Self {
        Self::new(RequirementKind::None, fields)
    }

    /// Derive the requirement for a template from the fields its question
    /// side references.
    ///
    /// Falls back to requiring the first field when nothing is referenced.
    pub fn derive(fields: &[String], template: &Template) -> Self {
        let referenced: BTreeSet<usize> = FIELD_REF
            .captures_iter(&template.question)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| referenced_field(m.as_str()))
            .filter_map(|name| fields.iter().position(|f| f == name))
            .collect();

        if referenced.is_empty() {
            Self::any([0])
        } else {
            Self::new(RequirementKind::Any, referenced)
        }
    }

    /// Evaluation kind.
    pub fn kind(&self) -> RequirementKind {
        self.kind
    }

    /// Field indices the rule looks at.
    pub fn fields(&self) -> &BTreeSet<usize> {
        &self.fields
    }

    /// Whether a note whose non-empty fields are `non_empty` satisfies this rule.
    pub fn is_satisfied_by(&self, non_empty: &BTreeSet<usize>) -> bool {
        match self.kind {
            RequirementKind::All => self.fields.iter().all(|i| non_empty.contains(i)),
            RequirementKind::Any => self.fields.iter().any(|i| non_empty.contains(i)),
            RequirementKind::None => self.fields.iter().all(|i| !non_empty.contains(i)),
        }
    }
}

/// Field name behind a `{{...}}` token, ignoring section markers and filters.
fn referenced_field(token: &str) -> Option<&str> {
    let token = token.trim().trim_start_matches(['#', '^', '/']);
    let name = token.rsplit(':').next().unwrap_or(token).trim();
    if name.is_empty() || name == "FrontSide" {
        None
    } else {
        Some(name)
    }
}

/// Note type: fields, templates and their card-generation requirements.
#[derive(Debug, Clone)]
pub struct NoteType {
    id: i64,
    name: String,
    fields: Vec<String>,
    templates: Vec<Template>,
    requirements: Vec<Requirement>,
    css: String,
    sort_field: usize,
}

impl NoteType {
    /// Define a note type.
    ///
    /// A random id is generated when `id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] when there are no fields or templates, field
    /// names repeat, the requirement count differs from the template count,
    /// or a requirement references a field index out of range.
    pub fn new(
        id: Option<i64>,
        name: impl Into<String>,
        fields: Vec<String>,
        templates: Vec<Template>,
        requirements: Vec<Requirement>,
    ) -> Result<Self> {
        let name = name.into();

        if fields.is_empty() {
            return Err(Error::schema(&name, "at least one field is required"));
        }
        if templates.is_empty() {
            return Err(Error::schema(&name, "at least one template is required"));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.as_str()) {
                return Err(Error::schema(&name, format!("duplicate field '{field}'")));
            }
        }

        if requirements.len() != templates.len() {
            return Err(Error::schema(
                &name,
                format!(
                    "{} templates but {} requirements",
                    templates.len(),
                    requirements.len()
                ),
            ));
        }

        for (ord, req) in requirements.iter().enumerate() {
            if let Some(bad) = req.fields().iter().find(|&&i| i >= fields.len()) {
                return Err(Error::schema(
                    &name,
                    format!(
                        "requirement for template {ord} references field {bad}, but only {} fields exist",
                        fields.len()
                    ),
                ));
            }
        }

        Ok(Self {
            id: id.unwrap_or_else(random_id),
            name,
            fields,
            templates,
            requirements,
            css: DEFAULT_CSS.to_string(),
            sort_field: 0,
        })
    }

    /// Define a note type whose requirements are derived from its templates.
    pub fn with_derived_requirements(
        id: Option<i64>,
        name: impl Into<String>,
        fields: Vec<String>,
        templates: Vec<Template>,
    ) -> Result<Self> {
        let requirements = templates
            .iter()
            .map(|t| Requirement::derive(&fields, t))
            .collect();
        Self::new(id, name, fields, templates, requirements)
    }

    /// The two-field front/back note type with a single card template.
    pub fn front_back(id: Option<i64>, name: impl Into<String>) -> Self {
        Self {
            id: id.unwrap_or_else(random_id),
            name: name.into(),
            fields: vec!["Front".to_string(), "Back".to_string()],
            templates: vec![Template::new(
                "Card 1",
                "{{Front}}",
                r#"{{FrontSide}}<hr id="answer">{{Back}}"#,
            )],
            requirements: vec![Requirement::any([0])],
            css: DEFAULT_CSS.to_string(),
            sort_field: 0,
        }
    }

    /// Replace the card styling.
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }

    /// Choose which field is used for sorting and duplicate checks.
    pub fn with_sort_field(mut self, index: usize) -> Result<Self> {
        if index >= self.fields.len() {
            return Err(Error::schema(
                &self.name,
                format!("sort field {index} out of range"),
            ));
        }
        self.sort_field = index;
        Ok(self)
    }

    /// Note type id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field names in order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Card templates in order.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Requirement per template.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Card styling.
    pub fn css(&self) -> &str {
        &self.css
    }

    /// Index of the sort field.
    pub fn sort_field(&self) -> usize {
        self.sort_field
    }

    /// Create a note of this type.
    ///
    /// Without an explicit `guid` the note gets a content GUID, see
    /// [`content_guid`](Self::content_guid).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Arity`] when the number of values differs from the
    /// number of fields.
    pub fn create_note<F, T>(&self, values: F, tags: T, guid: Option<String>) -> Result<Note>
    where
        F: IntoIterator,
        F::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() != self.fields.len() {
            return Err(Error::Arity {
                model: self.name.clone(),
                expected: self.fields.len(),
                actual: values.len(),
            });
        }

        let guid = guid.unwrap_or_else(|| self.content_guid(&values));
        let tags = tags.into_iter().map(Into::into).collect();
        Ok(Note::new(self.id, values, tags, guid))
    }

    /// GUID for a note of this type with the given field values.
    ///
    /// The hash covers the note type id and field names as well as the
    /// values, so identical content under two note types never collides.
    pub fn content_guid(&self, values: &[String]) -> String {
        let id = self.id.to_string();
        let parts: Vec<&str> = std::iter::once(id.as_str())
            .chain(self.fields.iter().map(String::as_str))
            .chain(values.iter().map(String::as_str))
            .collect();
        guid_for(&parts)
    }

    /// Template ordinals that produce a card for `note`.
    pub fn cards_for(&self, note: &Note) -> Vec<usize> {
        let non_empty = note.non_empty_fields();
        self.requirements
            .iter()
            .enumerate()
            .filter(|(_, req)| req.is_satisfied_by(&non_empty))
            .map(|(ord, _)| ord)
            .collect()
    }
}
