use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, TrackerError};

/// State given to every freshly created record
pub const DEFAULT_STATE: &str = "To do";

/// Storage format of `creation_date` and `deadline`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw field mapping of one stored row, keyed by column name
pub type Fields = HashMap<String, String>;

/// The two record kinds, one store per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Project,
    Task,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Project => write!(f, "project"),
            RecordKind::Task => write!(f, "task"),
        }
    }
}

const PROJECT_COLUMNS: [Field; 8] = [
    Field::Id,
    Field::Name,
    Field::Description,
    Field::DetailedDescription,
    Field::CreationDate,
    Field::Deadline,
    Field::State,
    Field::TaskList,
];

const TASK_COLUMNS: [Field; 8] = [
    Field::Id,
    Field::Name,
    Field::Description,
    Field::DetailedDescription,
    Field::CreationDate,
    Field::Deadline,
    Field::State,
    Field::LinkedProject,
];

impl RecordKind {
    /// Columns of this kind, in file order
    pub fn columns(&self) -> &'static [Field] {
        match self {
            RecordKind::Project => &PROJECT_COLUMNS,
            RecordKind::Task => &TASK_COLUMNS,
        }
    }

    /// The kind on the other side of the back-reference
    pub fn counterpart(&self) -> RecordKind {
        match self {
            RecordKind::Project => RecordKind::Task,
            RecordKind::Task => RecordKind::Project,
        }
    }
}

/// A named field of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Name,
    Description,
    DetailedDescription,
    CreationDate,
    Deadline,
    State,
    /// Project only
    TaskList,
    /// Task only
    LinkedProject,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

impl Field {
    /// Column name in the backing file
    pub fn column(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Name => "name",
            Field::Description => "description",
            Field::DetailedDescription => "detailed_description",
            Field::CreationDate => "creation_date",
            Field::Deadline => "deadline",
            Field::State => "state",
            Field::TaskList => "task_list",
            Field::LinkedProject => "linked_project",
        }
    }

    /// Older files spell the deadline column `dead_line`
    fn legacy_column(&self) -> Option<&'static str> {
        match self {
            Field::Deadline => Some("dead_line"),
            _ => None,
        }
    }

    /// Parse a field from a column or property name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "id" => Some(Field::Id),
            "name" => Some(Field::Name),
            "description" => Some(Field::Description),
            "detailed_description" => Some(Field::DetailedDescription),
            "creation_date" => Some(Field::CreationDate),
            "deadline" | "dead_line" => Some(Field::Deadline),
            "state" => Some(Field::State),
            "task_list" => Some(Field::TaskList),
            "linked_project" => Some(Field::LinkedProject),
            _ => None,
        }
    }

    /// Parse a property name and check it exists on `kind`
    pub fn for_kind(name: &str, kind: RecordKind) -> Result<Self> {
        Self::from_name(name)
            .filter(|field| field.belongs_to(kind))
            .ok_or_else(|| TrackerError::UnknownField {
                kind,
                name: name.trim().to_string(),
            })
    }

    pub fn belongs_to(&self, kind: RecordKind) -> bool {
        kind.columns().contains(self)
    }

    fn lookup<'a>(&self, fields: &'a Fields) -> Option<&'a String> {
        fields
            .get(self.column())
            .or_else(|| self.legacy_column().and_then(|legacy| fields.get(legacy)))
    }
}

/// Value of one field, scalar or sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Flatten into the list of ids or the single text value
    pub fn into_items(self) -> Vec<String> {
        match self {
            FieldValue::Text(text) => vec![text],
            FieldValue::List(items) => items,
        }
    }
}

/// Source of yes/no answers for operations that overwrite or remove links
pub trait Confirmation {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

impl<F> Confirmation for F
where
    F: FnMut(&str) -> Result<bool>,
{
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self(question)
    }
}

/// A [`Confirmation`] that answers no to everything
pub struct Decline;

impl Confirmation for Decline {
    fn confirm(&mut self, _question: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Kind-specific half of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Links {
    /// Ids of the tasks owned by a project, each at most once
    Project { task_list: Vec<String> },
    /// Owning project of a task, `None` when unlinked
    Task { linked_project: Option<String> },
}

/// One stored project or task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub description: String,
    pub detailed_description: String,
    pub creation_date: NaiveDate,
    pub deadline: String,
    pub state: String,
    pub links: Links,
}

impl Record {
    /// Creates an empty record of `kind` with the default state and payload
    pub fn new(kind: RecordKind, id: impl Into<String>, creation_date: NaiveDate) -> Self {
        let links = match kind {
            RecordKind::Project => Links::Project {
                task_list: Vec::new(),
            },
            RecordKind::Task => Links::Task {
                linked_project: None,
            },
        };
        Self {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            detailed_description: String::new(),
            creation_date,
            deadline: String::new(),
            state: DEFAULT_STATE.to_string(),
            links,
        }
    }

    /// Builds a record of `kind` from a raw field mapping.
    ///
    /// `id` and `creation_date` are required; every other column is optional
    /// and keeps its default when absent.
    pub fn from_fields(kind: RecordKind, fields: &Fields) -> Result<Self> {
        let id = Field::Id
            .lookup(fields)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| TrackerError::MalformedRecord {
                kind,
                message: "missing id".to_string(),
            })?;
        let creation_date = Field::CreationDate
            .lookup(fields)
            .ok_or_else(|| TrackerError::MalformedRecord {
                kind,
                message: format!("{} {} has no creation_date", kind, id),
            })
            .and_then(|raw| parse_date(kind, raw))?;

        let mut record = Record::new(kind, id, creation_date);
        record.merge_from(fields, &mut Decline)?;
        Ok(record)
    }

    pub fn kind(&self) -> RecordKind {
        match self.links {
            Links::Project { .. } => RecordKind::Project,
            Links::Task { .. } => RecordKind::Task,
        }
    }

    /// Copies every field present in `fields` onto this record.
    ///
    /// Scalars are overwritten. An incoming `task_list` is appended and fails
    /// with `DuplicateLink` when it repeats an id already listed. An incoming
    /// `linked_project` that would replace a different existing link asks
    /// `confirm` first and fails with `UpdateCancelled` on a no. Nothing is
    /// changed when an error is returned.
    pub fn merge_from(&mut self, fields: &Fields, confirm: &mut dyn Confirmation) -> Result<()> {
        let mut merged = self.clone();
        for &field in self.kind().columns() {
            let Some(value) = field.lookup(fields) else {
                continue;
            };
            match field {
                Field::TaskList => merged.merge_task_list(value)?,
                Field::LinkedProject => merged.merge_linked_project(value, confirm)?,
                _ => merged.set_field(field, value)?,
            }
        }
        *self = merged;
        Ok(())
    }

    fn merge_task_list(&mut self, literal: &str) -> Result<()> {
        let incoming = decode_task_list(literal)?;
        if let Links::Project { task_list } = &mut self.links {
            if !task_list.is_empty() && incoming.iter().any(|id| task_list.contains(id)) {
                return Err(TrackerError::DuplicateLink {
                    incoming,
                    current: task_list.clone(),
                });
            }
            for id in incoming {
                if !task_list.contains(&id) {
                    task_list.push(id);
                }
            }
        }
        Ok(())
    }

    fn merge_linked_project(&mut self, value: &str, confirm: &mut dyn Confirmation) -> Result<()> {
        let incoming = Some(value.trim()).filter(|v| !v.is_empty());
        if let Links::Task { linked_project } = &mut self.links {
            if let Some(current) = linked_project.as_deref() {
                if incoming != Some(current) {
                    let question = format!(
                        "This task is already linked to project {}. Link it to {} instead?",
                        current,
                        incoming.unwrap_or("no project")
                    );
                    if !confirm.confirm(&question)? {
                        return Err(TrackerError::UpdateCancelled);
                    }
                }
            }
            *linked_project = incoming.map(str::to_string);
        }
        Ok(())
    }

    /// Sets a scalar field from its textual form
    pub fn set_field(&mut self, field: Field, value: &str) -> Result<()> {
        match field {
            Field::Id => self.id = value.trim().to_string(),
            Field::Name => self.name = value.to_string(),
            Field::Description => self.description = value.to_string(),
            Field::DetailedDescription => self.detailed_description = value.to_string(),
            Field::CreationDate => self.creation_date = parse_date(self.kind(), value)?,
            Field::Deadline => self.deadline = value.trim().to_string(),
            Field::State => self.state = value.to_string(),
            Field::TaskList | Field::LinkedProject => {
                return Err(TrackerError::ReadOnlyField {
                    field,
                    hint: "links are changed through the project's task_list".to_string(),
                })
            }
        }
        Ok(())
    }

    pub fn field_value(&self, field: Field) -> Option<FieldValue> {
        let text = |s: &str| Some(FieldValue::Text(s.to_string()));
        match field {
            Field::Id => text(&self.id),
            Field::Name => text(&self.name),
            Field::Description => text(&self.description),
            Field::DetailedDescription => text(&self.detailed_description),
            Field::CreationDate => text(&self.creation_date.format(DATE_FORMAT).to_string()),
            Field::Deadline => text(&self.deadline),
            Field::State => text(&self.state),
            Field::TaskList => self.task_list().map(|ids| FieldValue::List(ids.to_vec())),
            Field::LinkedProject => match &self.links {
                Links::Task { linked_project } => {
                    text(linked_project.as_deref().unwrap_or_default())
                }
                Links::Project { .. } => None,
            },
        }
    }

    /// Textual form of a field, as written to the backing file
    pub fn field_text(&self, field: Field) -> String {
        match self.field_value(field) {
            Some(FieldValue::Text(text)) => text,
            Some(FieldValue::List(ids)) => encode_task_list(&ids),
            None => String::new(),
        }
    }

    /// Whether `field` contains `value`.
    ///
    /// `task_list` checks membership, `id` and `linked_project` compare
    /// exactly, and the remaining text fields match substrings.
    pub fn field_contains(&self, field: Field, value: &str) -> bool {
        match field {
            Field::TaskList => self
                .task_list()
                .is_some_and(|ids| ids.iter().any(|id| id == value)),
            Field::Id => self.id == value,
            Field::LinkedProject => self.linked_project() == Some(value),
            _ => match self.field_value(field) {
                Some(FieldValue::Text(text)) => text.contains(value),
                _ => false,
            },
        }
    }

    pub fn to_fields(&self) -> Fields {
        self.kind()
            .columns()
            .iter()
            .map(|field| (field.column().to_string(), self.field_text(*field)))
            .collect()
    }

    pub fn task_list(&self) -> Option<&[String]> {
        match &self.links {
            Links::Project { task_list } => Some(task_list),
            Links::Task { .. } => None,
        }
    }

    pub fn task_list_mut(&mut self) -> Option<&mut Vec<String>> {
        match &mut self.links {
            Links::Project { task_list } => Some(task_list),
            Links::Task { .. } => None,
        }
    }

    pub fn linked_project(&self) -> Option<&str> {
        match &self.links {
            Links::Task { linked_project } => linked_project.as_deref(),
            Links::Project { .. } => None,
        }
    }

    /// Replaces the owning project of a task. Returns false on a project.
    pub fn set_linked_project(&mut self, project_id: Option<String>) -> bool {
        match &mut self.links {
            Links::Task { linked_project } => {
                *linked_project = project_id;
                true
            }
            Links::Project { .. } => false,
        }
    }
}

fn parse_date(kind: RecordKind, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| TrackerError::MalformedRecord {
        kind,
        message: format!("invalid date '{}': {}", raw, e),
    })
}

/// Writes a task list as a list literal, e.g. `['1', '2']`
pub fn encode_task_list(ids: &[String]) -> String {
    let items: Vec<String> = ids
        .iter()
        .map(|id| format!("'{}'", id.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!("[{}]", items.join(", "))
}

/// Reads a task list literal.
///
/// Accepts single or double quoted items and bare integers. An empty cell is
/// an empty list.
pub fn decode_task_list(literal: &str) -> Result<Vec<String>> {
    let malformed = |message: String| TrackerError::MalformedRecord {
        kind: RecordKind::Project,
        message,
    };

    let trimmed = literal.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| malformed(format!("task list '{}' is not a list literal", literal)))?;

    let mut ids = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let Some(&first) = chars.peek() else {
            break;
        };

        let item = if first == '\'' || first == '"' {
            chars.next();
            let mut item = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        item.push(escaped);
                    }
                } else if c == first {
                    closed = true;
                    break;
                } else {
                    item.push(c);
                }
            }
            if !closed {
                return Err(malformed(format!(
                    "unterminated item in task list '{}'",
                    literal
                )));
            }
            item
        } else {
            let mut item = String::new();
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                item.push(c);
                chars.next();
            }
            let item = item.trim().to_string();
            if item.is_empty() || !item.chars().all(|c| c.is_ascii_digit()) {
                return Err(malformed(format!(
                    "unexpected item '{}' in task list '{}'",
                    item, literal
                )));
            }
            item
        };
        ids.push(item);

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(c) => {
                return Err(malformed(format!(
                    "expected ',' but found '{}' in task list '{}'",
                    c, literal
                )))
            }
        }
    }
    Ok(ids)
}
