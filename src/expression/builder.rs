//! Ordered collection of expression lines.
//!
//! Lines are addressed by [`LineId`] so removal does not depend on positions
//! shifting under concurrent inserts.

use super::{BuildError, Comparator, DateTimeRange, ExpressionField, SearchExpression};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LineId(u64);

impl LineId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for LineId {
    fn from(value: u64) -> Self {
        LineId(value)
    }
}

/// Value input of a line: free text, or a selector over a small set of
/// known values for the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LineInput {
    Text { value: String },
    Choice { options: Vec<String>, selected: Option<String> },
}

impl LineInput {
    pub fn value(&self) -> &str {
        match self {
            LineInput::Text { value } => value,
            LineInput::Choice { selected, .. } => selected.as_deref().unwrap_or(""),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.value().trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpressionLine {
    pub id: LineId,
    pub field: String,
    pub comparator: Comparator,
    pub input: LineInput,
}

impl ExpressionLine {
    pub fn value(&self) -> &str {
        self.input.value()
    }

    fn to_field(&self) -> ExpressionField {
        ExpressionField::new(self.field.clone(), self.comparator, self.value())
    }
}

#[derive(Debug, Clone)]
pub struct ExpressionBuilder {
    lines: Vec<ExpressionLine>,
    next_id: u64,
    default_field: String,
}

impl ExpressionBuilder {
    pub fn new(default_field: impl Into<String>) -> Self {
        Self {
            lines: Vec::new(),
            next_id: 1,
            default_field: default_field.into(),
        }
    }

    pub fn lines(&self) -> &[ExpressionLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, id: LineId) -> Option<&ExpressionLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    fn line_mut(&mut self, id: LineId) -> Option<&mut ExpressionLine> {
        self.lines.iter_mut().find(|l| l.id == id)
    }

    /// Append an empty line unless some line still has no value.
    pub fn add_line(&mut self) -> Option<LineId> {
        if self.has_empty_fields() {
            return None;
        }
        let field = self.default_field.clone();
        Some(self.push(field, Comparator::default(), String::new()))
    }

    /// Append a filled line unconditionally (drill-down reconstruction).
    pub fn push_line(
        &mut self,
        field: impl Into<String>,
        comparator: Comparator,
        value: impl Into<String>,
    ) -> LineId {
        self.push(field.into(), comparator, value.into())
    }

    fn push(&mut self, field: String, comparator: Comparator, value: String) -> LineId {
        let id = LineId(self.next_id);
        self.next_id += 1;
        self.lines.push(ExpressionLine {
            id,
            field,
            comparator,
            input: LineInput::Text { value },
        });
        id
    }

    /// Detach a line by identity. Returns false for unknown ids.
    pub fn remove_line(&mut self, id: LineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn has_empty_fields(&self) -> bool {
        self.lines.iter().any(|l| l.input.is_blank())
    }

    /// Advance the line's comparator and return the new one.
    pub fn cycle_comparator(&mut self, id: LineId) -> Option<Comparator> {
        let line = self.line_mut(id)?;
        line.comparator = line.comparator.next();
        Some(line.comparator)
    }

    pub fn set_comparator(&mut self, id: LineId, comparator: Comparator) -> bool {
        let Some(line) = self.line_mut(id) else {
            return false;
        };
        line.comparator = comparator;
        true
    }

    /// Change the field of a line. The input falls back to free text since
    /// choices belong to the previous field.
    pub fn set_field(&mut self, id: LineId, field: impl Into<String>) -> bool {
        let Some(line) = self.line_mut(id) else {
            return false;
        };
        line.field = field.into();
        let value = match &line.input {
            LineInput::Text { value } => value.clone(),
            LineInput::Choice { .. } => String::new(),
        };
        line.input = LineInput::Text { value };
        true
    }

    /// Set the typed value, or the selected option for a choice input.
    /// Selections outside the offered options are ignored.
    pub fn set_value(&mut self, id: LineId, value: impl Into<String>) -> bool {
        let Some(line) = self.line_mut(id) else {
            return false;
        };
        let value = value.into();
        match &mut line.input {
            LineInput::Text { value: current } => *current = value,
            LineInput::Choice { options, selected } => {
                if value.is_empty() {
                    *selected = None;
                } else if options.contains(&value) {
                    *selected = Some(value);
                } else {
                    return false;
                }
            }
        }
        true
    }

    /// Switch a line to a choice selector. An empty option list keeps the
    /// free-text input.
    pub fn set_choices(&mut self, id: LineId, options: Vec<String>) -> bool {
        let Some(line) = self.line_mut(id) else {
            return false;
        };
        if options.is_empty() {
            return false;
        }
        let current = line.value().to_string();
        let selected = options.contains(&current).then_some(current);
        line.input = LineInput::Choice { options, selected };
        true
    }

    /// Validate and serialize the builder state.
    pub fn build(&self, range: DateTimeRange) -> Result<SearchExpression, BuildError> {
        if self.has_empty_fields() {
            return Err(BuildError::EmptyFields);
        }
        if self.lines.is_empty() && range.is_empty() {
            return Err(BuildError::EmptySearchMask);
        }

        Ok(SearchExpression {
            fields: self.lines.iter().map(ExpressionLine::to_field).collect(),
            datetime: range.to_wire(),
            advcount: None,
        })
    }
}
