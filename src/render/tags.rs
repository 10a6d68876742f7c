//! Tag buttons above the result table.
//!
//! All tags start active. Deactivating a tag hides every row carrying it;
//! the inactive set is combined into one negated, AND-ed expression over
//! the `tags` column.

use super::escape;
use crate::api::value_parts;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagButton {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    tags: Vec<TagButton>,
}

impl TagFilter {
    pub fn new(tags: impl IntoIterator<Item = String>) -> Self {
        Self {
            tags: tags
                .into_iter()
                .map(|name| TagButton { name, active: true })
                .collect(),
        }
    }

    pub fn buttons(&self) -> &[TagButton] {
        &self.tags
    }

    /// Flip a tag and return its new state.
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        let tag = self.tags.iter_mut().find(|t| t.name == name)?;
        tag.active = !tag.active;
        Some(tag.active)
    }

    pub fn inactive(&self) -> Vec<String> {
        self.tags
            .iter()
            .filter(|t| !t.active)
            .map(|t| t.name.clone())
            .collect()
    }

    /// Filter expression for the `tags` column, `None` when every tag is
    /// active.
    pub fn expression(&self) -> Option<String> {
        let inactive = self.inactive();
        if inactive.is_empty() {
            return None;
        }
        Some(
            inactive
                .iter()
                .map(|t| format!("!{}", t))
                .collect::<Vec<_>>()
                .join(" && "),
        )
    }

    pub fn render(&self) -> String {
        let mut html = String::from("<div class=\"tag-filter\">");
        for tag in &self.tags {
            html.push_str(&format!(
                "<button class=\"tag{}\" data-tag=\"{}\">{}</button>",
                if tag.active { " active" } else { "" },
                escape(&tag.name),
                escape(&tag.name)
            ));
        }
        html.push_str("</div>");
        html
    }
}

/// Column filter derived from the inactive tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub expression: String,
    excluded: Vec<String>,
}

impl ColumnFilter {
    pub fn from_tags(filter: &TagFilter) -> Option<Self> {
        Some(Self {
            expression: filter.expression()?,
            excluded: filter.inactive(),
        })
    }

    /// True if the cell carries none of the excluded tags.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return true;
        };
        let parts = value_parts(value);
        !self.excluded.iter().any(|tag| parts.contains(tag))
    }
}
