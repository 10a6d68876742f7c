//! Dismissable message panel above the result table.

use super::escape;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

impl MessageKind {
    fn css_class(self) -> &'static str {
        match self {
            MessageKind::Info => "message-info",
            MessageKind::Warning => "message-warning",
            MessageKind::Error => "message-error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: u64,
    pub kind: MessageKind,
    pub text: String,
}

/// At most one message per kind is shown; a new message replaces the
/// previous one of the same kind.
#[derive(Debug, Default)]
pub struct MessagePanel {
    messages: Vec<Message>,
    next_id: u64,
}

impl MessagePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: MessageKind, text: impl Into<String>) -> u64 {
        self.messages.retain(|m| m.kind != kind);
        self.next_id += 1;
        let id = self.next_id;
        self.messages.push(Message {
            id,
            kind,
            text: text.into(),
        });
        id
    }

    pub fn info(&mut self, text: impl Into<String>) -> u64 {
        self.push(MessageKind::Info, text)
    }

    pub fn warn(&mut self, text: impl Into<String>) -> u64 {
        self.push(MessageKind::Warning, text)
    }

    pub fn error(&mut self, text: impl Into<String>) -> u64 {
        self.push(MessageKind::Error, text)
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn has(&self, kind: MessageKind) -> bool {
        self.messages.iter().any(|m| m.kind == kind)
    }

    pub fn render(&self) -> String {
        let mut html = String::new();
        for message in &self.messages {
            html.push_str(&format!(
                "<div class=\"message {}\" data-message=\"{}\">{}<button class=\"dismiss\" data-message=\"{}\">&times;</button></div>",
                message.kind.css_class(),
                message.id,
                escape(&message.text),
                message.id
            ));
        }
        html
    }
}
