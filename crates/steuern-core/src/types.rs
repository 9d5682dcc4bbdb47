//! Shared type definitions used across steuern crates.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw numeric value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Identifier of the project the panel is steering.
    ProjectId
);
numeric_id!(
    /// Identifier of a task (Auftrag).
    TaskId
);
numeric_id!(
    /// Identifier of an analysed error report (Fehler).
    ErrorReportId
);
numeric_id!(
    /// Identifier of a handoff document (Übergabe).
    HandoffId
);

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    /// The person operating the panel
    User,
    /// The panel itself (status and failure notices)
    System,
}

impl Author {
    /// Sender label shown in the message header.
    pub fn label(&self) -> &'static str {
        match self {
            Author::User => "Du",
            Author::System => "NEXUS",
        }
    }

    /// CSS-style class suffix used in the markup rendering.
    pub fn css_class(&self) -> &'static str {
        match self {
            Author::User => "user",
            Author::System => "system",
        }
    }
}

/// A message displayed in the chat log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    author: Author,
    text: String,
    timestamp: DateTime<Local>,
}

impl ChatMessage {
    /// Create a message stamped with the current wall-clock time.
    pub fn new(author: Author, text: impl Into<String>) -> Self {
        Self::at(author, text, Local::now())
    }

    /// Create a message with an explicit timestamp.
    pub fn at(author: Author, text: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            author,
            text: text.into(),
            timestamp,
        }
    }

    pub fn author(&self) -> Author {
        self.author
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Hour and minute, as shown next to the sender.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_author_labels() {
        assert_eq!(Author::User.label(), "Du");
        assert_eq!(Author::System.label(), "NEXUS");
    }

    #[test]
    fn test_time_label_is_hour_minute() {
        let ts = Local.with_ymd_and_hms(2026, 3, 14, 9, 5, 59).unwrap();
        let msg = ChatMessage::at(Author::System, "hi", ts);
        assert_eq!(msg.time_label(), "09:05");
    }

    #[test]
    fn test_ids_display_as_numbers() {
        assert_eq!(ProjectId(42).to_string(), "42");
        assert_eq!(HandoffId::from(7).get(), 7);
    }
}
