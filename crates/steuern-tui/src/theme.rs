//! Color palette for the panel.

use ratatui::style::{Color, Modifier, Style};

use steuern_core::Author;

/// Colors used by the panel widgets.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    /// Headers and focused borders
    pub header: Color,
    /// Hotkey hints
    pub hotkey: Color,
    /// Normal text
    pub text: Color,
    /// Secondary text (timestamps, placeholders)
    pub text_dim: Color,
    /// Unfocused borders
    pub border_dim: Color,
    /// Messages written by the user
    pub author_user: Color,
    /// Messages written by the panel
    pub author_system: Color,
    /// Status: success
    pub status_healthy: Color,
    /// Status: in progress
    pub status_warning: Color,
    /// Status: failure
    pub status_error: Color,
}

/// Complete theme definition.
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: ThemeColors,
}

impl Theme {
    /// The default dark-terminal palette.
    pub fn default_theme() -> Self {
        Self {
            colors: ThemeColors {
                header: Color::Cyan,
                hotkey: Color::Yellow,
                text: Color::White,
                text_dim: Color::Gray,
                border_dim: Color::DarkGray,
                author_user: Color::LightBlue,
                author_system: Color::LightMagenta,
                status_healthy: Color::Green,
                status_warning: Color::Yellow,
                status_error: Color::Red,
            },
        }
    }

    pub fn header(&self) -> Style {
        Style::default()
            .fg(self.colors.header)
            .add_modifier(Modifier::BOLD)
    }

    pub fn hotkey(&self) -> Style {
        Style::default()
            .fg(self.colors.hotkey)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.colors.text)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.colors.text_dim)
    }

    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.colors.header)
        } else {
            Style::default().fg(self.colors.border_dim)
        }
    }

    /// Style for a message header by author.
    pub fn author(&self, author: Author) -> Style {
        let color = match author {
            Author::User => self.colors.author_user,
            Author::System => self.colors.author_system,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn success(&self) -> Style {
        Style::default().fg(self.colors.status_healthy)
    }

    pub fn busy(&self) -> Style {
        Style::default()
            .fg(self.colors.status_warning)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.colors.status_error)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}
