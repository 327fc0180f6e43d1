use ratatui::style::{Color, Modifier, Style};

/// Style table for the picker screen, one entry per display role.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub input: Style,
    pub ghost: Style,
    pub item: Style,
    pub selected: Style,
    pub tag: Style,
    pub hint: Style,
}

impl Theme {
    /// Resolves a configured theme name; anything unrecognized falls back
    /// to dark.
    pub fn named(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    fn dark() -> Self {
        Self {
            input: Style::default().fg(Color::Rgb(224, 224, 224)),
            ghost: Style::default().fg(Color::Rgb(96, 96, 96)),
            item: Style::default().fg(Color::Rgb(224, 224, 224)),
            selected: Style::default()
                .fg(Color::Rgb(175, 135, 255))
                .add_modifier(Modifier::BOLD),
            tag: Style::default().fg(Color::Rgb(68, 68, 68)),
            hint: Style::default().fg(Color::DarkGray),
        }
    }

    fn light() -> Self {
        Self {
            input: Style::default().fg(Color::Rgb(40, 40, 40)),
            ghost: Style::default().fg(Color::Rgb(170, 170, 170)),
            item: Style::default().fg(Color::Rgb(40, 40, 40)),
            selected: Style::default()
                .fg(Color::Rgb(95, 0, 175))
                .add_modifier(Modifier::BOLD),
            tag: Style::default().fg(Color::Rgb(150, 150, 150)),
            hint: Style::default().fg(Color::Gray),
        }
    }
}
