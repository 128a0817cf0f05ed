use ratatui::style::{Color, Modifier, Style};

pub struct Theme {
    pub focus_border: Color,
    pub blurred_border: Color,
    pub text: Color,
    pub text_secondary: Color,

    // Specific components
    pub input: Style,
    pub input_placeholder: Style,
    pub file_status: Style,
    pub loading: Style,
    pub tab: Style,
    pub tab_active: Style,
    pub question: Style,
    pub answer: Style,
    pub answer_error: Style,
    pub pending: Style,
    pub timestamp: Style,
    pub footer: Style,
    pub popup_border: Style,
    pub popup_text: Style,
}

impl Theme {
    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.focus_border).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.blurred_border)
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            focus_border: Color::Cyan,
            blurred_border: Color::DarkGray,
            text: Color::White,
            text_secondary: Color::Gray,

            input: Style::default().fg(Color::White),
            input_placeholder: Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            file_status: Style::default().fg(Color::Green),
            loading: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            tab: Style::default().fg(Color::White),
            tab_active: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            question: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            answer: Style::default().fg(Color::White),
            answer_error: Style::default().fg(Color::Red),
            pending: Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            timestamp: Style::default().fg(Color::Magenta),
            footer: Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            popup_border: Style::default().fg(Color::Red).bg(Color::Black),
            popup_text: Style::default().fg(Color::White),
        }
    }
}
