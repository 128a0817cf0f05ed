use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    layout::{Constraint, Direction, Layout, Size},
    text::{Line, Span},
    symbols,
};
use tui_scrollview::{ScrollView, ScrollViewState};

use crate::models::{FocusArea, PageState, QaPair};
use crate::theme::Theme;
use crate::utils::{calculate_max_scroll, file_status_label};

/// Scroll offset of a wrapped text pane. `max` is measured at each draw.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneScroll {
    pub offset: u16,
    pub max: u16,
}

impl PaneScroll {
    pub fn up(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.offset < self.max {
            self.offset += 1;
        }
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    fn fit(&mut self, max: u16) {
        self.max = max;
        self.offset = self.offset.min(max);
    }
}

/// TUI-local state (not shared with the controller).
pub struct UiState {
    pub focus: FocusArea,
    pub report_scroll: PaneScroll,
    pub explanation_scroll: PaneScroll,
    pub history_scroll: ScrollViewState,
    seen_history_revision: u64,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: FocusArea::FileInput,
            report_scroll: PaneScroll::default(),
            explanation_scroll: PaneScroll::default(),
            history_scroll: ScrollViewState::default(),
            seen_history_revision: 0,
        }
    }
}

/// Renders the whole page: form, results, Q&A, footer and any alert.
pub fn render_page(f: &mut Frame, state: &PageState, ui: &mut UiState, theme: &Theme) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // upload form
            Constraint::Min(8),         // results
            Constraint::Percentage(35), // Q&A
            Constraint::Length(3),      // footer
        ])
        .split(area);

    render_upload_form(f, chunks[0], state, ui, theme);
    render_results(f, chunks[1], state, ui, theme);
    render_qa(f, chunks[2], state, ui, theme);

    let footer = Paragraph::new(
        "Tab/Shift+Tab Focus | Enter Upload/Ask | ←/→ or o/t Original/Translated | ↑/↓ PgUp/PgDn Scroll | c Copy | Esc Quit",
    )
    .block(Block::default().borders(Borders::ALL))
    .style(theme.footer);
    f.render_widget(footer, chunks[3]);

    if let Some(message) = state.current_alert() {
        render_alert(f, message, theme);
    }
}

fn input_line<'a>(value: &'a str, placeholder: &'a str, focused: bool, theme: &Theme) -> Line<'a> {
    let mut spans = if value.is_empty() && !focused {
        vec![Span::styled(placeholder, theme.input_placeholder)]
    } else {
        vec![Span::styled(value, theme.input)]
    };
    if focused {
        spans.push(Span::styled("█", theme.input));
    }
    Line::from(spans)
}

fn render_upload_form(f: &mut Frame, area: Rect, state: &PageState, ui: &UiState, theme: &Theme) {
    let focused = ui.focus == FocusArea::FileInput;
    let mut title = vec![Span::raw("Report image ")];
    if state.loading.upload {
        title.push(Span::styled("[Processing report...]", theme.loading));
    } else {
        title.push(Span::styled(format!("[{}]", file_status_label(&state.file_path)), theme.file_status));
    }
    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .style(theme.border(focused));
    let line = input_line(&state.file_path, "Path to a report image, Enter to upload", focused, theme);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn render_results(f: &mut Frame, area: Rect, state: &PageState, ui: &mut UiState, theme: &Theme) {
    let focused = ui.focus == FocusArea::Results;
    if !state.view.results_visible {
        ui.report_scroll = PaneScroll::default();
        ui.explanation_scroll = PaneScroll::default();
        let text = if state.loading.upload {
            "Processing report, please wait..."
        } else {
            "Upload a medical report image to see its explanation."
        };
        let placeholder = Paragraph::new(text)
            .block(Block::default().title("Results").borders(Borders::ALL).style(theme.border(focused)))
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.text_secondary));
        f.render_widget(placeholder, area);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let report_block = Block::default()
        .title("Original report")
        .borders(Borders::ALL)
        .style(theme.border(ui.focus == FocusArea::Report));
    let report_area = report_block.inner(columns[0]);
    ui.report_scroll.fit(calculate_max_scroll(&state.view.report_text, report_area.width, report_area.height));
    let original = Paragraph::new(state.view.report_text.as_str())
        .block(report_block)
        .wrap(Wrap { trim: false })
        .scroll((ui.report_scroll.offset, 0))
        .style(Style::default().fg(theme.text));
    f.render_widget(original, columns[0]);

    let explanation_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(columns[1]);

    let mut tabs_title = vec![Span::raw("Explanation")];
    if state.loading.translate {
        tabs_title.push(Span::styled(" [Translating...]", theme.loading));
    }
    let tabs = Tabs::new(vec!["Original".to_string(), state.target_language.clone()])
        .block(Block::default().title(Line::from(tabs_title)).borders(Borders::ALL).style(theme.border(focused)))
        .style(theme.tab)
        .highlight_style(theme.tab_active)
        .select(state.view.active_tab.as_index())
        .divider(symbols::DOT)
        .padding(" ", " ");
    f.render_widget(tabs, explanation_chunks[0]);

    let content_block = Block::default().borders(Borders::ALL).style(theme.border(focused));
    let content_area = content_block.inner(explanation_chunks[1]);
    ui.explanation_scroll.fit(calculate_max_scroll(state.view.active_text(), content_area.width, content_area.height));
    let content = Paragraph::new(state.view.active_text())
        .block(content_block)
        .wrap(Wrap { trim: false })
        .scroll((ui.explanation_scroll.offset, 0))
        .style(Style::default().fg(theme.text));
    f.render_widget(content, explanation_chunks[1]);
}

fn pair_lines<'a>(pair: &'a QaPair, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![Line::from(vec![
        Span::styled(pair.asked_at.format("%H:%M ").to_string(), theme.timestamp),
        Span::styled("Q: ", theme.question),
        Span::styled(pair.question.as_str(), theme.question),
    ])];
    match pair.answer.as_deref() {
        Some(answer) => {
            let style = if answer.starts_with("Error: ") { theme.answer_error } else { theme.answer };
            lines.extend(answer.lines().map(|l| Line::from(Span::styled(l, style))));
        }
        None => lines.push(Line::from(Span::styled("Waiting for answer...", theme.pending))),
    }
    lines.push(Line::default());
    lines
}

fn render_qa(f: &mut Frame, area: Rect, state: &PageState, ui: &mut UiState, theme: &Theme) {
    let focused = ui.focus == FocusArea::Question;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let history_block = Block::default().title(format!("Questions & answers ({})", state.history.len())).borders(Borders::ALL).style(theme.border(focused));
    let inner = history_block.inner(chunks[0]);
    f.render_widget(history_block, chunks[0]);

    if state.history.revision() != ui.seen_history_revision {
        ui.seen_history_revision = state.history.revision();
        ui.history_scroll.scroll_to_bottom();
    }

    if state.history.is_empty() {
        let hint = Paragraph::new("Ask a question about the uploaded report below.")
            .style(Style::default().fg(theme.text_secondary));
        f.render_widget(hint, inner);
    } else {
        // one column is kept for the scrollbar
        let width = inner.width.saturating_sub(1);
        let lines: Vec<Line> = state.history.pairs().iter().flat_map(|p| pair_lines(p, theme)).collect();
        let history = Paragraph::new(lines).wrap(Wrap { trim: false });
        let height = u16::try_from(history.line_count(width)).unwrap_or(u16::MAX);
        let mut scroll_view = ScrollView::new(Size::new(width, height));
        scroll_view.render_widget(history, Rect::new(0, 0, width, height));
        f.render_stateful_widget(scroll_view, inner, &mut ui.history_scroll);
    }

    let mut title = vec![Span::raw("Question")];
    if state.loading.ask {
        title.push(Span::styled(" [Thinking...]", theme.loading));
    }
    let input = Paragraph::new(input_line(&state.question_input, "Type a question, Enter to ask", focused, theme))
        .block(Block::default().title(Line::from(title)).borders(Borders::ALL).style(theme.border(focused)));
    f.render_widget(input, chunks[1]);
}

fn render_alert(f: &mut Frame, message: &str, theme: &Theme) {
    let popup_area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, popup_area);
    let para = Paragraph::new(message)
        .block(Block::default().title("Alert").title_bottom("Enter/Esc to dismiss").borders(Borders::ALL).style(theme.popup_border))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Left)
        .style(theme.popup_text);
    f.render_widget(para, popup_area);
}

/// Centers a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default().direction(Direction::Vertical)
        .constraints([Constraint::Percentage((100-percent_y)/2), Constraint::Percentage(percent_y), Constraint::Percentage((100-percent_y)/2)]).split(r)[1];
    Layout::default().direction(Direction::Horizontal)
        .constraints([Constraint::Percentage((100-percent_x)/2), Constraint::Percentage(percent_x), Constraint::Percentage((100-percent_x)/2)]).split(vertical)[1]
}
