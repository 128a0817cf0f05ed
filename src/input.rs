use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::runtime::Runtime;
use arboard::Clipboard;
use tracing::{debug, warn};
use anyhow::Result;

use crate::backend::ReportBackend;
use crate::controller::PageController;
use crate::models::{Activity, FocusArea, LanguageTab};
use crate::ui::{PaneScroll, UiState};

/// Applies one key press. Returns `Ok(false)` when the app should quit.
pub fn handle_key<B: ReportBackend>(
    key: KeyEvent,
    ui: &mut UiState,
    controller: &PageController<B>,
    rt: &Runtime,
) -> Result<bool> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(false);
    }

    // An alert blocks everything until it is dismissed.
    {
        let mut state = controller.state().lock();
        if state.current_alert().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                state.dismiss_alert();
            }
            return Ok(true);
        }
    }

    match key.code {
        KeyCode::Esc => return Ok(false),
        KeyCode::Tab => ui.focus = ui.focus.next(),
        KeyCode::BackTab => ui.focus = ui.focus.prev(),
        _ => match ui.focus {
            FocusArea::FileInput => handle_file_input(key.code, controller, rt),
            FocusArea::Report => handle_scroll(key.code, &mut ui.report_scroll),
            FocusArea::Results => handle_results(key.code, ui, controller, rt),
            FocusArea::Question => handle_question(key.code, ui, controller, rt),
        },
    }
    Ok(true)
}

fn handle_file_input<B: ReportBackend>(code: KeyCode, controller: &PageController<B>, rt: &Runtime) {
    match code {
        KeyCode::Enter => {
            // disabled while an upload is running
            if controller.is_loading(Activity::Upload) {
                return;
            }
            let c = controller.clone();
            rt.spawn(async move { c.submit_upload().await });
        }
        KeyCode::Backspace => {
            controller.state().lock().file_path.pop();
        }
        KeyCode::Char(ch) => controller.state().lock().file_path.push(ch),
        _ => {}
    }
}

fn handle_scroll(code: KeyCode, scroll: &mut PaneScroll) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => scroll.up(),
        KeyCode::Down | KeyCode::Char('j') => scroll.down(),
        KeyCode::PageUp => (0..10).for_each(|_| scroll.up()),
        KeyCode::PageDown => (0..10).for_each(|_| scroll.down()),
        KeyCode::Home => scroll.reset(),
        _ => {}
    }
}

fn handle_results<B: ReportBackend>(code: KeyCode, ui: &mut UiState, controller: &PageController<B>, rt: &Runtime) {
    match code {
        KeyCode::Left | KeyCode::Char('o') => {
            ui.explanation_scroll.reset();
            let c = controller.clone();
            rt.spawn(async move { c.activate_tab(LanguageTab::Original).await });
        }
        KeyCode::Right | KeyCode::Char('t') => {
            if controller.is_loading(Activity::Translate) {
                return;
            }
            ui.explanation_scroll.reset();
            let c = controller.clone();
            rt.spawn(async move { c.activate_tab(LanguageTab::Translated).await });
        }
        KeyCode::Char('c') => {
            let text = controller.state().lock().view.active_text().to_string();
            if text.is_empty() {
                return;
            }
            match Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
                Ok(()) => debug!("copied explanation to clipboard"),
                Err(e) => warn!(error = %e, "clipboard unavailable"),
            }
        }
        other => handle_scroll(other, &mut ui.explanation_scroll),
    }
}

fn handle_question<B: ReportBackend>(code: KeyCode, ui: &mut UiState, controller: &PageController<B>, rt: &Runtime) {
    match code {
        KeyCode::Enter => {
            if controller.is_loading(Activity::Ask) {
                return;
            }
            let c = controller.clone();
            rt.spawn(async move { c.submit_question().await });
        }
        KeyCode::Backspace => {
            controller.state().lock().question_input.pop();
        }
        KeyCode::Up => ui.history_scroll.scroll_up(),
        KeyCode::Down => ui.history_scroll.scroll_down(),
        KeyCode::PageUp => ui.history_scroll.scroll_page_up(),
        KeyCode::PageDown => ui.history_scroll.scroll_page_down(),
        KeyCode::Char(ch) => controller.state().lock().question_input.push(ch),
        _ => {}
    }
}
