use std::collections::VecDeque;
use chrono::{DateTime, Local};

/// Placeholder question used when an answer arrives with no pending pair.
pub const UNKNOWN_QUESTION: &str = "Unknown question";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FocusArea {
    FileInput,
    /// The extracted original report text.
    Report,
    /// The explanation tabs.
    Results,
    Question,
}

impl FocusArea {
    pub fn next(self) -> Self {
        match self {
            FocusArea::FileInput => FocusArea::Report,
            FocusArea::Report => FocusArea::Results,
            FocusArea::Results => FocusArea::Question,
            FocusArea::Question => FocusArea::FileInput,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusArea::FileInput => FocusArea::Question,
            FocusArea::Report => FocusArea::FileInput,
            FocusArea::Results => FocusArea::Report,
            FocusArea::Question => FocusArea::Results,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LanguageTab {
    #[default]
    Original,
    Translated,
}

impl LanguageTab {
    pub fn as_index(self) -> usize {
        match self {
            LanguageTab::Original => 0,
            LanguageTab::Translated => 1,
        }
    }
}

/// The three request flows. Each one has its own loading flag.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Activity {
    Upload,
    Translate,
    Ask,
}

#[derive(Default, Debug, Clone, Copy)]
pub struct LoadingFlags {
    pub upload: bool,
    pub translate: bool,
    pub ask: bool,
}

impl LoadingFlags {
    pub fn get(&self, activity: Activity) -> bool {
        match activity {
            Activity::Upload => self.upload,
            Activity::Translate => self.translate,
            Activity::Ask => self.ask,
        }
    }

    pub fn set(&mut self, activity: Activity, on: bool) {
        match activity {
            Activity::Upload => self.upload = on,
            Activity::Translate => self.translate = on,
            Activity::Ask => self.ask = on,
        }
    }
}

/// What the results region shows for the current report.
#[derive(Default, Debug, Clone)]
pub struct ReportView {
    pub report_text: String,
    pub explanation: String,
    /// Present once a translation succeeded for the current explanation.
    pub translated: Option<String>,
    pub active_tab: LanguageTab,
    pub results_visible: bool,
}

impl ReportView {
    /// Hides the results and drops the translation. Report and explanation
    /// text stay until the next successful upload replaces them.
    pub fn reset_for_new_upload(&mut self) {
        self.translated = None;
        self.active_tab = LanguageTab::Original;
        self.results_visible = false;
    }

    pub fn complete_upload(&mut self, original: String, explanation: String) {
        self.report_text = original;
        self.explanation = explanation;
        self.active_tab = LanguageTab::Original;
        self.results_visible = true;
    }

    pub fn complete_translation(&mut self, text: String) {
        self.translated = Some(text);
        self.active_tab = LanguageTab::Translated;
    }

    pub fn set_active_tab(&mut self, tab: LanguageTab) {
        self.active_tab = tab;
    }

    pub fn is_translated(&self) -> bool {
        self.translated.is_some()
    }

    /// Text of whichever tab is active.
    pub fn active_text(&self) -> &str {
        match self.active_tab {
            LanguageTab::Original => &self.explanation,
            LanguageTab::Translated => self.translated.as_deref().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QaPair {
    pub question: String,
    pub answer: Option<String>,
    pub asked_at: DateTime<Local>,
}

impl QaPair {
    pub fn is_complete(&self) -> bool {
        self.answer.is_some()
    }
}

/// Ordered question/answer history for one report session.
///
/// Only the last pair can be pending. `revision` bumps on every change so
/// the view knows when to scroll to the bottom.
#[derive(Default, Debug, Clone)]
pub struct QaHistory {
    pairs: Vec<QaPair>,
    revision: u64,
}

impl QaHistory {
    pub fn pairs(&self) -> &[QaPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_pending(&self) -> bool {
        self.pairs.last().is_some_and(|p| !p.is_complete())
    }

    /// Starts a new pending pair, or overwrites the question of the pending
    /// last pair if there is one.
    pub fn append_pending(&mut self, question: impl Into<String>) {
        let question = question.into();
        match self.pairs.last_mut() {
            Some(last) if !last.is_complete() => {
                last.question = question;
                last.asked_at = Local::now();
            }
            _ => self.pairs.push(QaPair {
                question,
                answer: None,
                asked_at: Local::now(),
            }),
        }
        self.revision += 1;
    }

    /// Answers the pending last pair. With nothing pending a complete pair
    /// is appended under [`UNKNOWN_QUESTION`].
    pub fn complete_last(&mut self, answer: impl Into<String>) {
        let answer = answer.into();
        match self.pairs.last_mut() {
            Some(last) if !last.is_complete() => last.answer = Some(answer),
            _ => self.pairs.push(QaPair {
                question: UNKNOWN_QUESTION.to_string(),
                answer: Some(answer),
                asked_at: Local::now(),
            }),
        }
        self.revision += 1;
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
        self.revision += 1;
    }
}

/// Everything the page shows, shared between the controller and the renderer.
#[derive(Debug)]
pub struct PageState {
    pub file_path: String,
    pub question_input: String,
    pub view: ReportView,
    pub history: QaHistory,
    pub loading: LoadingFlags,
    pub alerts: VecDeque<String>,
    /// Bumped on every upload submission; stale translate/ask results are dropped.
    pub session: u64,
    pub target_language: String,
}

impl PageState {
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            file_path: String::new(),
            question_input: String::new(),
            view: ReportView::default(),
            history: QaHistory::default(),
            loading: LoadingFlags::default(),
            alerts: VecDeque::new(),
            session: 0,
            target_language: target_language.into(),
        }
    }

    pub fn alert(&mut self, message: impl Into<String>) {
        self.alerts.push_back(message.into());
    }

    pub fn current_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }

    /// Starts a new report session: translation and history go together.
    pub fn reset_for_new_upload(&mut self) {
        self.view.reset_for_new_upload();
        self.history.clear();
        self.session += 1;
    }
}
