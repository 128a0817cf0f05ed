use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::backend::{ApiError, ReportBackend};
use crate::models::{Activity, LanguageTab, PageState};
use crate::utils::expand_path;

/// Clears an activity's loading flag when dropped, whatever path the flow took.
struct LoadingGuard {
    state: Arc<Mutex<PageState>>,
    activity: Activity,
}

impl LoadingGuard {
    /// Sets the flag on an already locked state. Returns `None` if the
    /// activity is already running.
    fn acquire(shared: &Arc<Mutex<PageState>>, state: &mut PageState, activity: Activity) -> Option<Self> {
        if state.loading.get(activity) {
            return None;
        }
        state.loading.set(activity, true);
        Some(Self { state: Arc::clone(shared), activity })
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.state.lock().loading.set(self.activity, false);
    }
}

/// Runs the upload, translate, tab and Q&A flows. Each flow validates under
/// the state lock, releases it for the request and re-locks to apply the result.
pub struct PageController<B> {
    state: Arc<Mutex<PageState>>,
    backend: Arc<B>,
}

impl<B> Clone for PageController<B> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: ReportBackend> PageController<B> {
    pub fn new(backend: B, state: PageState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            backend: Arc::new(backend),
        }
    }

    pub fn state(&self) -> &Arc<Mutex<PageState>> {
        &self.state
    }

    pub fn is_loading(&self, activity: Activity) -> bool {
        self.state.lock().loading.get(activity)
    }

    /// Uploads the file named in the form and shows the explanation.
    pub async fn submit_upload(&self) {
        let (path, _guard) = {
            let mut state = self.state.lock();
            let raw = state.file_path.trim().to_string();
            if raw.is_empty() {
                state.alert("Please select a medical report image");
                return;
            }
            let path: PathBuf = expand_path(&raw);
            if !path.is_file() {
                state.alert(format!("File not found: {}", path.display()));
                return;
            }
            let Some(guard) = LoadingGuard::acquire(&self.state, &mut state, Activity::Upload) else {
                return;
            };
            state.reset_for_new_upload();
            (path, guard)
        };

        info!(file = %path.display(), "submitting report");
        let result = self.backend.upload(&path).await;

        let mut state = self.state.lock();
        match result {
            Ok(upload) => {
                info!(explanation_len = upload.explanation.len(), "report processed");
                state.view.complete_upload(upload.original_content, upload.explanation);
            }
            Err(err) => {
                warn!(error = %err, "upload failed");
                state.alert(failure_message(&err, "Processing failed", "Request Failed"));
            }
        }
    }

    /// Handles a tab activation. The translated tab only becomes active once
    /// a translation exists.
    pub async fn activate_tab(&self, tab: LanguageTab) {
        {
            let mut state = self.state.lock();
            if tab == LanguageTab::Original || state.view.is_translated() {
                state.view.set_active_tab(tab);
                return;
            }
        }
        self.translate_explanation().await;
    }

    async fn translate_explanation(&self) {
        let (text, language, session, _guard) = {
            let mut state = self.state.lock();
            if state.view.explanation.is_empty() {
                state.alert("No explanation content to translate");
                return;
            }
            let Some(guard) = LoadingGuard::acquire(&self.state, &mut state, Activity::Translate) else {
                return;
            };
            (state.view.explanation.clone(), state.target_language.clone(), state.session, guard)
        };

        info!(%language, "translating explanation");
        let result = self.backend.translate(&text, &language).await;

        let mut state = self.state.lock();
        if state.session != session {
            info!("discarding translation for a previous report");
            return;
        }
        match result {
            Ok(translated) => state.view.complete_translation(translated),
            Err(err) => {
                warn!(error = %err, "translation failed");
                state.alert(failure_message(&err, "Translation failed", "Translation Request Failed"));
                state.view.set_active_tab(LanguageTab::Original);
            }
        }
    }

    /// Sends the typed question. Failures are recorded in the history as the
    /// answer so no question is dropped.
    pub async fn submit_question(&self) {
        let (question, report, session, _guard) = {
            let mut state = self.state.lock();
            let question = state.question_input.trim().to_string();
            if question.is_empty() {
                state.alert("Please enter a question");
                return;
            }
            if state.view.report_text.is_empty() {
                state.alert("Please upload a medical report first");
                return;
            }
            let Some(guard) = LoadingGuard::acquire(&self.state, &mut state, Activity::Ask) else {
                return;
            };
            state.history.append_pending(question.clone());
            state.question_input.clear();
            (question, state.view.report_text.clone(), state.session, guard)
        };

        info!(question_len = question.len(), "asking question");
        let result = self.backend.ask(&report, &question).await;

        let mut state = self.state.lock();
        if state.session != session {
            info!("discarding answer for a previous report");
            return;
        }
        match result {
            Ok(answer) => state.history.complete_last(answer),
            Err(err) => {
                warn!(error = %err, "question failed");
                state.history.complete_last(format!("Error: {err}"));
            }
        }
    }
}

fn failure_message(err: &ApiError, rejected: &str, transport: &str) -> String {
    if err.is_rejection() {
        format!("{rejected}: {err}")
    } else {
        format!("{transport}: {err}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::UploadResult;
    use crate::backend::testing::{Call, FakeBackend, Failure};
    use std::path::Path;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn report_file() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG fake").unwrap();
        file
    }

    fn controller(backend: FakeBackend) -> PageController<FakeBackend> {
        PageController::new(backend, PageState::new("Chinese"))
    }

    async fn uploaded(backend: FakeBackend, explanation: &str, original: &str) -> (PageController<FakeBackend>, NamedTempFile) {
        backend.upload_ok(explanation, original);
        let page = controller(backend);
        let file = report_file();
        page.state().lock().file_path = file.path().display().to_string();
        page.submit_upload().await;
        (page, file)
    }

    async fn ask(page: &PageController<FakeBackend>, question: &str) {
        page.state().lock().question_input = question.to_string();
        page.submit_question().await;
    }

    #[tokio::test]
    async fn upload_without_file_alerts_and_sends_nothing() {
        let page = controller(FakeBackend::new());
        page.submit_upload().await;

        let state = page.state().lock();
        assert_eq!(state.current_alert(), Some("Please select a medical report image"));
        assert!(!state.loading.upload);
        drop(state);
        assert!(page.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn upload_of_missing_path_is_a_validation_error() {
        let page = controller(FakeBackend::new());
        page.state().lock().file_path = "/no/such/report.png".into();
        page.submit_upload().await;

        assert!(page.state().lock().current_alert().unwrap().starts_with("File not found"));
        assert!(page.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn successful_upload_shows_original_tab_with_content() {
        let (page, _file) = uploaded(FakeBackend::new(), "E", "O").await;

        let state = page.state().lock();
        assert!(state.view.results_visible);
        assert_eq!(state.view.report_text, "O");
        assert_eq!(state.view.explanation, "E");
        assert_eq!(state.view.active_tab, LanguageTab::Original);
        assert!(state.view.translated.is_none());
        assert!(state.alerts.is_empty());
        assert!(!state.loading.upload);
    }

    #[tokio::test]
    async fn rejected_upload_alerts_and_keeps_results_hidden() {
        let backend = FakeBackend::new();
        backend.upload_err(Failure::Rejected("bad image".into()));
        let page = controller(backend);
        let file = report_file();
        page.state().lock().file_path = file.path().display().to_string();
        page.submit_upload().await;

        let state = page.state().lock();
        assert_eq!(state.current_alert(), Some("Processing failed: bad image"));
        assert!(!state.view.results_visible);
        assert!(!state.loading.upload);
    }

    #[tokio::test]
    async fn transport_failure_on_upload_uses_request_failed_prefix() {
        let backend = FakeBackend::new();
        backend.upload_err(Failure::Transport("<html>502 Bad Gateway</html>".into()));
        let page = controller(backend);
        let file = report_file();
        page.state().lock().file_path = file.path().display().to_string();
        page.submit_upload().await;

        let state = page.state().lock();
        assert_eq!(
            state.current_alert(),
            Some("Request Failed: invalid response body: expected value at line 1 column 1")
        );
        assert!(!state.view.results_visible);
        assert!(!state.loading.upload);
    }

    #[tokio::test]
    async fn first_translated_activation_translates_once() {
        let backend = FakeBackend::new();
        backend.text_ok("T");
        let (page, _file) = uploaded(backend, "E", "O").await;

        page.activate_tab(LanguageTab::Translated).await;
        {
            let state = page.state().lock();
            assert_eq!(state.view.active_tab, LanguageTab::Translated);
            assert_eq!(state.view.translated.as_deref(), Some("T"));
            assert!(!state.loading.translate);
        }

        page.activate_tab(LanguageTab::Original).await;
        page.activate_tab(LanguageTab::Translated).await;

        let translations = page.backend.count(|c| matches!(c, Call::Translate { .. }));
        assert_eq!(translations, 1);
        assert_eq!(
            page.backend.calls()[1],
            Call::Translate { text: "E".into(), language: "Chinese".into() }
        );
        assert_eq!(page.state().lock().view.active_tab, LanguageTab::Translated);
    }

    #[tokio::test]
    async fn failed_translation_leaves_original_active() {
        let backend = FakeBackend::new();
        backend.rejected("model offline");
        let (page, _file) = uploaded(backend, "E", "O").await;

        page.activate_tab(LanguageTab::Translated).await;

        let state = page.state().lock();
        assert_eq!(state.view.active_tab, LanguageTab::Original);
        assert!(!state.view.is_translated());
        assert_eq!(state.current_alert(), Some("Translation failed: model offline"));
        assert!(!state.loading.translate);
    }

    #[tokio::test]
    async fn translation_transport_failure_message() {
        let backend = FakeBackend::new();
        backend.text_err(Failure::Transport("<html>504 Gateway Timeout</html>".into()));
        let (page, _file) = uploaded(backend, "E", "O").await;

        page.activate_tab(LanguageTab::Translated).await;

        let state = page.state().lock();
        assert!(state.current_alert().unwrap().starts_with("Translation Request Failed: invalid response body"));
        assert_eq!(state.view.active_tab, LanguageTab::Original);
    }

    #[tokio::test]
    async fn translating_without_explanation_alerts() {
        let page = controller(FakeBackend::new());
        page.activate_tab(LanguageTab::Translated).await;

        assert_eq!(page.state().lock().current_alert(), Some("No explanation content to translate"));
        assert!(page.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn original_tab_never_calls_the_backend() {
        let page = controller(FakeBackend::new());
        page.activate_tab(LanguageTab::Original).await;
        assert!(page.backend.calls().is_empty());
        assert!(page.state().lock().alerts.is_empty());
    }

    #[tokio::test]
    async fn question_without_upload_sends_nothing() {
        let page = controller(FakeBackend::new());
        ask(&page, "What is X?").await;

        let state = page.state().lock();
        assert_eq!(state.current_alert(), Some("Please upload a medical report first"));
        assert!(state.history.is_empty());
        drop(state);
        assert!(page.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn blank_question_is_rejected() {
        let (page, _file) = uploaded(FakeBackend::new(), "E", "O").await;
        ask(&page, "   ").await;

        assert_eq!(page.state().lock().current_alert(), Some("Please enter a question"));
        assert_eq!(page.backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn answered_question_completes_one_pair() {
        let backend = FakeBackend::new();
        backend.text_ok("A");
        let (page, _file) = uploaded(backend, "E", "O").await;

        ask(&page, "What is X?").await;

        let state = page.state().lock();
        assert_eq!(state.history.len(), 1);
        let pair = &state.history.pairs()[0];
        assert_eq!(pair.question, "What is X?");
        assert_eq!(pair.answer.as_deref(), Some("A"));
        assert!(state.question_input.is_empty());
        assert!(!state.loading.ask);
        drop(state);
        assert_eq!(
            page.backend.calls()[1],
            Call::Ask { report_content: "O".into(), question: "What is X?".into() }
        );
    }

    #[tokio::test]
    async fn sequential_questions_keep_submission_order() {
        let backend = FakeBackend::new();
        backend.text_ok("a1").text_ok("a2").text_ok("a3");
        let (page, _file) = uploaded(backend, "E", "O").await;

        for q in ["q1", "q2", "q3"] {
            ask(&page, q).await;
        }

        let state = page.state().lock();
        let pairs: Vec<(&str, Option<&str>)> = state
            .history
            .pairs()
            .iter()
            .map(|p| (p.question.as_str(), p.answer.as_deref()))
            .collect();
        assert_eq!(pairs, vec![("q1", Some("a1")), ("q2", Some("a2")), ("q3", Some("a3"))]);
    }

    #[tokio::test]
    async fn failed_answer_is_recorded_in_history() {
        let backend = FakeBackend::new();
        backend.rejected("no context").text_err(Failure::Transport("<html>bad gateway</html>".into()));
        let (page, _file) = uploaded(backend, "E", "O").await;

        ask(&page, "q1").await;
        ask(&page, "q2").await;

        let state = page.state().lock();
        assert_eq!(state.history.pairs()[0].answer.as_deref(), Some("Error: no context"));
        assert!(state.history.pairs()[1].answer.as_deref().unwrap().starts_with("Error: invalid response body"));
        assert!(state.alerts.is_empty());
        assert!(!state.loading.ask);
    }

    #[tokio::test]
    async fn new_upload_resets_history_and_translation() {
        let backend = FakeBackend::new();
        backend.text_ok("T").text_ok("A");
        let (page, file) = uploaded(backend, "E", "O").await;
        page.backend.upload_ok("E2", "O2");
        page.activate_tab(LanguageTab::Translated).await;
        ask(&page, "q").await;

        page.state().lock().file_path = file.path().display().to_string();
        page.submit_upload().await;

        let state = page.state().lock();
        assert!(state.history.is_empty());
        assert!(!state.view.is_translated());
        assert_eq!(state.view.active_tab, LanguageTab::Original);
        assert_eq!(state.view.report_text, "O2");
        assert_eq!(state.view.explanation, "E2");
    }

    #[tokio::test]
    async fn busy_activity_is_not_started_twice() {
        let (page, _file) = uploaded(FakeBackend::new(), "E", "O").await;
        page.state().lock().loading.set(Activity::Ask, true);

        ask(&page, "q").await;

        let state = page.state().lock();
        assert!(state.history.is_empty());
        assert_eq!(state.question_input, "q");
        drop(state);
        assert_eq!(page.backend.calls().len(), 1);
    }

    /// Starts a new report session while a request is in flight.
    #[derive(Default)]
    struct SessionSwitchingBackend {
        state: std::sync::OnceLock<Arc<Mutex<PageState>>>,
    }

    impl SessionSwitchingBackend {
        fn switch_session(&self) {
            if let Some(state) = self.state.get() {
                state.lock().reset_for_new_upload();
            }
        }
    }

    impl ReportBackend for SessionSwitchingBackend {
        async fn upload(&self, _file: &Path) -> Result<UploadResult, ApiError> {
            Err(ApiError::Rejected("unused".into()))
        }

        async fn translate(&self, _text: &str, _language: &str) -> Result<String, ApiError> {
            self.switch_session();
            Ok("late translation".into())
        }

        async fn ask(&self, _report_content: &str, _question: &str) -> Result<String, ApiError> {
            self.switch_session();
            Ok("late answer".into())
        }
    }

    fn switching_controller() -> PageController<SessionSwitchingBackend> {
        let page = PageController::new(SessionSwitchingBackend::default(), PageState::new("Chinese"));
        let _ = page.backend.state.set(Arc::clone(page.state()));
        page.state().lock().view.complete_upload("O".into(), "E".into());
        page
    }

    #[tokio::test]
    async fn answer_for_previous_session_is_dropped() {
        let page = switching_controller();
        page.state().lock().question_input = "q".into();
        page.submit_question().await;

        let state = page.state().lock();
        assert!(state.history.is_empty());
        assert!(!state.loading.ask);
    }

    #[tokio::test]
    async fn translation_for_previous_session_is_dropped() {
        let page = switching_controller();
        page.activate_tab(LanguageTab::Translated).await;

        let state = page.state().lock();
        assert!(!state.view.is_translated());
        assert_eq!(state.view.active_tab, LanguageTab::Original);
        assert!(!state.loading.translate);
    }

    #[test]
    fn guard_releases_flag_on_drop() {
        let shared = Arc::new(Mutex::new(PageState::new("Chinese")));
        let guard = {
            let mut state = shared.lock();
            let guard = LoadingGuard::acquire(&shared, &mut state, Activity::Translate);
            assert!(guard.is_some());
            assert!(LoadingGuard::acquire(&shared, &mut state, Activity::Translate).is_none());
            guard
        };
        assert!(shared.lock().loading.translate);
        drop(guard);
        assert!(!shared.lock().loading.translate);
    }
}
