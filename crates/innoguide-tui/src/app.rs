use std::path::{Path, PathBuf};
use std::sync::Arc;

use innoguide_core::analysis::AnalysisResult;
use innoguide_core::render::{self, RenderPlan};
use innoguide_core::{
    Analyzer, Config, GeminiClient, InputCollector, PreviewRef, RequestTicket, Session,
    StartError, Technique, UploadedImage, ViewState,
};
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;
use anyhow::anyhow;
use tracing::{info, warn};

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Problem,
    ImagePath,
    Techniques,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
}

/// Modal message; the next key press dismisses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: Focus,
    pub session: Session,

    // Input state
    pub input: InputCollector,
    pub problem_cursor: usize, // cursor position in the problem text (chars)
    pub image_path_input: String,
    pub image_path_cursor: usize,
    pub preview: Option<PreviewRef>,

    // Technique list
    pub technique_state: ListState,

    // Result state
    pub result_scroll: u16,
    pub result_height: u16,
    pub variation_state: ListState,
    pub saved_paths: Vec<PathBuf>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // API key input state
    pub show_api_key_input: bool,
    pub api_key_input: String,
    pub api_key_input_cursor: usize,
    /// Key the current analyzer was built with
    pub api_key: Option<String>,

    pub notice: Option<Notice>,

    // Services
    pub analyzer: Option<Analyzer>,
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub download_dir: PathBuf,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(analyzer: Option<Analyzer>, config: Config, events: UnboundedSender<AppEvent>) -> Self {
        let mut technique_state = ListState::default();
        technique_state.select(Some(0));
        let download_dir = config.download_dir();
        let api_key = analyzer.as_ref().and(config.resolve_api_key());

        Self {
            should_quit: false,
            focus: Focus::Problem,
            session: Session::new(),
            input: InputCollector::new(),
            problem_cursor: 0,
            image_path_input: String::new(),
            image_path_cursor: 0,
            preview: None,
            technique_state,
            result_scroll: 0,
            result_height: 0,
            variation_state: ListState::default(),
            saved_paths: Vec::new(),
            animation_frame: 0,
            show_api_key_input: false,
            api_key_input: String::new(),
            api_key_input_cursor: 0,
            api_key,
            notice: None,
            analyzer,
            config,
            config_path: Config::config_path().ok(),
            download_dir,
            events,
        }
    }

    /// Build the Gemini-backed analyzer for `config`, if a key is available.
    pub fn analyzer_from_config(config: &Config) -> Option<Analyzer> {
        let key = config.resolve_api_key()?;
        Some(Self::analyzer_with_key(config, &key))
    }

    pub fn analyzer_with_key(config: &Config, key: &str) -> Analyzer {
        let client = GeminiClient::with_base_url(key, config.base_url());
        Analyzer::new(Arc::new(client)).with_models(config.text_model(), config.image_model())
    }

    pub fn notify(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            text: text.into(),
        });
    }

    pub fn selected_technique(&self) -> Option<Technique> {
        let all = Technique::all();
        self.technique_state.selected().and_then(|i| all.get(i).copied())
    }

    pub fn technique_nav_down(&mut self) {
        let len = Technique::all().len();
        let i = self.technique_state.selected().map_or(0, |i| (i + 1) % len);
        self.technique_state.select(Some(i));
    }

    pub fn technique_nav_up(&mut self) {
        let len = Technique::all().len();
        let i = self
            .technique_state
            .selected()
            .map_or(0, |i| if i == 0 { len - 1 } else { i - 1 });
        self.technique_state.select(Some(i));
    }

    /// Start an analysis for `technique` with the current input.
    pub fn select_technique(&mut self, technique: Technique) {
        if self.analyzer.is_none() {
            self.open_api_key_input();
            return;
        }
        match self.session.start(technique, &self.input) {
            Ok(ticket) => self.spawn_analysis(ticket),
            Err(err) => self.report_start_error(err),
        }
    }

    pub fn retry(&mut self) {
        match self.session.retry(&self.input) {
            Ok(ticket) => self.spawn_analysis(ticket),
            Err(err) => self.report_start_error(err),
        }
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.result_scroll = 0;
        self.variation_state.select(None);
        self.saved_paths.clear();
    }

    fn report_start_error(&mut self, err: StartError) {
        let kind = match err {
            StartError::Busy => NoticeKind::Info,
            _ => NoticeKind::Warning,
        };
        self.notify(kind, err.to_string());
    }

    fn spawn_analysis(&mut self, ticket: RequestTicket) {
        let Some(analyzer) = self.analyzer.clone() else {
            return;
        };
        self.result_scroll = 0;
        self.saved_paths.clear();
        self.animation_frame = 0;

        let tx = self.events.clone();
        info!(
            generation = ticket.generation,
            technique = ticket.technique.as_str(),
            "dispatching analysis"
        );
        tokio::spawn(async move {
            let outcome = analyzer
                .run_analysis(&ticket.problem, ticket.technique, ticket.image.as_ref())
                .await;
            let _ = tx.send(AppEvent::AnalysisFinished {
                generation: ticket.generation,
                outcome,
            });
        });
    }

    /// Apply a settled request unless it has been superseded.
    pub fn finish_analysis(
        &mut self,
        generation: u64,
        outcome: Result<AnalysisResult, innoguide_core::AnalysisError>,
    ) {
        if !self.session.complete(generation, outcome) {
            return;
        }
        if let Some(AnalysisResult::Images(images)) = self.session.result() {
            self.variation_state
                .select(if images.is_empty() { None } else { Some(0) });
        }
    }

    pub fn tick_animation(&mut self) {
        if self.session.state() == ViewState::Loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Image attachment

    pub async fn attach_image(&mut self, path: &Path) {
        match UploadedImage::from_path(path).await {
            Ok(image) => {
                info!(name = %image.name, bytes = image.bytes.len(), "image attached");
                self.input.set_image(Some(image));
                self.preview = self.input.preview();
                self.image_path_input.clear();
                self.image_path_cursor = 0;
            }
            Err(err) => {
                warn!("could not attach image: {}", err);
                self.notify(NoticeKind::Warning, err.to_string());
            }
        }
    }

    pub fn clear_image(&mut self) {
        self.input.set_image(None);
        self.preview = None;
    }

    /// Preview of the attached image, refreshed if the image changed.
    pub fn current_preview(&mut self) -> Option<&PreviewRef> {
        let stale = match &self.preview {
            Some(preview) => !self.input.is_preview_current(preview),
            None => self.input.image().is_some(),
        };
        if stale {
            self.preview = self.input.preview();
        }
        self.preview.as_ref()
    }

    // Result actions

    pub fn result_plan(&self) -> Option<RenderPlan<'_>> {
        self.session.result().map(RenderPlan::for_result)
    }

    pub fn variation_nav_down(&mut self) {
        if let Some(AnalysisResult::Images(images)) = self.session.result() {
            if images.is_empty() {
                return;
            }
            let i = self.variation_state.selected().map_or(0, |i| (i + 1) % images.len());
            self.variation_state.select(Some(i));
        }
    }

    pub fn variation_nav_up(&mut self) {
        if let Some(AnalysisResult::Images(images)) = self.session.result() {
            if images.is_empty() {
                return;
            }
            let len = images.len();
            let i = self
                .variation_state
                .selected()
                .map_or(0, |i| if i == 0 { len - 1 } else { i - 1 });
            self.variation_state.select(Some(i));
        }
    }

    pub fn download_selected(&mut self) {
        let picked = match self.result_plan() {
            Some(RenderPlan::ImageGrid(images)) => self
                .variation_state
                .selected()
                .and_then(|i| images.get(i).map(|uri| (i, uri.clone()))),
            Some(RenderPlan::SingleImage(uri)) => Some((0, uri.to_string())),
            _ => None,
        };
        let Some((index, uri)) = picked else {
            return;
        };

        match render::save_image(&self.download_dir, &uri, index, render::now_millis()) {
            Ok(path) => {
                self.notify(NoticeKind::Info, format!("Saved {}", path.display()));
                self.saved_paths.push(path);
            }
            Err(err) => self.notify(NoticeKind::Warning, format!("Download failed: {:#}", err)),
        }
    }

    pub fn download_all(&mut self) {
        let uris = match self.result_plan() {
            Some(RenderPlan::ImageGrid(images)) => images.to_vec(),
            Some(RenderPlan::SingleImage(uri)) => vec![uri.to_string()],
            _ => return,
        };

        match render::save_all(&self.download_dir, &uris, render::now_millis()) {
            Ok(paths) => {
                self.notify(
                    NoticeKind::Info,
                    format!("Saved {} image(s) to {}", paths.len(), self.download_dir.display()),
                );
                self.saved_paths.extend(paths);
            }
            Err(err) => self.notify(NoticeKind::Warning, format!("Download failed: {:#}", err)),
        }
    }

    /// Text the copy action puts on the clipboard.
    pub fn copyable_text(&self) -> Option<String> {
        match self.result_plan() {
            Some(RenderPlan::Document(text)) => Some(text.to_string()),
            _ => None,
        }
    }

    pub fn scroll_down(&mut self) {
        self.result_scroll = self.result_scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.result_scroll = self.result_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half = (self.result_height / 2).max(1);
        self.result_scroll = self.result_scroll.saturating_add(half);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half = (self.result_height / 2).max(1);
        self.result_scroll = self.result_scroll.saturating_sub(half);
    }

    // API key popup

    pub fn open_api_key_input(&mut self) {
        self.show_api_key_input = true;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
    }

    /// Use the typed key for this session and remember it for the next one.
    pub fn apply_api_key(&mut self) {
        let key = self.api_key_input.trim().to_string();
        self.show_api_key_input = false;
        self.api_key_input.clear();
        self.api_key_input_cursor = 0;
        if key.is_empty() {
            return;
        }

        // Only the key is written; the in-memory config may carry CLI overrides
        let saved = match &self.config_path {
            Some(path) => Config::save_api_key_to(path, &key),
            None => Err(anyhow!("Could not determine config directory")),
        };
        if let Err(err) = saved {
            warn!("could not save api key: {:#}", err);
            self.notify(NoticeKind::Warning, format!("Key set for this session only: {:#}", err));
        }

        self.analyzer = Some(Self::analyzer_with_key(&self.config, &key));
        self.config.api_key = Some(key.clone());
        self.api_key = Some(key);
        info!("api key updated");
    }
}
