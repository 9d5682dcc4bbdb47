//! Handoff (Übergabe) list, viewer and upload status.
//!
//! The list is rebuilt from the backend fragment on every load; items are the
//! elements carrying a `data-uebergabe-id` attribute. The panel never
//! constructs items itself, it only removes one after a confirmed delete.

use steuern_core::{HandoffId, TrustedFragment};

/// Shown when the list holds no items.
pub const EMPTY_PLACEHOLDER: &str = "Noch keine Übergaben vorhanden.";

const ITEM_ATTRIBUTE: &str = "data-uebergabe-id";

/// One listed handoff document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffItem {
    pub id: HandoffId,
    /// First text line of the item markup
    pub title: String,
    /// Remaining text lines, joined
    pub detail: String,
}

impl HandoffItem {
    fn from_markup(id: u64, html: &str) -> Self {
        let text = TrustedFragment::from_server(html).to_text();
        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
        let title = lines
            .next()
            .map_or_else(|| format!("Übergabe {id}"), str::to_string);
        let detail = lines.collect::<Vec<_>>().join(" · ");
        Self {
            id: HandoffId(id),
            title,
            detail,
        }
    }
}

/// Load state of the list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed(String),
}

/// State of the single-document viewer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetailState {
    #[default]
    Empty,
    Loading(HandoffId),
    Loaded(HandoffId, TrustedFragment),
    Failed(HandoffId, String),
}

/// Status line of the upload area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// Upload of the named file is running
    InProgress(String),
    /// Upload finished; the list reloads shortly
    Done(String),
    /// Server or transport error, shown verbatim
    Failed(String),
}

impl UploadStatus {
    /// Text shown in the upload area.
    pub fn message(&self) -> String {
        match self {
            UploadStatus::InProgress(name) => format!("Lade {name} hoch..."),
            UploadStatus::Done(name) => format!("✓ {name} hochgeladen"),
            UploadStatus::Failed(error) => format!("✗ {error}"),
        }
    }
}

/// Everything the handoff modals display.
#[derive(Debug, Clone, Default)]
pub struct HandoffPanel {
    list: ListState,
    items: Vec<HandoffItem>,
    selected: usize,
    upload: Option<UploadStatus>,
    detail: DetailState,
    detail_scroll: u16,
}

impl HandoffPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_state(&self) -> &ListState {
        &self.list
    }

    pub fn items(&self) -> &[HandoffItem] {
        &self.items
    }

    /// The empty-state text, shown once a load produced no items.
    pub fn placeholder(&self) -> Option<&'static str> {
        (self.list == ListState::Loaded && self.items.is_empty()).then_some(EMPTY_PLACEHOLDER)
    }

    pub fn set_loading(&mut self) {
        self.list = ListState::Loading;
    }

    /// Replace the list with the items of a freshly loaded fragment.
    pub fn load(&mut self, fragment: &TrustedFragment) {
        self.items = fragment
            .split_by_attribute(ITEM_ATTRIBUTE)
            .into_iter()
            .map(|(id, html)| HandoffItem::from_markup(id, &html))
            .collect();
        self.list = ListState::Loaded;
        self.clamp_selection();
    }

    pub fn set_failed(&mut self, message: impl Into<String>) {
        self.list = ListState::Failed(message.into());
    }

    /// Remove the first item with `id`. Returns whether one was removed.
    pub fn remove(&mut self, id: HandoffId) -> bool {
        match self.items.iter().position(|item| item.id == id) {
            Some(index) => {
                self.items.remove(index);
                self.clamp_selection();
                true
            }
            None => false,
        }
    }

    pub fn selected(&self) -> Option<&HandoffItem> {
        self.items.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.items.len().saturating_sub(1));
    }

    pub fn upload(&self) -> Option<&UploadStatus> {
        self.upload.as_ref()
    }

    pub fn set_upload(&mut self, status: UploadStatus) {
        self.upload = Some(status);
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    /// Whether the viewer is waiting for `id`.
    pub fn is_loading_detail(&self, id: HandoffId) -> bool {
        self.detail == DetailState::Loading(id)
    }

    pub fn set_detail(&mut self, detail: DetailState) {
        self.detail = detail;
        self.detail_scroll = 0;
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    pub fn scroll_detail(&mut self, delta: i16) {
        self.detail_scroll = self.detail_scroll.saturating_add_signed(delta);
    }
}
