// Asset picker: a one-shot selection session over media or documents

use crate::error::Result;
use crate::model::SiteState;
use crate::store::ContentStore;
use crate::util::escape_html;

/// Callback run with the chosen candidate id. Consumed on invocation.
pub type PickCallback = Box<dyn FnOnce(&mut ContentStore, &str) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    Media,
    Document,
}

impl PickerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickerKind::Media => "media",
            PickerKind::Document => "document",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PickerKind::Media => "Select image",
            PickerKind::Document => "Select document",
        }
    }
}

pub struct PickerSession {
    kind: PickerKind,
    on_pick: PickCallback,
}

impl PickerSession {
    pub fn new(kind: PickerKind, on_pick: PickCallback) -> Self {
        PickerSession { kind, on_pick }
    }

    pub fn kind(&self) -> PickerKind {
        self.kind
    }

    /// Deliver the selection. Taking `self` by value makes a second delivery impossible.
    pub fn invoke(self, store: &mut ContentStore, candidate_id: &str) -> Result<()> {
        log::debug!("Picked {} '{}'", self.kind.as_str(), candidate_id);
        (self.on_pick)(store, candidate_id)
    }
}

/// The usual callback: attach the picked asset to the selected block's draft.
pub fn attach_to_selected(kind: PickerKind) -> PickCallback {
    match kind {
        PickerKind::Media => Box::new(|store, id| store.attach_media(id)),
        PickerKind::Document => Box::new(|store, id| store.attach_document(id)),
    }
}

/// One selectable entry shown in the picker grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub label: String,
    pub detail: String,
    pub thumb_url: Option<String>,
}

pub fn candidates(state: &SiteState, kind: PickerKind) -> Vec<Candidate> {
    match kind {
        PickerKind::Media => state
            .media
            .iter()
            .map(|m| Candidate {
                id: m.id.clone(),
                label: m.name.clone(),
                detail: m.created_at.clone(),
                thumb_url: Some(m.url.clone()),
            })
            .collect(),
        PickerKind::Document => state
            .docs
            .iter()
            .map(|d| Candidate {
                id: d.id.clone(),
                label: d.title.clone(),
                detail: format!("{} · {}", d.category, d.date),
                thumb_url: None,
            })
            .collect(),
    }
}

/// Render the picker modal body for the given kind.
pub fn render_picker(state: &SiteState, kind: PickerKind) -> String {
    let items = candidates(state, kind);
    let mut html = format!(
        "<div class=\"picker\" data-kind=\"{}\"><h3>{}</h3>",
        kind.as_str(),
        kind.title()
    );

    if items.is_empty() {
        html.push_str("<p class=\"picker-empty\">Nothing to pick yet.</p></div>");
        return html;
    }

    html.push_str("<div class=\"picker-grid\">");
    for item in &items {
        html.push_str(&format!(
            "<button class=\"picker-item\" data-id=\"{}\">",
            escape_html(&item.id)
        ));
        if let Some(url) = &item.thumb_url {
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\">",
                escape_html(url),
                escape_html(&item.label)
            ));
        }
        html.push_str(&format!(
            "<strong>{}</strong><small>{}</small></button>",
            escape_html(&item.label),
            escape_html(&item.detail)
        ));
    }
    html.push_str("</div></div>");
    html
}
