// Canvas renderer: full re-render of the preview surface from the layout.
// `title`, `desc` and `body` props are stored HTML fragments and emitted as-is;
// every other prop is escaped.

use crate::model::{Block, Page, SiteState};
use crate::registry::{BlockCategory, BlockRegistry};
use crate::store::ContentStore;
use crate::util::escape_html;
use std::fmt::Write;

/// Everything the renderer reads. Built fresh for every render.
pub struct CanvasInput<'a> {
    pub page: Option<&'a Page>,
    pub layout: Vec<&'a Block>,
    pub selected: Option<&'a str>,
    pub assets: &'a SiteState,
}

impl<'a> CanvasInput<'a> {
    /// Snapshot the active page with the draft substituted for the selection.
    pub fn from_store(store: &'a ContentStore) -> Self {
        CanvasInput {
            page: store.active_page(),
            layout: store.effective_layout(),
            selected: store.selected_block_id(),
            assets: store.state(),
        }
    }
}

/// Map an accent name to its hex colour. Unknown names fall back to gold.
pub fn accent_to_hex(accent: &str) -> &'static str {
    match accent.to_ascii_lowercase().as_str() {
        "green" => "#10B981",
        "blue" => "#3B82F6",
        "purple" => "#8B5CF6",
        "red" => "#EF4444",
        _ => "#FACC15",
    }
}

/// Render the canvas. Pure: the same input always yields the same HTML.
pub fn render_canvas(input: &CanvasInput<'_>) -> String {
    let Some(page) = input.page else {
        return "<div id=\"canvasPage\"><div id=\"canvasEmpty\">Select a page to start editing.</div></div>"
            .to_string();
    };

    let mut html = format!(
        "<div id=\"canvasPage\" data-page-id=\"{}\" data-slug=\"{}\">",
        escape_html(&page.id),
        escape_html(&page.slug)
    );

    for block in &input.layout {
        let selected = input.selected == Some(block.id.as_str());
        render_block(&mut html, block, selected, input.assets);
    }

    html.push_str(
        "<div id=\"dropZone\" class=\"drop-zone\"><i class=\"fa-solid fa-plus\"></i><span>Drag here to add</span></div>",
    );
    html.push_str("</div>");
    html
}

fn render_block(html: &mut String, block: &Block, selected: bool, assets: &SiteState) {
    let class = if selected {
        "editable-block selected"
    } else {
        "editable-block"
    };
    let _ = write!(
        html,
        "<div class=\"{class} block-{}\" data-block-id=\"{}\">",
        escape_html(&block.block_type),
        escape_html(&block.id)
    );

    match block.block_type.as_str() {
        "hero" => render_hero(html, block),
        "metric" => render_metric(html, block),
        "section" => render_section(html, block),
        "cta" => render_cta(html, block),
        _ => {
            let _ = write!(
                html,
                "<div class=\"block-label\">{}</div>",
                escape_html(&block.block_type.to_uppercase())
            );
        }
    }

    render_references(html, block, assets);
    html.push_str("</div>");
}

fn render_hero(html: &mut String, block: &Block) {
    let _ = write!(
        html,
        "<div class=\"block-label\">HERO</div>\
         <div class=\"hero-bg\" style=\"background-image:url('{}')\"></div>\
         <span class=\"hero-subtitle\">{}</span>\
         <h1>{}</h1>\
         <p>{}</p>",
        escape_html(block.prop("bgImage")),
        escape_html(block.prop("subtitle")),
        block.prop("title"),
        block.prop("desc"),
    );
}

fn render_metric(html: &mut String, block: &Block) {
    let icon = match block.prop("icon") {
        "" => "fa-bolt",
        other => other,
    };
    let value = match block.prop("value") {
        "" => "—",
        other => other,
    };
    let hex = accent_to_hex(block.prop("accent"));
    let _ = write!(
        html,
        "<div class=\"block-label\">WIDGET</div>\
         <div class=\"metric-icon\" style=\"background:{hex}22;color:{hex}\"><i class=\"fa-solid {}\"></i></div>\
         <h3>{}</h3>\
         <p class=\"metric-label\">{}</p>",
        escape_html(icon),
        escape_html(value),
        escape_html(block.prop("label")),
    );
}

fn render_section(html: &mut String, block: &Block) {
    let _ = write!(
        html,
        "<div class=\"block-label\">SECTION</div>\
         <h2>{}</h2>\
         <span class=\"section-subtitle\">{}</span>\
         <div class=\"section-body\">{}</div>",
        block.prop("title"),
        escape_html(block.prop("subtitle")),
        block.prop("body"),
    );
}

fn render_cta(html: &mut String, block: &Block) {
    let _ = write!(
        html,
        "<div class=\"block-label\">CTA</div>\
         <h2>{}</h2>\
         <p>{}</p>\
         <a class=\"cta-button\" href=\"{}\">{}</a>",
        block.prop("title"),
        block.prop("body"),
        escape_html(block.prop("buttonUrl")),
        escape_html(block.prop("buttonLabel")),
    );
}

/// Resolve `imageId`/`docId`. A reference to a deleted asset renders nothing.
fn render_references(html: &mut String, block: &Block, assets: &SiteState) {
    if let Some(media) = block.image_id.as_deref().and_then(|id| assets.media(id)) {
        let _ = write!(
            html,
            "<figure class=\"block-media\"><img src=\"{}\" alt=\"{}\"></figure>",
            escape_html(&media.url),
            escape_html(&media.name)
        );
    }
    if let Some(doc) = block.doc_id.as_deref().and_then(|id| assets.doc(id)) {
        let _ = write!(
            html,
            "<a class=\"block-doc\" href=\"{}\"><i class=\"fa-solid fa-file-pdf\"></i> {}</a>",
            escape_html(&doc.url),
            escape_html(&doc.title)
        );
    }
}

/// Render the drag-source listing, grouped by category.
pub fn render_block_library(registry: &BlockRegistry) -> String {
    let mut html = String::from("<div class=\"block-library\">");
    for (category, entries) in registry.by_category() {
        let heading = match category {
            BlockCategory::Structural => "Structure",
            BlockCategory::Widgets => "Widgets",
        };
        let _ = write!(
            html,
            "<section data-category=\"{}\"><h4>{heading}</h4>",
            category.as_str()
        );
        for (name, def) in entries {
            let _ = write!(
                html,
                "<div class=\"block-tile\" draggable=\"true\" data-block-type=\"{}\"><i class=\"fa-solid {}\"></i><span>{}</span></div>",
                escape_html(name),
                escape_html(&def.icon),
                escape_html(&def.label)
            );
        }
        html.push_str("</section>");
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::demo_state;

    fn store() -> ContentStore {
        ContentStore::new(demo_state(), BlockRegistry::builtin())
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut store = store();
        store.set_active_page("sustainability").unwrap();
        let id = store.layout()[1].id.clone();
        store.select_block(&id).unwrap();

        let first = render_canvas(&CanvasInput::from_store(&store));
        let second = render_canvas(&CanvasInput::from_store(&store));
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_state_without_page() {
        let input = CanvasInput {
            page: None,
            layout: Vec::new(),
            selected: None,
            assets: &SiteState::default(),
        };
        let html = render_canvas(&input);
        assert!(html.contains("canvasEmpty"));
        assert!(!html.contains("dropZone"));
    }

    #[test]
    fn test_trailing_drop_zone_on_empty_layout() {
        let mut store = store();
        let id = store.create_page("Blank").unwrap();
        store.set_active_page(&id).unwrap();
        let html = render_canvas(&CanvasInput::from_store(&store));
        assert!(html.contains("dropZone"));
        assert!(!html.contains("editable-block"));
    }

    #[test]
    fn test_draft_is_visible_and_selected() {
        let mut store = store();
        let id = store.layout()[0].id.clone();
        store.select_block(&id).unwrap();
        store.update_block_prop("title", "Live<br>preview").unwrap();

        let html = render_canvas(&CanvasInput::from_store(&store));
        assert!(html.contains("<h1>Live<br>preview</h1>"));
        assert!(html.contains("editable-block selected"));
    }

    #[test]
    fn test_metric_escapes_and_accent() {
        let mut store = store();
        store.set_active_page("sustainability").unwrap();
        let id = store.layout()[1].id.clone();
        store.select_block(&id).unwrap();
        store.update_block_prop("label", "<script>").unwrap();
        store.update_block_prop("accent", "Blue").unwrap();

        let html = render_canvas(&CanvasInput::from_store(&store));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("#3B82F6"));
        assert_eq!(accent_to_hex("unknown"), "#FACC15");
    }

    #[test]
    fn test_unknown_type_renders_generic() {
        let mut state = demo_state();
        state.pages[0].layout.push(Block::new("x1", "gallery"));
        let store = ContentStore::new(state, BlockRegistry::builtin());

        let html = render_canvas(&CanvasInput::from_store(&store));
        assert!(html.contains("<div class=\"block-label\">GALLERY</div>"));
    }

    #[test]
    fn test_deleted_media_renders_without_image() {
        let mut store = store();
        store.set_active_page("about").unwrap();
        let before = render_canvas(&CanvasInput::from_store(&store));
        assert!(before.contains("block-media"));
        assert!(before.contains("Investor Presentation"));

        store.remove_media("m7").unwrap();
        let after = render_canvas(&CanvasInput::from_store(&store));
        assert!(!after.contains("block-media"));
        assert!(after.contains("Investor Presentation"));
    }

    #[test]
    fn test_block_library_groups() {
        let html = render_block_library(&BlockRegistry::builtin());
        let structural = html.find("data-category=\"structural\"").unwrap();
        let widgets = html.find("data-category=\"widgets\"").unwrap();
        assert!(structural < widgets);
        assert!(html.contains("data-block-type=\"metric\""));
    }
}
