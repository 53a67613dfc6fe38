use crate::error::{FolioError, Result};
use crate::model::{
    Block, Document, MediaAsset, NewsItem, NewsStatus, Page, PageStatus, SeoPage, SiteState,
};
use crate::panel::input_to_prop;
use crate::picker::{PickCallback, PickerKind, PickerSession};
use crate::registry::BlockRegistry;
use crate::util::{new_asset_id, new_block_id, now_iso, slugify};
use crate::validation;

/// The editor's single owned state container.
///
/// Holds the site model plus the editing session for the active page: a
/// working copy of its layout, the selected block, and a draft copy of that
/// block's props. Draft edits are visible through [`ContentStore::effective_layout`]
/// but only reach the working layout on [`ContentStore::apply_draft`], and only
/// reach the persisted page on [`ContentStore::commit_layout`].
pub struct ContentStore {
    state: SiteState,
    registry: BlockRegistry,
    active_page_id: Option<String>,
    layout: Vec<Block>,
    selected_block_id: Option<String>,
    draft: Option<Block>,
    dirty: bool,
    picker: Option<PickerSession>,
}

/// Partial update for a news item. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct NewsPatch {
    pub title: Option<String>,
    pub date: Option<String>,
    pub status: Option<NewsStatus>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
}

impl ContentStore {
    /// Create a store over a site model. The first page, if any, becomes active.
    pub fn new(state: SiteState, registry: BlockRegistry) -> Self {
        let first = state.pages.first().map(|p| p.id.clone());
        let mut store = ContentStore {
            state,
            registry,
            active_page_id: None,
            layout: Vec::new(),
            selected_block_id: None,
            draft: None,
            dirty: false,
            picker: None,
        };
        if let Some(id) = first {
            // The id was just read from the page list.
            let _ = store.set_active_page(&id);
        }
        store
    }

    pub fn state(&self) -> &SiteState {
        &self.state
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn into_state(self) -> SiteState {
        self.state
    }

    /// Replace the whole site model (e.g. after loading builder state).
    pub fn replace_state(&mut self, state: SiteState) {
        let keep = self
            .active_page_id
            .clone()
            .filter(|id| state.page(id).is_some());
        self.state = state;
        self.active_page_id = None;
        self.layout.clear();
        self.clear_selection_state();
        self.dirty = false;

        let target = keep.or_else(|| self.state.pages.first().map(|p| p.id.clone()));
        if let Some(id) = target {
            let _ = self.set_active_page(&id);
        }
    }

    // ── Pages ───────────────────────────────────────────────────────

    pub fn pages(&self) -> &[Page] {
        &self.state.pages
    }

    pub fn page_by_slug(&self, slug: &str) -> Option<&Page> {
        self.state.pages.iter().find(|p| p.slug == slug)
    }

    pub fn active_page(&self) -> Option<&Page> {
        self.active_page_id
            .as_deref()
            .and_then(|id| self.state.page(id))
    }

    pub fn active_page_id(&self) -> Option<&str> {
        self.active_page_id.as_deref()
    }

    /// Make a page active: its layout is copied into the working layout,
    /// selection and draft are cleared, and dirty is reset.
    pub fn set_active_page(&mut self, page_id: &str) -> Result<()> {
        let page = self
            .state
            .page(page_id)
            .ok_or_else(|| FolioError::not_found("page", page_id))?;

        self.layout = page.layout.clone();
        self.active_page_id = Some(page_id.to_string());
        self.clear_selection_state();
        self.dirty = false;
        Ok(())
    }

    /// Add a page with a slug derived from its name. Slugs must be unique.
    pub fn create_page(&mut self, name: &str) -> Result<String> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(FolioError::Validation(format!(
                "Page name '{name}' does not produce a usable slug"
            )));
        }
        self.ensure_slug_free(&slug, None)?;

        let id = if self.state.page(&slug).is_none() {
            slug.clone()
        } else {
            new_asset_id("page")
        };

        self.state.pages.push(Page {
            id: id.clone(),
            name: name.to_string(),
            slug,
            status: PageStatus::Draft,
            updated_at: now_iso(),
            layout: Vec::new(),
        });
        Ok(id)
    }

    pub fn set_page_slug(&mut self, page_id: &str, slug: &str) -> Result<()> {
        let slug = slugify(slug);
        if slug.is_empty() {
            return Err(FolioError::Validation("Slug must not be empty".into()));
        }
        self.ensure_slug_free(&slug, Some(page_id))?;
        let page = self.page_mut(page_id)?;
        page.slug = slug;
        page.updated_at = now_iso();
        Ok(())
    }

    pub fn set_page_status(&mut self, page_id: &str, status: PageStatus) -> Result<()> {
        let page = self.page_mut(page_id)?;
        page.status = status;
        page.updated_at = now_iso();
        Ok(())
    }

    fn ensure_slug_free(&self, slug: &str, except_page: Option<&str>) -> Result<()> {
        if let Some(existing) = self.page_by_slug(slug) {
            if Some(existing.id.as_str()) != except_page {
                return Err(FolioError::Conflict(format!(
                    "Slug '{slug}' is already used by page '{}'",
                    existing.id
                )));
            }
        }
        Ok(())
    }

    fn page_mut(&mut self, page_id: &str) -> Result<&mut Page> {
        self.state
            .page_mut(page_id)
            .ok_or_else(|| FolioError::not_found("page", page_id))
    }

    // ── Layout editing ──────────────────────────────────────────────

    /// The working layout without the pending draft.
    pub fn layout(&self) -> &[Block] {
        &self.layout
    }

    /// The working layout with the draft substituted for the selected block.
    /// This is what the canvas shows.
    pub fn effective_layout(&self) -> Vec<&Block> {
        self.layout
            .iter()
            .map(|block| match &self.draft {
                Some(draft) if draft.id == block.id => draft,
                _ => block,
            })
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Insert a new block of `block_type` at the end of the layout, seeded
    /// with the registry defaults. Returns the new block id.
    pub fn add_block(&mut self, block_type: &str) -> Result<String> {
        if self.active_page_id.is_none() {
            return Err(FolioError::not_found("page", "<active>"));
        }
        let props = self
            .registry
            .defaults_for(block_type)
            .ok_or_else(|| FolioError::not_found("block type", block_type))?;

        let id = new_block_id();
        self.layout.push(Block {
            props,
            ..Block::new(id.clone(), block_type)
        });
        self.dirty = true;
        Ok(id)
    }

    pub fn remove_block(&mut self, block_id: &str) -> Result<Block> {
        let index = self
            .layout
            .iter()
            .position(|b| b.id == block_id)
            .ok_or_else(|| FolioError::not_found("block", block_id))?;

        if self.selected_block_id.as_deref() == Some(block_id) {
            self.clear_selection_state();
        }
        self.dirty = true;
        Ok(self.layout.remove(index))
    }

    /// Reorder the layout to follow `new_order`. Ids not listed keep their
    /// relative order after the listed ones; duplicates are ignored.
    pub fn reorder_blocks(&mut self, new_order: &[String]) -> Result<()> {
        if let Some(unknown) = new_order
            .iter()
            .find(|id| !self.layout.iter().any(|b| &b.id == *id))
        {
            return Err(FolioError::not_found("block", unknown));
        }

        let mut remaining = std::mem::take(&mut self.layout);
        let mut ordered = Vec::with_capacity(remaining.len());
        for id in new_order {
            if let Some(pos) = remaining.iter().position(|b| &b.id == id) {
                ordered.push(remaining.remove(pos));
            }
        }
        ordered.extend(remaining);

        self.layout = ordered;
        self.dirty = true;
        Ok(())
    }

    // ── Selection & draft ───────────────────────────────────────────

    pub fn selected_block_id(&self) -> Option<&str> {
        self.selected_block_id.as_deref()
    }

    pub fn draft(&self) -> Option<&Block> {
        self.draft.as_ref()
    }

    /// Select a block of the active layout and start a draft from it.
    /// A pending draft on the previous selection is applied first.
    pub fn select_block(&mut self, block_id: &str) -> Result<()> {
        let block = self
            .layout
            .iter()
            .find(|b| b.id == block_id)
            .cloned()
            .ok_or_else(|| FolioError::not_found("block", block_id))?;

        if self.draft.is_some() {
            self.apply_draft()?;
        }
        self.selected_block_id = Some(block.id.clone());
        self.draft = Some(block);
        Ok(())
    }

    /// Apply any pending draft and clear the selection.
    pub fn deselect(&mut self) -> Result<()> {
        if self.draft.is_some() {
            self.apply_draft()?;
        }
        self.clear_selection_state();
        Ok(())
    }

    /// Write a prop on the draft of the selected block.
    pub fn update_block_prop(&mut self, key: &str, value: &str) -> Result<()> {
        let draft = self.draft_mut()?;
        draft.props.insert(key.to_string(), value.to_string());
        self.dirty = true;
        Ok(())
    }

    /// Keystroke path of the property panel: converts the typed text for the
    /// field's input kind (newlines become `<br>` in textareas) and writes it.
    pub fn type_into_field(&mut self, key: &str, typed: &str) -> Result<()> {
        let draft = self
            .draft
            .as_ref()
            .ok_or_else(|| FolioError::not_found("selection", "<none>"))?;
        let kind = self
            .registry
            .get(&draft.block_type)
            .and_then(|def| def.field(key))
            .map(|f| f.kind)
            .ok_or_else(|| FolioError::not_found("field", key))?;

        let value = input_to_prop(kind, typed);
        self.update_block_prop(key, &value)
    }

    /// Commit the draft into the working layout. Returns validation warnings.
    pub fn apply_draft(&mut self) -> Result<Vec<String>> {
        let draft = self
            .draft
            .clone()
            .ok_or_else(|| FolioError::not_found("selection", "<none>"))?;
        let warnings = validation::validate_and_prepare(&self.registry, &draft)?;

        let slot = self
            .layout
            .iter_mut()
            .find(|b| b.id == draft.id)
            .ok_or_else(|| FolioError::not_found("block", &draft.id))?;
        *slot = draft;
        Ok(warnings)
    }

    /// Discard uncommitted draft edits of the selected block.
    pub fn revert_draft(&mut self) -> Result<()> {
        let selected = self
            .selected_block_id
            .clone()
            .ok_or_else(|| FolioError::not_found("selection", "<none>"))?;
        let block = self
            .layout
            .iter()
            .find(|b| b.id == selected)
            .cloned()
            .ok_or_else(|| FolioError::not_found("block", &selected))?;

        self.draft = Some(block);
        self.dirty = self
            .active_page()
            .map(|p| p.layout != self.layout)
            .unwrap_or(false);
        Ok(())
    }

    /// Reload the working layout from the persisted page, dropping every
    /// uncommitted change.
    pub fn discard_changes(&mut self) -> Result<()> {
        let page_id = self
            .active_page_id
            .clone()
            .ok_or_else(|| FolioError::not_found("page", "<active>"))?;
        self.set_active_page(&page_id)
    }

    /// Write the working layout (including the applied draft) into the
    /// active page and refresh its `updatedAt`. Clears dirty.
    pub fn commit_layout(&mut self) -> Result<Vec<String>> {
        let page_id = self
            .active_page_id
            .clone()
            .ok_or_else(|| FolioError::not_found("page", "<active>"))?;

        let warnings = if self.draft.is_some() {
            self.apply_draft()?
        } else {
            Vec::new()
        };

        let layout = self.layout.clone();
        let page = self.page_mut(&page_id)?;
        page.layout = layout;
        page.updated_at = now_iso();
        self.dirty = false;
        Ok(warnings)
    }

    fn draft_mut(&mut self) -> Result<&mut Block> {
        self.draft
            .as_mut()
            .ok_or_else(|| FolioError::not_found("selection", "<none>"))
    }

    fn clear_selection_state(&mut self) {
        self.selected_block_id = None;
        self.draft = None;
        self.picker = None;
    }

    // ── References on the draft ─────────────────────────────────────

    pub fn attach_media(&mut self, media_id: &str) -> Result<()> {
        if self.state.media(media_id).is_none() {
            return Err(FolioError::not_found("media", media_id));
        }
        self.draft_mut()?.image_id = Some(media_id.to_string());
        self.dirty = true;
        Ok(())
    }

    pub fn attach_document(&mut self, doc_id: &str) -> Result<()> {
        if self.state.doc(doc_id).is_none() {
            return Err(FolioError::not_found("document", doc_id));
        }
        self.draft_mut()?.doc_id = Some(doc_id.to_string());
        self.dirty = true;
        Ok(())
    }

    pub fn clear_media(&mut self) -> Result<()> {
        self.draft_mut()?.image_id = None;
        self.dirty = true;
        Ok(())
    }

    pub fn clear_document(&mut self) -> Result<()> {
        self.draft_mut()?.doc_id = None;
        self.dirty = true;
        Ok(())
    }

    // ── Picker ──────────────────────────────────────────────────────

    /// Open a picker. `on_pick` runs at most once, on the next successful [`ContentStore::pick`].
    pub fn open_picker(&mut self, kind: PickerKind, on_pick: PickCallback) {
        self.picker = Some(PickerSession::new(kind, on_pick));
    }

    pub fn picker_kind(&self) -> Option<PickerKind> {
        self.picker.as_ref().map(|s| s.kind())
    }

    /// Select a candidate in the open picker: invokes the stored callback
    /// exactly once, then closes the picker.
    pub fn pick(&mut self, candidate_id: &str) -> Result<()> {
        let kind = self
            .picker_kind()
            .ok_or_else(|| FolioError::not_found("picker", "<closed>"))?;

        let exists = match kind {
            PickerKind::Media => self.state.media(candidate_id).is_some(),
            PickerKind::Document => self.state.doc(candidate_id).is_some(),
        };
        if !exists {
            return Err(FolioError::not_found(kind.as_str(), candidate_id));
        }

        match self.picker.take() {
            Some(session) => session.invoke(self, candidate_id),
            None => Ok(()),
        }
    }

    /// Close the picker without selecting. Leaves every reference untouched.
    pub fn close_picker(&mut self) {
        self.picker = None;
    }

    // ── Assets, news, SEO ───────────────────────────────────────────

    pub fn add_media(&mut self, name: &str, url: &str) -> String {
        let id = new_asset_id("m");
        self.state.media.push(MediaAsset {
            id: id.clone(),
            name: name.to_string(),
            url: url.to_string(),
            created_at: now_iso(),
        });
        id
    }

    /// Remove a media asset. Blocks referencing it keep the id and simply
    /// render without an image.
    pub fn remove_media(&mut self, media_id: &str) -> Result<MediaAsset> {
        let index = self
            .state
            .media
            .iter()
            .position(|m| m.id == media_id)
            .ok_or_else(|| FolioError::not_found("media", media_id))?;
        Ok(self.state.media.remove(index))
    }

    pub fn add_document(&mut self, title: &str, category: &str, date: &str, url: &str) -> String {
        let id = new_asset_id("d");
        self.state.docs.push(Document {
            id: id.clone(),
            title: title.to_string(),
            category: category.to_string(),
            date: date.to_string(),
            url: url.to_string(),
        });
        id
    }

    pub fn remove_document(&mut self, doc_id: &str) -> Result<Document> {
        let index = self
            .state
            .docs
            .iter()
            .position(|d| d.id == doc_id)
            .ok_or_else(|| FolioError::not_found("document", doc_id))?;
        Ok(self.state.docs.remove(index))
    }

    pub fn add_news(&mut self, title: &str, date: &str) -> String {
        let id = new_asset_id("n");
        self.state.news.push(NewsItem {
            id: id.clone(),
            title: title.to_string(),
            date: date.to_string(),
            status: NewsStatus::Draft,
            excerpt: String::new(),
            body: String::new(),
        });
        id
    }

    pub fn update_news(&mut self, news_id: &str, patch: NewsPatch) -> Result<()> {
        let item = self
            .state
            .news
            .iter_mut()
            .find(|n| n.id == news_id)
            .ok_or_else(|| FolioError::not_found("news", news_id))?;

        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(date) = patch.date {
            item.date = date;
        }
        if let Some(status) = patch.status {
            item.status = status;
        }
        if let Some(excerpt) = patch.excerpt {
            item.excerpt = excerpt;
        }
        if let Some(body) = patch.body {
            item.body = body;
        }
        Ok(())
    }

    pub fn set_news_status(&mut self, news_id: &str, status: NewsStatus) -> Result<()> {
        self.update_news(
            news_id,
            NewsPatch {
                status: Some(status),
                ..Default::default()
            },
        )
    }

    pub fn update_seo(&mut self, site_title: Option<&str>, site_description: Option<&str>) {
        if let Some(title) = site_title {
            self.state.seo.site_title = title.to_string();
        }
        if let Some(desc) = site_description {
            self.state.seo.site_description = desc.to_string();
        }
    }

    pub fn set_page_seo_title(&mut self, page_key: &str, title: &str) {
        self.state.seo.per_page.insert(
            page_key.to_string(),
            SeoPage {
                title: title.to_string(),
            },
        );
    }

    pub fn mark_deployed(&mut self) {
        self.state.last_deploy_at = Some(now_iso());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::demo_state;
    use crate::picker::attach_to_selected;
    use pretty_assertions::assert_eq;

    fn empty_page_store() -> ContentStore {
        let state = SiteState {
            pages: vec![Page {
                id: "blank".into(),
                name: "Blank".into(),
                slug: "blank".into(),
                status: PageStatus::Draft,
                updated_at: "2026-01-01T00:00:00.000Z".into(),
                layout: Vec::new(),
            }],
            ..demo_state()
        };
        ContentStore::new(state, BlockRegistry::builtin())
    }

    fn ids(store: &ContentStore) -> Vec<String> {
        store.layout().iter().map(|b| b.id.clone()).collect()
    }

    #[test]
    fn test_add_hero_to_empty_page() {
        let mut store = empty_page_store();
        store.add_block("hero").unwrap();

        let layout = store.layout();
        assert_eq!(layout.len(), 1);
        assert_eq!(layout[0].block_type, "hero");
        assert_eq!(
            layout[0].props,
            BlockRegistry::builtin().defaults_for("hero").unwrap()
        );
    }

    #[test]
    fn test_add_unknown_type_is_not_found() {
        let mut store = empty_page_store();
        let result = store.add_block("carousel");
        assert!(matches!(result, Err(FolioError::NotFound { .. })));
        assert!(store.layout().is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_textarea_keystrokes_store_br() {
        let mut store = empty_page_store();
        let id = store.add_block("hero").unwrap();
        store.select_block(&id).unwrap();
        store.type_into_field("title", "Hello\nWorld").unwrap();
        store.apply_draft().unwrap();

        assert_eq!(store.layout()[0].prop("title"), "Hello<br>World");
    }

    #[test]
    fn test_text_field_keeps_newlines_verbatim() {
        let mut store = empty_page_store();
        let id = store.add_block("hero").unwrap();
        store.select_block(&id).unwrap();
        store.type_into_field("subtitle", "a\nb").unwrap();
        assert_eq!(store.draft().unwrap().prop("subtitle"), "a\nb");
    }

    #[test]
    fn test_draft_not_in_layout_until_applied() {
        let mut store = empty_page_store();
        let id = store.add_block("metric").unwrap();
        store.commit_layout().unwrap();

        store.select_block(&id).unwrap();
        store.update_block_prop("value", "42").unwrap();

        assert_eq!(store.layout()[0].prop("value"), "—");
        assert_eq!(store.effective_layout()[0].prop("value"), "42");
        assert_eq!(store.active_page().unwrap().layout[0].prop("value"), "—");

        store.apply_draft().unwrap();
        assert_eq!(store.layout()[0].prop("value"), "42");
        assert_eq!(store.active_page().unwrap().layout[0].prop("value"), "—");

        store.commit_layout().unwrap();
        assert_eq!(store.active_page().unwrap().layout[0].prop("value"), "42");
    }

    #[test]
    fn test_revert_discards_draft() {
        let mut store = empty_page_store();
        let id = store.add_block("metric").unwrap();
        store.commit_layout().unwrap();

        store.select_block(&id).unwrap();
        store.update_block_prop("value", "42").unwrap();
        assert!(store.is_dirty());

        store.revert_draft().unwrap();
        assert_eq!(store.draft().unwrap().prop("value"), "—");
        assert_eq!(store.effective_layout()[0].prop("value"), "—");
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_dirty_flag_law() {
        let mut store = empty_page_store();
        assert!(!store.is_dirty());

        let a = store.add_block("hero").unwrap();
        assert!(store.is_dirty());
        store.commit_layout().unwrap();
        assert!(!store.is_dirty());

        let b = store.add_block("metric").unwrap();
        store.commit_layout().unwrap();

        store.reorder_blocks(&[b.clone(), a.clone()]).unwrap();
        assert!(store.is_dirty());
        store.commit_layout().unwrap();

        store.select_block(&a).unwrap();
        store.update_block_prop("title", "x").unwrap();
        assert!(store.is_dirty());

        store.set_active_page("blank").unwrap();
        assert!(!store.is_dirty());

        store.remove_block(&b).unwrap();
        assert!(store.is_dirty());
    }

    #[test]
    fn test_order_round_trip() {
        let mut store = empty_page_store();
        let a = store.add_block("hero").unwrap();
        let b = store.add_block("metric").unwrap();
        let c = store.add_block("section").unwrap();
        let d = store.add_block("cta").unwrap();
        store.remove_block(&b).unwrap();
        store
            .reorder_blocks(&[d.clone(), a.clone(), c.clone()])
            .unwrap();
        store.commit_layout().unwrap();

        let persisted: Vec<_> = store
            .active_page()
            .unwrap()
            .layout
            .iter()
            .map(|b| b.id.clone())
            .collect();
        assert_eq!(persisted, vec![d, a, c]);
    }

    #[test]
    fn test_partial_reorder_appends_rest() {
        let mut store = empty_page_store();
        let a = store.add_block("hero").unwrap();
        let b = store.add_block("metric").unwrap();
        let c = store.add_block("section").unwrap();

        store.reorder_blocks(&[c.clone(), c.clone()]).unwrap();
        assert_eq!(ids(&store), vec![c, a, b]);
    }

    #[test]
    fn test_reorder_with_unknown_id_leaves_layout() {
        let mut store = empty_page_store();
        let a = store.add_block("hero").unwrap();
        let before = ids(&store);
        assert!(store.reorder_blocks(&["ghost".into(), a]).is_err());
        assert_eq!(ids(&store), before);
    }

    #[test]
    fn test_set_active_page_copies_and_clears() {
        let mut store = ContentStore::new(demo_state(), BlockRegistry::builtin());
        let first = store.layout()[0].id.clone();
        store.select_block(&first).unwrap();
        store.update_block_prop("title", "changed").unwrap();

        store.set_active_page("sustainability").unwrap();
        assert_eq!(store.selected_block_id(), None);
        assert!(store.draft().is_none());
        assert!(!store.is_dirty());
        assert_eq!(store.layout().len(), 3);

        // Working copy is detached from the page.
        let first_metric = store.layout()[0].id.clone();
        store.remove_block(&first_metric).unwrap();
        assert_eq!(store.active_page().unwrap().layout.len(), 3);

        // Edits on the first page were never committed.
        store.set_active_page("index").unwrap();
        assert_ne!(store.layout()[0].prop("title"), "changed");
    }

    #[test]
    fn test_missing_page_is_not_found_and_noop() {
        let mut store = ContentStore::new(demo_state(), BlockRegistry::builtin());
        let before = store.active_page_id().map(str::to_string);
        assert!(matches!(
            store.set_active_page("nope"),
            Err(FolioError::NotFound { .. })
        ));
        assert_eq!(store.active_page_id().map(str::to_string), before);
    }

    #[test]
    fn test_select_missing_block() {
        let mut store = empty_page_store();
        assert!(store.select_block("ghost").is_err());
        assert_eq!(store.selected_block_id(), None);
        assert!(store.update_block_prop("title", "x").is_err());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_selecting_another_block_keeps_edits() {
        let mut store = empty_page_store();
        let a = store.add_block("hero").unwrap();
        let b = store.add_block("metric").unwrap();
        store.select_block(&a).unwrap();
        store.update_block_prop("title", "kept").unwrap();
        store.select_block(&b).unwrap();

        assert_eq!(store.layout()[0].prop("title"), "kept");
        assert_eq!(store.selected_block_id(), Some(b.as_str()));
    }

    #[test]
    fn test_removing_selected_block_clears_selection() {
        let mut store = empty_page_store();
        let a = store.add_block("hero").unwrap();
        store.select_block(&a).unwrap();
        store.remove_block(&a).unwrap();
        assert_eq!(store.selected_block_id(), None);
        assert!(store.draft().is_none());
    }

    #[test]
    fn test_discard_changes() {
        let mut store = ContentStore::new(demo_state(), BlockRegistry::builtin());
        store.add_block("metric").unwrap();
        store.discard_changes().unwrap();
        assert_eq!(store.layout().len(), 1);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_create_page_unique_slug() {
        let mut store = empty_page_store();
        let id = store.create_page("Cabo Vírgenes").unwrap();
        assert_eq!(store.state().page(&id).unwrap().slug, "cabo-virgenes");

        let again = store.create_page("cabo virgenes");
        assert!(matches!(again, Err(FolioError::Conflict(_))));
        assert!(store.create_page("!!!").is_err());
    }

    #[test]
    fn test_set_page_slug_conflict() {
        let mut store = ContentStore::new(demo_state(), BlockRegistry::builtin());
        assert!(store.set_page_slug("about", "index").is_err());
        store.set_page_slug("about", "About Us").unwrap();
        assert_eq!(store.state().page("about").unwrap().slug, "about-us");
        // Re-setting a page's own slug is fine.
        store.set_page_slug("about", "about-us").unwrap();
    }

    #[test]
    fn test_picker_pick_invokes_once_and_closes() {
        let mut store = ContentStore::new(demo_state(), BlockRegistry::builtin());
        let id = store.layout()[0].id.clone();
        store.select_block(&id).unwrap();

        store.open_picker(PickerKind::Media, attach_to_selected(PickerKind::Media));
        assert_eq!(store.picker_kind(), Some(PickerKind::Media));
        store.pick("m3").unwrap();

        assert_eq!(store.draft().unwrap().image_id.as_deref(), Some("m3"));
        assert_eq!(store.picker_kind(), None);
        // A second pick has no open picker to deliver to.
        assert!(store.pick("m4").is_err());
        assert_eq!(store.draft().unwrap().image_id.as_deref(), Some("m3"));
    }

    #[test]
    fn test_picker_cancel_leaves_reference() {
        let mut store = ContentStore::new(demo_state(), BlockRegistry::builtin());
        store.set_active_page("about").unwrap();
        let id = store.layout()[0].id.clone();
        store.select_block(&id).unwrap();

        store.open_picker(PickerKind::Document, attach_to_selected(PickerKind::Document));
        store.close_picker();

        assert_eq!(store.draft().unwrap().doc_id.as_deref(), Some("d2"));
        assert_eq!(store.draft().unwrap().image_id.as_deref(), Some("m7"));
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_pick_unknown_candidate_keeps_picker_open() {
        let mut store = ContentStore::new(demo_state(), BlockRegistry::builtin());
        let id = store.layout()[0].id.clone();
        store.select_block(&id).unwrap();
        store.open_picker(PickerKind::Media, attach_to_selected(PickerKind::Media));

        assert!(store.pick("ghost").is_err());
        assert_eq!(store.picker_kind(), Some(PickerKind::Media));
    }

    #[test]
    fn test_remove_media_keeps_block_reference() {
        let mut store = ContentStore::new(demo_state(), BlockRegistry::builtin());
        store.remove_media("m7").unwrap();
        let about = store.state().page("about").unwrap();
        assert_eq!(about.layout[0].image_id.as_deref(), Some("m7"));
    }

    #[test]
    fn test_news_and_seo_updates() {
        let mut store = ContentStore::new(demo_state(), BlockRegistry::builtin());
        let id = store.add_news("Launch", "2026-02-01");
        store
            .update_news(
                &id,
                NewsPatch {
                    status: Some(NewsStatus::Published),
                    excerpt: Some("Short".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let item = store.state().news.iter().find(|n| n.id == id).unwrap();
        assert_eq!(item.status, NewsStatus::Published);
        assert_eq!(item.excerpt, "Short");
        assert_eq!(item.title, "Launch");

        assert!(store.update_news("ghost", NewsPatch::default()).is_err());

        store.update_seo(Some("New title"), None);
        store.set_page_seo_title("about", "About | Folio");
        assert_eq!(store.state().seo.site_title, "New title");
        assert_eq!(store.state().seo.per_page["about"].title, "About | Folio");
    }

    #[test]
    fn test_replace_state_keeps_active_page() {
        let mut store = ContentStore::new(demo_state(), BlockRegistry::builtin());
        store.set_active_page("about").unwrap();
        store.replace_state(demo_state());
        assert_eq!(store.active_page_id(), Some("about"));

        let mut other = demo_state();
        other.pages.retain(|p| p.id == "index");
        store.replace_state(other);
        assert_eq!(store.active_page_id(), Some("index"));
    }
}
