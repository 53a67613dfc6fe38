// Content model: pages, blocks, assets and the persisted content document

mod demo;

pub use demo::demo_state;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Publication state of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Draft => "draft",
            PageStatus::Published => "published",
        }
    }
}

/// One content unit on a page. `props` keys are defined by the block type's
/// registry schema; values are always strings (rich text as HTML fragments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub props: BTreeMap<String, String>,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub doc_id: Option<String>,
}

impl Block {
    pub fn new(id: impl Into<String>, block_type: impl Into<String>) -> Self {
        Block {
            id: id.into(),
            block_type: block_type.into(),
            props: BTreeMap::new(),
            image_id: None,
            doc_id: None,
        }
    }

    pub fn with_prop(mut self, key: &str, value: &str) -> Self {
        self.props.insert(key.to_string(), value.to_string());
        self
    }

    /// Prop value or the empty string.
    pub fn prop(&self, key: &str) -> &str {
        self.props.get(key).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub status: PageStatus,
    pub updated_at: String,
    #[serde(default)]
    pub layout: Vec<Block>,
}

impl Page {
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.layout.iter().find(|b| b.id == id)
    }

    /// The first block of type `hero`, which is what the public site reads.
    pub fn hero(&self) -> Option<&Block> {
        self.layout.iter().find(|b| b.block_type == "hero")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub id: String,
    pub name: String,
    pub url: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub category: String,
    pub date: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewsStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub status: NewsStatus,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoPage {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeoSettings {
    #[serde(default)]
    pub site_title: String,
    #[serde(default)]
    pub site_description: String,
    #[serde(default)]
    pub per_page: BTreeMap<String, SeoPage>,
}

/// The whole in-editor model. Persisted locally and as builder state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SiteState {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub last_deploy_at: Option<String>,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub news: Vec<NewsItem>,
    #[serde(default)]
    pub media: Vec<MediaAsset>,
    #[serde(default)]
    pub docs: Vec<Document>,
    #[serde(default)]
    pub seo: SeoSettings,
}

impl SiteState {
    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn page_mut(&mut self, id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    pub fn media(&self, id: &str) -> Option<&MediaAsset> {
        self.media.iter().find(|m| m.id == id)
    }

    pub fn doc(&self, id: &str) -> Option<&Document> {
        self.docs.iter().find(|d| d.id == id)
    }
}

/// Current version of the content document layout.
pub const CONTENT_SCHEMA_VERSION: u32 = 1;

/// Hero fields as read by the public site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroContent {
    pub bg_image: String,
    pub tagline: Option<String>,
    pub title_html: String,
    pub desc_html: String,
}

impl HeroContent {
    pub fn from_block(block: &Block) -> Self {
        let subtitle = block.prop("subtitle").trim();
        HeroContent {
            bg_image: block.prop("bgImage").to_string(),
            tagline: if subtitle.is_empty() {
                None
            } else {
                Some(subtitle.to_string())
            },
            title_html: block.prop("title").to_string(),
            desc_html: block.prop("desc").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub hero: HeroContent,
}

/// The unit committed to the repository by the content proxy.
/// Only hero-block fields round-trip through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDocument {
    pub schema_version: u32,
    pub updated_at: String,
    pub pages: BTreeMap<String, PageContent>,
}

impl ContentDocument {
    /// Build the content document from every page that carries a hero block.
    pub fn from_pages(pages: &[Page], updated_at: &str) -> Self {
        let pages = pages
            .iter()
            .filter_map(|page| {
                page.hero().map(|hero| {
                    (
                        page.slug.clone(),
                        PageContent {
                            hero: HeroContent::from_block(hero),
                        },
                    )
                })
            })
            .collect();

        ContentDocument {
            schema_version: CONTENT_SCHEMA_VERSION,
            updated_at: updated_at.to_string(),
            pages,
        }
    }
}
