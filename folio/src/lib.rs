pub mod model;
pub mod registry;
pub mod store;
pub mod validation;
pub mod canvas;
pub mod panel;
pub mod picker;
pub mod storage;
pub mod persistence;
pub mod deploy;
pub mod auth;
pub mod console;
pub mod error;
mod util;

pub use error::{FolioError, Result};
pub use model::{Block, ContentDocument, Page, SiteState};
pub use registry::BlockRegistry;
pub use store::ContentStore;
pub use console::Console;
