pub mod block;
pub mod cache;
pub mod editor;
pub mod error;
pub mod header;
pub mod render;
pub mod resolve;
pub mod tree;

pub use block::{BlockContent, BlockKind, PageBlock};
pub use cache::QueryCache;
pub use error::{ContentError, FieldError};
pub use header::{HeaderForm, HeaderStore, PageHeader, PageKey};
pub use render::{Markup, render, render_blocks};
pub use resolve::{DocumentMeta, Page, PageSource, PageView, resolve_page};
pub use tree::BlockTree;
