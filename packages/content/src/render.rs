//! HTML rendering of page blocks.
//!
//! Dispatch is by type tag. Unrecognized tags and payloads of the wrong shape
//! render nothing and never affect sibling blocks.

use std::fmt::{self, Write};

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Serialize;
use tracing::debug;

use crate::block::{
    BlockContent, ContainerContent, CtaContent, GalleryContent, ImageContent, Layout, PageBlock,
    TextContent, VideoContent,
};
use crate::tree::{BlockTree, NodeId};

const YOUTUBE_EMBED: &str = "https://www.youtube.com/embed/";
const VIMEO_EMBED: &str = "https://player.vimeo.com/video/";
/// Identifier used when a YouTube URL carries no `v` parameter.
const MISSING_VIDEO_ID: &str = "undefined";

const DEFAULT_GAP: &str = "1rem";

/// Gallery column count to grid class. Anything else uses the 3-column layout.
const GALLERY_COLUMNS: &[(i64, &str)] = &[
    (2, "grid-cols-2"),
    (3, "grid-cols-3"),
    (4, "grid-cols-4"),
];
const GALLERY_FALLBACK: &str = "grid-cols-3";

/// Rendered HTML fragment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Markup(String);

impl Markup {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a single block, including any nested container children.
pub fn render(block: &PageBlock) -> Option<Markup> {
    let tree = BlockTree::from_blocks([block.clone()]);
    tree.roots().first().and_then(|&id| render_node(&tree, id))
}

/// Render a block sequence in order, skipping unrecognized blocks.
pub fn render_blocks(blocks: &[PageBlock]) -> Vec<Markup> {
    render_tree(&BlockTree::from_blocks(blocks.to_vec()))
}

pub fn render_tree(tree: &BlockTree) -> Vec<Markup> {
    tree.roots()
        .iter()
        .filter_map(|&id| render_node(tree, id))
        .collect()
}

pub fn render_node(tree: &BlockTree, id: NodeId) -> Option<Markup> {
    let block = &tree.get(id)?.block;
    let Some(kind) = block.kind() else {
        debug!(block_id = %block.id, block_type = %block.block_type, "skipping unrecognized block type");
        return None;
    };
    let content = match BlockContent::parse(kind, &block.content_json) {
        Ok(content) => content,
        Err(e) => {
            debug!(block_id = %block.id, error = %e, "skipping block with malformed content");
            return None;
        }
    };

    let html = match content {
        BlockContent::Text(c) => render_text(&c),
        BlockContent::Image(c) => render_image(&c),
        BlockContent::Cta(c) => render_cta(&c),
        BlockContent::Gallery(c) => render_gallery(&c),
        BlockContent::Video(c) => render_video(&c),
        BlockContent::Container(c) => render_container(&c, tree, id),
    };
    Some(Markup(html))
}

// `html` is trusted: it is injected exactly as authored.
fn render_text(content: &TextContent) -> String {
    format!(r#"<div class="block block-text">{}</div>"#, content.html)
}

fn render_image(content: &ImageContent) -> String {
    let mut out = format!(
        r#"<figure class="block block-image"><img src="{}" alt="{}" loading="lazy">"#,
        encode_double_quoted_attribute(&content.image_url),
        encode_double_quoted_attribute(&content.alt),
    );
    if let Some(caption) = &content.caption {
        let _ = write!(out, "<figcaption>{}</figcaption>", encode_text(caption));
    }
    out.push_str("</figure>");
    out
}

fn render_cta(content: &CtaContent) -> String {
    let mut out = format!(
        r#"<section class="block block-cta"><h2>{}</h2>"#,
        encode_text(&content.title)
    );
    if let Some(description) = &content.description {
        let _ = write!(out, "<p>{}</p>", encode_text(description));
    }
    let target = if content.is_external() {
        r#" target="_blank" rel="noopener noreferrer""#
    } else {
        ""
    };
    let _ = write!(
        out,
        r#"<a class="button button-{}" href="{}"{}>{}</a></section>"#,
        content.variant.as_str(),
        encode_double_quoted_attribute(&content.button_url),
        target,
        encode_text(&content.button_text),
    );
    out
}

/// Grid class for a requested gallery column count.
pub fn gallery_columns_class(requested: Option<i64>) -> &'static str {
    let requested = requested.unwrap_or(3);
    GALLERY_COLUMNS
        .iter()
        .find(|(n, _)| *n == requested)
        .map(|(_, class)| *class)
        .unwrap_or(GALLERY_FALLBACK)
}

fn render_gallery(content: &GalleryContent) -> String {
    let mut out = format!(
        r#"<div class="block block-gallery grid {}">"#,
        gallery_columns_class(content.columns)
    );
    for image in &content.images {
        let _ = write!(
            out,
            r#"<figure><img src="{}" alt="{}" loading="lazy">"#,
            encode_double_quoted_attribute(&image.url),
            encode_double_quoted_attribute(image.alt.as_deref().unwrap_or("")),
        );
        if let Some(caption) = &image.caption {
            let _ = write!(out, "<figcaption>{}</figcaption>", encode_text(caption));
        }
        out.push_str("</figure>");
    }
    out.push_str("</div>");
    out
}

/// Derive a playable embed URL.
///
/// `youtu.be` short links take the path segment up to `?`, `youtube.com`
/// links take the `v` query parameter, `vimeo.com` links take the path segment
/// up to `?`. Any other URL is assumed embeddable and passed through.
pub fn embed_url(url: &str) -> String {
    if url.contains("youtu.be") {
        let id = url
            .split_once("youtu.be/")
            .map(|(_, rest)| until_query(rest))
            .unwrap_or(MISSING_VIDEO_ID);
        format!("{YOUTUBE_EMBED}{id}")
    } else if url.contains("youtube.com") {
        let id = query_param(url, "v").unwrap_or(MISSING_VIDEO_ID);
        format!("{YOUTUBE_EMBED}{id}")
    } else if url.contains("vimeo.com") {
        let id = url
            .split_once("vimeo.com/")
            .map(|(_, rest)| until_query(rest))
            .unwrap_or(MISSING_VIDEO_ID);
        format!("{VIMEO_EMBED}{id}")
    } else {
        url.to_string()
    }
}

fn until_query(s: &str) -> &str {
    s.split_once('?').map_or(s, |(head, _)| head)
}

fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    let query = query.split_once('#').map_or(query, |(head, _)| head);
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (k == key).then_some(v)
    })
}

fn render_video(content: &VideoContent) -> String {
    format!(
        r#"<div class="block block-video"><iframe src="{}" title="{}" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture" allowfullscreen></iframe></div>"#,
        encode_double_quoted_attribute(&embed_url(&content.video_url)),
        encode_double_quoted_attribute(content.title.as_deref().unwrap_or("Video")),
    )
}

/// Inline style for a container wrapper. Spacing fields that are not set are
/// left out so inherited spacing applies.
pub fn container_style(content: &ContainerContent) -> String {
    let gap = content
        .gap
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or(DEFAULT_GAP);
    let mut style = match content.layout {
        Layout::Rows => format!("display:flex;flex-direction:column;gap:{gap}"),
        Layout::Columns => format!(
            "display:grid;grid-template-columns:repeat({}, minmax(0, 1fr));gap:{gap}",
            content.column_count()
        ),
    };
    for (field, value) in content.spacing.present() {
        let _ = write!(style, ";{}:{}", field.css_property(), value);
    }
    style
}

fn render_container(content: &ContainerContent, tree: &BlockTree, id: NodeId) -> String {
    let mut out = format!(
        r#"<div class="block block-container" data-layout="{}" style="{}">"#,
        content.layout.as_str(),
        encode_double_quoted_attribute(&container_style(content)),
    );
    for &child in tree.children(id) {
        if let Some(markup) = render_node(tree, child) {
            out.push_str(markup.as_str());
        }
    }
    out.push_str("</div>");
    out
}
