use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ContentError, FieldError};

/// Type tag of a page block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// Pre-sanitized HTML.
    Text,
    Image,
    /// Call to action: heading, blurb and a single link button.
    Cta,
    Gallery,
    /// Embedded YouTube/Vimeo player or any already-embeddable URL.
    Video,
    /// Lays out nested child blocks as rows or columns.
    Container,
}

impl BlockKind {
    /// All known block types.
    pub const ALL: &'static [BlockKind] = &[
        Self::Text,
        Self::Image,
        Self::Cta,
        Self::Gallery,
        Self::Video,
        Self::Container,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Cta => "cta",
            Self::Gallery => "gallery",
            Self::Video => "video",
            Self::Container => "container",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown block type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBlockKindError {
    invalid: String,
}

impl fmt::Display for ParseBlockKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid block type '{}'. Valid values: {}",
            self.invalid,
            BlockKind::ALL
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseBlockKindError {}

impl FromStr for BlockKind {
    type Err = ParseBlockKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "cta" => Ok(Self::Cta),
            "gallery" => Ok(Self::Gallery),
            "video" => Ok(Self::Video),
            "container" => Ok(Self::Container),
            _ => Err(ParseBlockKindError {
                invalid: s.to_string(),
            }),
        }
    }
}

/// One unit of page content.
///
/// The type tag is kept as the raw string so that blocks with a tag this build
/// does not know about survive a load/save cycle and are simply skipped when
/// rendered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageBlock {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, alias = "contentJson")]
    pub content_json: Value,
}

impl PageBlock {
    pub fn new(id: impl Into<String>, kind: BlockKind, content_json: Value) -> Self {
        Self {
            id: id.into(),
            block_type: kind.as_str().to_string(),
            content_json,
        }
    }

    /// The parsed type tag, or `None` for an unrecognized tag.
    pub fn kind(&self) -> Option<BlockKind> {
        self.block_type.parse().ok()
    }

    pub fn content(&self) -> Result<BlockContent, ContentError> {
        let kind = self
            .kind()
            .ok_or_else(|| ContentError::UnrecognizedBlockType(self.block_type.clone()))?;
        Ok(BlockContent::parse(kind, &self.content_json)?)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextContent {
    pub html: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageContent {
    pub image_url: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Visual style of a call-to-action button. Unknown values fall back to the
/// primary style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CtaVariant {
    Outline,
    Secondary,
    #[default]
    #[serde(other)]
    Default,
}

impl CtaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Outline => "outline",
            Self::Secondary => "secondary",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CtaContent {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub button_text: String,
    pub button_url: String,
    pub variant: CtaVariant,
}

impl CtaContent {
    /// Links are external when they start with `http`; anything else stays in-site.
    pub fn is_external(&self) -> bool {
        self.button_url.starts_with("http")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryContent {
    pub images: Vec<GalleryImage>,
    #[serde(
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub columns: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoContent {
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Columns,
    #[default]
    #[serde(other)]
    Rows,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Columns => "columns",
            Self::Rows => "rows",
        }
    }
}

/// One of the eight independently optional spacing lengths of a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpacingField {
    PaddingTop,
    PaddingBottom,
    PaddingLeft,
    PaddingRight,
    MarginTop,
    MarginBottom,
    MarginLeft,
    MarginRight,
}

impl SpacingField {
    pub const ALL: &'static [SpacingField] = &[
        Self::PaddingTop,
        Self::PaddingBottom,
        Self::PaddingLeft,
        Self::PaddingRight,
        Self::MarginTop,
        Self::MarginBottom,
        Self::MarginLeft,
        Self::MarginRight,
    ];

    /// Key inside the stored `spacing` record.
    pub fn key(&self) -> &'static str {
        match self {
            Self::PaddingTop => "paddingTop",
            Self::PaddingBottom => "paddingBottom",
            Self::PaddingLeft => "paddingLeft",
            Self::PaddingRight => "paddingRight",
            Self::MarginTop => "marginTop",
            Self::MarginBottom => "marginBottom",
            Self::MarginLeft => "marginLeft",
            Self::MarginRight => "marginRight",
        }
    }

    pub fn css_property(&self) -> &'static str {
        match self {
            Self::PaddingTop => "padding-top",
            Self::PaddingBottom => "padding-bottom",
            Self::PaddingLeft => "padding-left",
            Self::PaddingRight => "padding-right",
            Self::MarginTop => "margin-top",
            Self::MarginBottom => "margin-bottom",
            Self::MarginLeft => "margin-left",
            Self::MarginRight => "margin-right",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Spacing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_top: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_bottom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_top: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_bottom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_right: Option<String>,
}

impl Spacing {
    pub fn get(&self, field: SpacingField) -> Option<&str> {
        let value = match field {
            SpacingField::PaddingTop => &self.padding_top,
            SpacingField::PaddingBottom => &self.padding_bottom,
            SpacingField::PaddingLeft => &self.padding_left,
            SpacingField::PaddingRight => &self.padding_right,
            SpacingField::MarginTop => &self.margin_top,
            SpacingField::MarginBottom => &self.margin_bottom,
            SpacingField::MarginLeft => &self.margin_left,
            SpacingField::MarginRight => &self.margin_right,
        };
        value.as_deref()
    }

    /// Set fields in declaration order. Blank values count as unset.
    pub fn present(&self) -> impl Iterator<Item = (SpacingField, &str)> + '_ {
        SpacingField::ALL.iter().filter_map(|&field| {
            self.get(field)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (field, v))
        })
    }
}

pub const CONTAINER_COLUMNS: std::ops::RangeInclusive<i64> = 1..=6;
pub const DEFAULT_CONTAINER_COLUMNS: i64 = 2;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerContent {
    pub layout: Layout,
    #[serde(
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub columns: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<String>,
    pub spacing: Spacing,
    /// Absent means an empty container.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PageBlock>,
}

impl ContainerContent {
    /// Column count clamped to the supported range.
    pub fn column_count(&self) -> i64 {
        self.columns
            .unwrap_or(DEFAULT_CONTAINER_COLUMNS)
            .clamp(*CONTAINER_COLUMNS.start(), *CONTAINER_COLUMNS.end())
    }
}

/// Typed view of a block's `content_json`.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockContent {
    Text(TextContent),
    Image(ImageContent),
    Cta(CtaContent),
    Gallery(GalleryContent),
    Video(VideoContent),
    Container(ContainerContent),
}

impl BlockContent {
    /// Parse a payload for the given type. Missing fields take their defaults;
    /// only a field of the wrong JSON type is an error.
    pub fn parse(kind: BlockKind, json: &Value) -> Result<Self, serde_json::Error> {
        let value = if json.is_null() {
            Value::Object(Map::new())
        } else {
            json.clone()
        };
        Ok(match kind {
            BlockKind::Text => Self::Text(serde_json::from_value(value)?),
            BlockKind::Image => Self::Image(serde_json::from_value(value)?),
            BlockKind::Cta => Self::Cta(serde_json::from_value(value)?),
            BlockKind::Gallery => Self::Gallery(serde_json::from_value(value)?),
            BlockKind::Video => Self::Video(serde_json::from_value(value)?),
            BlockKind::Container => Self::Container(serde_json::from_value(value)?),
        })
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text(_) => BlockKind::Text,
            Self::Image(_) => BlockKind::Image,
            Self::Cta(_) => BlockKind::Cta,
            Self::Gallery(_) => BlockKind::Gallery,
            Self::Video(_) => BlockKind::Video,
            Self::Container(_) => BlockKind::Container,
        }
    }

    /// Required-field checks applied when content is submitted.
    pub fn validate(&self) -> Vec<FieldError> {
        fn require(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, format!("{field} is required")));
            }
        }

        let mut errors = Vec::new();
        match self {
            Self::Text(_) => {}
            Self::Image(c) => require(&mut errors, "imageUrl", &c.image_url),
            Self::Cta(c) => {
                require(&mut errors, "title", &c.title);
                require(&mut errors, "buttonText", &c.button_text);
                require(&mut errors, "buttonUrl", &c.button_url);
            }
            Self::Gallery(c) => {
                if c.images.is_empty() {
                    errors.push(FieldError::new("images", "images must not be empty"));
                } else if c.images.iter().any(|img| img.url.trim().is_empty()) {
                    errors.push(FieldError::new("images", "every image needs a url"));
                }
            }
            Self::Video(c) => require(&mut errors, "videoUrl", &c.video_url),
            Self::Container(c) => {
                if let Some(columns) = c.columns
                    && !CONTAINER_COLUMNS.contains(&columns)
                {
                    errors.push(FieldError::new("columns", "columns must be 1-6"));
                }
            }
        }
        errors
    }
}

/// Validate a block list for storage: known types, required fields, and
/// unique ids across nested container children.
pub fn validate_blocks(blocks: &[PageBlock]) -> Result<(), ContentError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (index, block) in blocks.iter().enumerate() {
        validate_block(block, &format!("blocks[{index}]"), &mut seen, &mut errors);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ContentError::Validation(errors))
    }
}

fn validate_block(
    block: &PageBlock,
    path: &str,
    seen: &mut HashSet<String>,
    errors: &mut Vec<FieldError>,
) {
    if !block.id.is_empty() && !seen.insert(block.id.clone()) {
        errors.push(FieldError::new(
            "id",
            format!("{path}: duplicate block id '{}'", block.id),
        ));
    }
    let Some(kind) = block.kind() else {
        errors.push(FieldError::new(
            "type",
            format!("{path}: unknown block type '{}'", block.block_type),
        ));
        return;
    };
    let content = match BlockContent::parse(kind, &block.content_json) {
        Ok(content) => content,
        Err(e) => {
            errors.push(FieldError::new("content_json", format!("{path}: {e}")));
            return;
        }
    };
    for err in content.validate() {
        errors.push(FieldError::new(err.field, format!("{path}: {}", err.message)));
    }
    if let BlockContent::Container(container) = content {
        for (index, child) in container.children.iter().enumerate() {
            validate_block(child, &format!("{path}.children[{index}]"), seen, errors);
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

/// Form inputs often store numbers as strings. Anything unparseable is `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
