//! Editing of structured block content.
//!
//! Every edit produces a complete replacement content object and hands it to
//! the change callback exactly once. Listeners never receive partial patches.

use serde_json::{Map, Value};

use crate::block::{ContainerContent, Layout, SpacingField};

pub type ContentMap = Map<String, Value>;

const CHILDREN_KEY: &str = "children";
const SPACING_KEY: &str = "spacing";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    Layout,
    Spacing,
}

impl Panel {
    pub const ALL: &'static [Panel] = &[Self::Layout, Self::Spacing];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Layout => "Layout",
            Self::Spacing => "Spacing",
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::Layout => LAYOUT_FIELDS,
            Self::Spacing => SPACING_FIELDS,
        }
    }
}

/// Describes one editable field for whatever front end lays out the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub hint: &'static str,
}

pub const LAYOUT_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "layout",
        label: "Layout",
        hint: "columns or rows",
    },
    FieldSpec {
        key: "columns",
        label: "Columns",
        hint: "1-6, used by the columns layout",
    },
    FieldSpec {
        key: "gap",
        label: "Gap",
        hint: "CSS length, e.g. 1rem",
    },
];

pub const SPACING_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "paddingTop",
        label: "Padding top",
        hint: "CSS length",
    },
    FieldSpec {
        key: "paddingBottom",
        label: "Padding bottom",
        hint: "CSS length",
    },
    FieldSpec {
        key: "paddingLeft",
        label: "Padding left",
        hint: "CSS length",
    },
    FieldSpec {
        key: "paddingRight",
        label: "Padding right",
        hint: "CSS length",
    },
    FieldSpec {
        key: "marginTop",
        label: "Margin top",
        hint: "CSS length",
    },
    FieldSpec {
        key: "marginBottom",
        label: "Margin bottom",
        hint: "CSS length",
    },
    FieldSpec {
        key: "marginLeft",
        label: "Margin left",
        hint: "CSS length",
    },
    FieldSpec {
        key: "marginRight",
        label: "Margin right",
        hint: "CSS length",
    },
];

/// Editor over a block's content object.
///
/// Unknown keys are preserved. `children` is never written: child membership
/// is owned by the page's block list, not by the container's own fields.
pub struct BlockEditor<F>
where
    F: FnMut(&ContentMap),
{
    content: ContentMap,
    on_change: F,
}

impl<F> BlockEditor<F>
where
    F: FnMut(&ContentMap),
{
    /// Start editing `content`. A non-object value starts from an empty object.
    pub fn new(content: &Value, on_change: F) -> Self {
        Self {
            content: content.as_object().cloned().unwrap_or_default(),
            on_change,
        }
    }

    pub fn content(&self) -> &ContentMap {
        &self.content
    }

    pub fn into_content(self) -> Value {
        Value::Object(self.content)
    }

    /// Shallow-merge `partial` into the content and emit the result.
    pub fn update_content(&mut self, partial: ContentMap) {
        for (key, value) in partial {
            if key == CHILDREN_KEY {
                continue;
            }
            self.content.insert(key, value);
        }
        (self.on_change)(&self.content);
    }

    /// Set one spacing field, keeping the other seven.
    pub fn update_spacing(&mut self, field: SpacingField, value: impl Into<String>) {
        let mut spacing = self
            .content
            .get(SPACING_KEY)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        spacing.insert(field.key().to_string(), Value::String(value.into()));

        let mut partial = ContentMap::new();
        partial.insert(SPACING_KEY.to_string(), Value::Object(spacing));
        self.update_content(partial);
    }

    /// Switching away from `columns` keeps the stored column count.
    pub fn set_layout(&mut self, layout: Layout) {
        self.update_content(single("layout", Value::from(layout.as_str())));
    }

    pub fn set_columns(&mut self, columns: u8) {
        self.update_content(single("columns", Value::from(columns)));
    }

    pub fn set_gap(&mut self, gap: impl Into<String>) {
        self.update_content(single("gap", Value::String(gap.into())));
    }

    /// Number of nested children, for display only.
    pub fn children_count(&self) -> usize {
        self.content
            .get(CHILDREN_KEY)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Typed view of the current content as a container.
    pub fn as_container(&self) -> Option<ContainerContent> {
        serde_json::from_value(Value::Object(self.content.clone())).ok()
    }
}

fn single(key: &str, value: Value) -> ContentMap {
    let mut map = ContentMap::new();
    map.insert(key.to_string(), value);
    map
}
