//! # Block Registry
//!
//! Static metadata for every block type: display name, category, icon and
//! the settings schema a property panel renders generically.
//!
//! The registry is consulted when blocks are created (defaults) and when a
//! type has to be validated. Settings only describe editable fields; the
//! payload structs in [`crate::block`] remain the source of truth for shape.

use crate::block::{BlockData, BlockType};
use crate::mutations::MutationError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockCategory {
    Basic,
    Media,
    Interactive,
    Layout,
    Advanced,
}

impl BlockCategory {
    pub const ALL: [BlockCategory; 5] = [
        BlockCategory::Basic,
        BlockCategory::Media,
        BlockCategory::Interactive,
        BlockCategory::Layout,
        BlockCategory::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockCategory::Basic => "basic",
            BlockCategory::Media => "media",
            BlockCategory::Interactive => "interactive",
            BlockCategory::Layout => "layout",
            BlockCategory::Advanced => "advanced",
        }
    }
}

impl fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown block category: {0}")]
pub struct UnknownCategory(pub String);

/// Category selector for catalog listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(BlockCategory),
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(CategoryFilter::All);
        }

        BlockCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .map(CategoryFilter::Only)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Input control used to edit a setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    Text,
    Textarea,
    Number,
    Boolean,
    Select,
    Color,
    Url,
    /// Editable list of entries
    Options,
}

/// One editable field of a block type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingField {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: SettingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl SettingField {
    pub const fn new(name: &'static str, label: &'static str, kind: SettingKind) -> Self {
        Self {
            name,
            label,
            kind,
            options: None,
            min: None,
            max: None,
        }
    }

    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, SettingKind::Text)
    }

    pub const fn textarea(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, SettingKind::Textarea)
    }

    pub const fn url(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, SettingKind::Url)
    }

    pub const fn boolean(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, SettingKind::Boolean)
    }

    pub const fn color(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, SettingKind::Color)
    }

    pub const fn list(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, SettingKind::Options)
    }

    pub const fn number(name: &'static str, label: &'static str, min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::new(name, label, SettingKind::Number)
        }
    }

    pub const fn select(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            options: Some(options),
            ..Self::new(name, label, SettingKind::Select)
        }
    }
}

/// Registry entry for one block type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockDefinition {
    /// `None` only for the [`UNKNOWN`] sentinel
    #[serde(rename = "type")]
    pub block_type: Option<BlockType>,
    pub name: &'static str,
    pub description: &'static str,
    pub category: BlockCategory,
    pub icon: &'static str,
    pub settings: Vec<SettingField>,
}

/// Returned for type names the registry doesn't know, so renderers can show
/// a fallback instead of failing.
pub static UNKNOWN: BlockDefinition = BlockDefinition {
    block_type: None,
    name: "Unknown block",
    description: "This block type is not supported by this version of the editor",
    category: BlockCategory::Advanced,
    icon: "help-circle",
    settings: Vec::new(),
};

impl BlockDefinition {
    pub fn new(
        block_type: BlockType,
        name: &'static str,
        description: &'static str,
        category: BlockCategory,
        icon: &'static str,
    ) -> Self {
        Self {
            block_type: Some(block_type),
            name,
            description,
            category,
            icon,
            settings: Vec::new(),
        }
    }

    pub fn setting(mut self, field: SettingField) -> Self {
        self.settings.push(field);
        self
    }

    pub fn is_unknown(&self) -> bool {
        self.block_type.is_none()
    }

    pub fn type_name(&self) -> &'static str {
        self.block_type.map(BlockType::as_str).unwrap_or("unknown")
    }

    /// Payload a freshly added block of this type starts with
    pub fn default_data(&self) -> Option<BlockData> {
        self.block_type.map(BlockData::default_for)
    }
}

/// Ordered type → definition table
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    definitions: Vec<BlockDefinition>,
}

impl BlockRegistry {
    /// Empty registry (no type can be added)
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in block type
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for definition in standard_definitions() {
            registry.register(definition);
        }
        registry
    }

    /// Register a definition, replacing an existing one for the same type
    /// in place so declaration order is kept.
    ///
    /// Sentinel definitions (no type) are ignored.
    pub fn register(&mut self, definition: BlockDefinition) {
        let Some(block_type) = definition.block_type else {
            return;
        };

        match self
            .definitions
            .iter_mut()
            .find(|d| d.block_type == Some(block_type))
        {
            Some(existing) => *existing = definition,
            None => self.definitions.push(definition),
        }
    }

    pub fn get(&self, block_type: BlockType) -> Option<&BlockDefinition> {
        self.definitions
            .iter()
            .find(|d| d.block_type == Some(block_type))
    }

    pub fn contains(&self, block_type: BlockType) -> bool {
        self.get(block_type).is_some()
    }

    /// Look up by type name; never fails
    pub fn definition(&self, type_name: &str) -> &BlockDefinition {
        type_name
            .parse::<BlockType>()
            .ok()
            .and_then(|t| self.get(t))
            .unwrap_or(&UNKNOWN)
    }

    /// Definitions in declaration order, optionally narrowed to one category
    pub fn list_by_category(&self, filter: CategoryFilter) -> Vec<&BlockDefinition> {
        self.definitions
            .iter()
            .filter(|d| match filter {
                CategoryFilter::All => true,
                CategoryFilter::Only(category) => d.category == category,
            })
            .collect()
    }

    /// Default payload for a registered type
    pub fn default_data(&self, block_type: BlockType) -> Result<BlockData, MutationError> {
        self.get(block_type)
            .and_then(BlockDefinition::default_data)
            .ok_or_else(|| MutationError::UnknownBlockType(block_type.as_str().to_string()))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockDefinition> {
        self.definitions.iter()
    }
}

const ALIGNMENTS: &[&str] = &["left", "center", "right"];
const LIST_STYLES: &[&str] = &["bullet", "numbered"];
const DIVIDER_STYLES: &[&str] = &["solid", "dashed", "dotted"];
const CODE_LANGUAGES: &[&str] = &[
    "plaintext",
    "javascript",
    "typescript",
    "python",
    "rust",
    "html",
    "css",
    "sql",
];

fn standard_definitions() -> Vec<BlockDefinition> {
    use BlockCategory::*;

    vec![
        BlockDefinition::new(BlockType::Text, "Text", "Paragraph of rich text", Basic, "type")
            .setting(SettingField::textarea("content", "Content")),
        BlockDefinition::new(BlockType::Heading, "Heading", "Section title", Basic, "heading")
            .setting(SettingField::text("text", "Text"))
            .setting(SettingField::number("level", "Level", 1, 6))
            .setting(SettingField::select("align", "Alignment", ALIGNMENTS)),
        BlockDefinition::new(BlockType::Image, "Image", "Picture with caption", Media, "image")
            .setting(SettingField::url("url", "Image URL"))
            .setting(SettingField::text("alt", "Alt text"))
            .setting(SettingField::text("caption", "Caption"))
            .setting(SettingField::number("width", "Width", 1, 4000)),
        BlockDefinition::new(BlockType::Video, "Video", "Hosted or uploaded video", Media, "video")
            .setting(SettingField::url("url", "Video URL"))
            .setting(SettingField::text("caption", "Caption"))
            .setting(SettingField::boolean("autoplay", "Autoplay"))
            .setting(SettingField::boolean("showControls", "Show controls")),
        BlockDefinition::new(
            BlockType::Quiz,
            "Quiz",
            "Multiple-choice knowledge check",
            Interactive,
            "help-circle",
        )
        .setting(SettingField::textarea("question", "Question"))
        .setting(SettingField::list("options", "Answers"))
        .setting(SettingField::textarea("explanation", "Explanation"))
        .setting(SettingField::boolean("allowRetry", "Allow retry")),
        BlockDefinition::new(BlockType::List, "List", "Bulleted or numbered list", Basic, "list")
            .setting(SettingField::select("style", "Style", LIST_STYLES))
            .setting(SettingField::list("items", "Items")),
        BlockDefinition::new(BlockType::Table, "Table", "Rows and columns", Advanced, "table")
            .setting(SettingField::list("headers", "Headers"))
            .setting(SettingField::boolean("striped", "Striped rows")),
        BlockDefinition::new(BlockType::Link, "Link", "Link to a resource", Basic, "link")
            .setting(SettingField::url("url", "URL"))
            .setting(SettingField::text("label", "Label"))
            .setting(SettingField::boolean("openInNewTab", "Open in new tab")),
        BlockDefinition::new(BlockType::Divider, "Divider", "Horizontal rule", Layout, "minus")
            .setting(SettingField::select("style", "Style", DIVIDER_STYLES))
            .setting(SettingField::number("thickness", "Thickness", 1, 10))
            .setting(SettingField::color("color", "Color")),
        BlockDefinition::new(
            BlockType::Spacer,
            "Spacer",
            "Vertical whitespace",
            Layout,
            "move-vertical",
        )
        .setting(SettingField::number("height", "Height", 8, 400)),
        BlockDefinition::new(BlockType::Code, "Code", "Highlighted code snippet", Advanced, "code")
            .setting(SettingField::select("language", "Language", CODE_LANGUAGES))
            .setting(SettingField::textarea("code", "Code"))
            .setting(SettingField::boolean("showLineNumbers", "Line numbers")),
        BlockDefinition::new(
            BlockType::Embed,
            "Embed",
            "External page in a frame",
            Advanced,
            "globe",
        )
        .setting(SettingField::url("url", "Embed URL"))
        .setting(SettingField::number("height", "Height", 100, 2000)),
        BlockDefinition::new(BlockType::Pdf, "PDF", "Inline PDF viewer", Media, "file-text")
            .setting(SettingField::url("url", "PDF URL"))
            .setting(SettingField::text("title", "Title"))
            .setting(SettingField::number("height", "Height", 200, 2000)),
        BlockDefinition::new(
            BlockType::PageBreak,
            "Page break",
            "Starts a new page",
            Layout,
            "scissors",
        )
        .setting(SettingField::color("backgroundColor", "Page background"))
        .setting(SettingField::boolean("showPageNumber", "Show page number")),
        BlockDefinition::new(
            BlockType::Scorm,
            "SCORM",
            "SCORM package player",
            Interactive,
            "package",
        )
        .setting(SettingField::url("packageUrl", "Package URL"))
        .setting(SettingField::text("title", "Title"))
        .setting(SettingField::number("height", "Height", 200, 2000)),
        BlockDefinition::new(
            BlockType::Presentation,
            "Presentation",
            "Slide deck",
            Media,
            "presentation",
        )
        .setting(SettingField::url("url", "Slides URL"))
        .setting(SettingField::text("title", "Title"))
        .setting(SettingField::boolean("autoplay", "Autoplay"))
        .setting(SettingField::number("intervalSeconds", "Seconds per slide", 1, 60)),
    ]
}
