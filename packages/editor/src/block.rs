//! # Blocks
//!
//! A lesson is an ordered sequence of typed blocks. Every block type owns a
//! payload struct with its own fields; there is no shared schema.
//!
//! ## Persisted shape
//!
//! ```text
//! { "id": "3f2a91c0-4", "type": "page_break", "data": { "backgroundColor": "#eee" } }
//! ```
//!
//! Payload field names are camelCase. Missing fields take the registry
//! defaults. Fields a payload doesn't have are kept on the block as `extra`
//! and written back on save. A block whose type this build doesn't know
//! loads as [`BlockData::Unknown`] and round-trips verbatim.

use crate::ids::BlockId;
use crate::mutations::MutationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Closed set of block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Text,
    Heading,
    Image,
    Video,
    Quiz,
    List,
    Table,
    Link,
    Divider,
    Spacer,
    Code,
    Embed,
    Pdf,
    PageBreak,
    Scorm,
    Presentation,
}

impl BlockType {
    /// All types, in declaration order
    pub const ALL: [BlockType; 16] = [
        BlockType::Text,
        BlockType::Heading,
        BlockType::Image,
        BlockType::Video,
        BlockType::Quiz,
        BlockType::List,
        BlockType::Table,
        BlockType::Link,
        BlockType::Divider,
        BlockType::Spacer,
        BlockType::Code,
        BlockType::Embed,
        BlockType::Pdf,
        BlockType::PageBreak,
        BlockType::Scorm,
        BlockType::Presentation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Heading => "heading",
            BlockType::Image => "image",
            BlockType::Video => "video",
            BlockType::Quiz => "quiz",
            BlockType::List => "list",
            BlockType::Table => "table",
            BlockType::Link => "link",
            BlockType::Divider => "divider",
            BlockType::Spacer => "spacer",
            BlockType::Code => "code",
            BlockType::Embed => "embed",
            BlockType::Pdf => "pdf",
            BlockType::PageBreak => "page_break",
            BlockType::Scorm => "scorm",
            BlockType::Presentation => "presentation",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MutationError::UnknownBlockType(s.to_string()))
    }
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    #[default]
    Bullet,
    Numbered,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextData {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeadingData {
    pub text: String,
    pub level: u8,
    pub align: Alignment,
}

impl Default for HeadingData {
    fn default() -> Self {
        Self {
            text: String::new(),
            level: 2,
            align: Alignment::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageData {
    pub url: String,
    pub alt: String,
    pub caption: String,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoData {
    pub url: String,
    pub caption: String,
    pub autoplay: bool,
    pub show_controls: bool,
}

impl Default for VideoData {
    fn default() -> Self {
        Self {
            url: String::new(),
            caption: String::new(),
            autoplay: false,
            show_controls: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuizOption {
    pub text: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuizData {
    pub question: String,
    pub options: Vec<QuizOption>,
    pub explanation: String,
    pub allow_retry: bool,
}

impl Default for QuizData {
    fn default() -> Self {
        Self {
            question: String::new(),
            options: vec![
                QuizOption {
                    text: "Option 1".to_string(),
                    correct: true,
                },
                QuizOption {
                    text: "Option 2".to_string(),
                    correct: false,
                },
            ],
            explanation: String::new(),
            allow_retry: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListData {
    pub style: ListStyle,
    pub items: Vec<String>,
}

impl Default for ListData {
    fn default() -> Self {
        Self {
            style: ListStyle::Bullet,
            items: vec![String::new()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub striped: bool,
}

impl Default for TableData {
    fn default() -> Self {
        Self {
            headers: vec!["Column 1".to_string(), "Column 2".to_string()],
            rows: vec![vec![String::new(), String::new()]],
            striped: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkData {
    pub url: String,
    pub label: String,
    pub open_in_new_tab: bool,
}

impl Default for LinkData {
    fn default() -> Self {
        Self {
            url: String::new(),
            label: String::new(),
            open_in_new_tab: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DividerData {
    pub style: String,
    pub thickness: u32,
    pub color: String,
}

impl Default for DividerData {
    fn default() -> Self {
        Self {
            style: "solid".to_string(),
            thickness: 1,
            color: "#e5e7eb".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpacerData {
    pub height: u32,
}

impl Default for SpacerData {
    fn default() -> Self {
        Self { height: 32 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodeData {
    pub language: String,
    pub code: String,
    pub show_line_numbers: bool,
}

impl Default for CodeData {
    fn default() -> Self {
        Self {
            language: "plaintext".to_string(),
            code: String::new(),
            show_line_numbers: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbedData {
    pub url: String,
    pub height: u32,
}

impl Default for EmbedData {
    fn default() -> Self {
        Self {
            url: String::new(),
            height: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PdfData {
    pub url: String,
    pub title: String,
    pub height: u32,
}

impl Default for PdfData {
    fn default() -> Self {
        Self {
            url: String::new(),
            title: String::new(),
            height: 600,
        }
    }
}

/// Settings of the page a page break opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageBreakData {
    pub background_color: String,
    pub show_page_number: bool,
}

impl Default for PageBreakData {
    fn default() -> Self {
        Self {
            background_color: crate::pages::DEFAULT_PAGE_BACKGROUND.to_string(),
            show_page_number: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScormData {
    pub package_url: String,
    pub title: String,
    pub height: u32,
}

impl Default for ScormData {
    fn default() -> Self {
        Self {
            package_url: String::new(),
            title: String::new(),
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PresentationData {
    pub url: String,
    pub title: String,
    pub autoplay: bool,
    pub interval_seconds: u32,
}

impl Default for PresentationData {
    fn default() -> Self {
        Self {
            url: String::new(),
            title: String::new(),
            autoplay: false,
            interval_seconds: 5,
        }
    }
}

// ============================================================================
// BlockData
// ============================================================================

/// Block payload, keyed by block type
#[derive(Debug, Clone, PartialEq)]
pub enum BlockData {
    Text(TextData),
    Heading(HeadingData),
    Image(ImageData),
    Video(VideoData),
    Quiz(QuizData),
    List(ListData),
    Table(TableData),
    Link(LinkData),
    Divider(DividerData),
    Spacer(SpacerData),
    Code(CodeData),
    Embed(EmbedData),
    Pdf(PdfData),
    PageBreak(PageBreakData),
    Scorm(ScormData),
    Presentation(PresentationData),

    /// Type this build doesn't know. Read-only: it can be moved or
    /// deleted, never edited or duplicated.
    Unknown {
        type_name: String,
        data: Map<String, Value>,
    },
}

impl BlockData {
    /// Default payload for a block type
    pub fn default_for(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Text => BlockData::Text(TextData::default()),
            BlockType::Heading => BlockData::Heading(HeadingData::default()),
            BlockType::Image => BlockData::Image(ImageData::default()),
            BlockType::Video => BlockData::Video(VideoData::default()),
            BlockType::Quiz => BlockData::Quiz(QuizData::default()),
            BlockType::List => BlockData::List(ListData::default()),
            BlockType::Table => BlockData::Table(TableData::default()),
            BlockType::Link => BlockData::Link(LinkData::default()),
            BlockType::Divider => BlockData::Divider(DividerData::default()),
            BlockType::Spacer => BlockData::Spacer(SpacerData::default()),
            BlockType::Code => BlockData::Code(CodeData::default()),
            BlockType::Embed => BlockData::Embed(EmbedData::default()),
            BlockType::Pdf => BlockData::Pdf(PdfData::default()),
            BlockType::PageBreak => BlockData::PageBreak(PageBreakData::default()),
            BlockType::Scorm => BlockData::Scorm(ScormData::default()),
            BlockType::Presentation => BlockData::Presentation(PresentationData::default()),
        }
    }

    /// Registered type, `None` for [`BlockData::Unknown`]
    pub fn block_type(&self) -> Option<BlockType> {
        let block_type = match self {
            BlockData::Text(_) => BlockType::Text,
            BlockData::Heading(_) => BlockType::Heading,
            BlockData::Image(_) => BlockType::Image,
            BlockData::Video(_) => BlockType::Video,
            BlockData::Quiz(_) => BlockType::Quiz,
            BlockData::List(_) => BlockType::List,
            BlockData::Table(_) => BlockType::Table,
            BlockData::Link(_) => BlockType::Link,
            BlockData::Divider(_) => BlockType::Divider,
            BlockData::Spacer(_) => BlockType::Spacer,
            BlockData::Code(_) => BlockType::Code,
            BlockData::Embed(_) => BlockType::Embed,
            BlockData::Pdf(_) => BlockType::Pdf,
            BlockData::PageBreak(_) => BlockType::PageBreak,
            BlockData::Scorm(_) => BlockType::Scorm,
            BlockData::Presentation(_) => BlockType::Presentation,
            BlockData::Unknown { .. } => return None,
        };

        Some(block_type)
    }

    /// Persisted type name
    pub fn type_name(&self) -> &str {
        match self {
            BlockData::Unknown { type_name, .. } => type_name,
            other => other.block_type().map_or("", BlockType::as_str),
        }
    }

    /// Decode a persisted field map.
    ///
    /// Fields the type doesn't have are handed back untouched.
    pub fn from_fields(
        block_type: BlockType,
        fields: Map<String, Value>,
    ) -> Result<(Self, Map<String, Value>), MutationError> {
        let known = Self::default_for(block_type).fields();
        let (fields, extra): (Map<String, Value>, Map<String, Value>) = fields
            .into_iter()
            .partition(|(key, _)| known.contains_key(key));

        if !extra.is_empty() {
            tracing::debug!(%block_type, fields = extra.len(), "Keeping unrecognized block fields");
        }

        Ok((Self::decode(block_type, fields)?, extra))
    }

    /// Payload as a field map (every field present)
    pub fn fields(&self) -> Map<String, Value> {
        let value = match self {
            BlockData::Text(d) => serde_json::to_value(d),
            BlockData::Heading(d) => serde_json::to_value(d),
            BlockData::Image(d) => serde_json::to_value(d),
            BlockData::Video(d) => serde_json::to_value(d),
            BlockData::Quiz(d) => serde_json::to_value(d),
            BlockData::List(d) => serde_json::to_value(d),
            BlockData::Table(d) => serde_json::to_value(d),
            BlockData::Link(d) => serde_json::to_value(d),
            BlockData::Divider(d) => serde_json::to_value(d),
            BlockData::Spacer(d) => serde_json::to_value(d),
            BlockData::Code(d) => serde_json::to_value(d),
            BlockData::Embed(d) => serde_json::to_value(d),
            BlockData::Pdf(d) => serde_json::to_value(d),
            BlockData::PageBreak(d) => serde_json::to_value(d),
            BlockData::Scorm(d) => serde_json::to_value(d),
            BlockData::Presentation(d) => serde_json::to_value(d),
            BlockData::Unknown { data, .. } => return data.clone(),
        };

        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Shallow merge: keys in `partial` replace existing fields, the rest
    /// are kept. Every key must name a field of this block type.
    pub fn merged(&self, partial: &Map<String, Value>) -> Result<Self, MutationError> {
        let Some(block_type) = self.block_type() else {
            return Err(MutationError::UnknownBlockType(self.type_name().to_string()));
        };
        let mut fields = self.fields();

        for (key, value) in partial {
            if !fields.contains_key(key) {
                return Err(MutationError::InvalidBlockData {
                    block_type,
                    reason: format!("unknown field `{}`", key),
                });
            }
            fields.insert(key.clone(), value.clone());
        }

        Self::decode(block_type, fields)
    }

    fn decode(block_type: BlockType, fields: Map<String, Value>) -> Result<Self, MutationError> {
        let data = match block_type {
            BlockType::Text => BlockData::Text(decode_payload(block_type, fields)?),
            BlockType::Heading => BlockData::Heading(decode_payload(block_type, fields)?),
            BlockType::Image => BlockData::Image(decode_payload(block_type, fields)?),
            BlockType::Video => BlockData::Video(decode_payload(block_type, fields)?),
            BlockType::Quiz => BlockData::Quiz(decode_payload(block_type, fields)?),
            BlockType::List => BlockData::List(decode_payload(block_type, fields)?),
            BlockType::Table => BlockData::Table(decode_payload(block_type, fields)?),
            BlockType::Link => BlockData::Link(decode_payload(block_type, fields)?),
            BlockType::Divider => BlockData::Divider(decode_payload(block_type, fields)?),
            BlockType::Spacer => BlockData::Spacer(decode_payload(block_type, fields)?),
            BlockType::Code => BlockData::Code(decode_payload(block_type, fields)?),
            BlockType::Embed => BlockData::Embed(decode_payload(block_type, fields)?),
            BlockType::Pdf => BlockData::Pdf(decode_payload(block_type, fields)?),
            BlockType::PageBreak => BlockData::PageBreak(decode_payload(block_type, fields)?),
            BlockType::Scorm => BlockData::Scorm(decode_payload(block_type, fields)?),
            BlockType::Presentation => {
                BlockData::Presentation(decode_payload(block_type, fields)?)
            }
        };

        Ok(data)
    }
}

fn decode_payload<T: DeserializeOwned>(
    block_type: BlockType,
    fields: Map<String, Value>,
) -> Result<T, MutationError> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| MutationError::InvalidBlockData {
        block_type,
        reason: e.to_string(),
    })
}

// ============================================================================
// Block
// ============================================================================

/// Atomic editable unit of a lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub id: BlockId,
    pub data: BlockData,

    /// Persisted fields the payload doesn't have, written back on save
    pub extra: Map<String, Value>,
}

impl Block {
    pub fn new(id: BlockId, data: BlockData) -> Self {
        Self {
            id,
            data,
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn block_type(&self) -> Option<BlockType> {
        self.data.block_type()
    }

    pub fn type_name(&self) -> &str {
        self.data.type_name()
    }

    /// Page breaks are structure, not content
    pub fn is_page_break(&self) -> bool {
        matches!(self.data, BlockData::PageBreak(_))
    }
}

#[derive(Serialize, Deserialize)]
struct RawBlock {
    id: BlockId,
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    data: Map<String, Value>,
}

impl TryFrom<RawBlock> for Block {
    type Error = MutationError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let Ok(block_type) = raw.block_type.parse::<BlockType>() else {
            tracing::warn!(
                block = %raw.id,
                block_type = %raw.block_type,
                "Unrecognized block type, keeping it as opaque data"
            );
            let data = BlockData::Unknown {
                type_name: raw.block_type,
                data: raw.data,
            };
            return Ok(Block::new(raw.id, data));
        };

        let (data, extra) = BlockData::from_fields(block_type, raw.data)?;
        Ok(Block::new(raw.id, data).with_extra(extra))
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        let block_type = block.type_name().to_string();
        let mut data = block.data.fields();
        for (key, value) in block.extra {
            data.entry(key).or_insert(value);
        }

        RawBlock {
            id: block.id,
            block_type,
            data,
        }
    }
}
