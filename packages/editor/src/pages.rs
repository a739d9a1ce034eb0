//! # Page Partitioning
//!
//! Pages are a derived view over a lesson's blocks and are never stored.
//!
//! ```text
//! blocks:  [text] [page_break bg=#eee] [text] [text]
//! pages:   └─ 1 ─┘                     └──── 2 ────┘
//!          #ffffff                      #eee
//! ```
//!
//! A page break describes the page it opens. The first page has no
//! sentinel and uses the defaults. A trailing page is only emitted when it
//! has content, so an empty lesson has no pages at all.

use crate::block::{Block, BlockData};
use crate::ids::BlockId;

pub const DEFAULT_PAGE_BACKGROUND: &str = "#ffffff";

/// Contiguous run of content blocks
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    /// 1-based page number
    pub number: usize,
    pub background_color: &'a str,
    pub show_page_number: bool,
    /// Page break that opened this page (`None` for the first page)
    pub opened_by: Option<&'a BlockId>,
    pub blocks: Vec<&'a Block>,
}

impl<'a> Page<'a> {
    fn first() -> Self {
        Self {
            number: 1,
            background_color: DEFAULT_PAGE_BACKGROUND,
            show_page_number: true,
            opened_by: None,
            blocks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_ids(&self) -> impl Iterator<Item = &'a BlockId> + '_ {
        self.blocks.iter().map(|&b| &b.id)
    }
}

/// Partition blocks into pages. Pure; safe to call as often as needed.
pub fn compute_pages(blocks: &[Block]) -> Vec<Page<'_>> {
    let mut pages = Vec::new();
    let mut current = Page::first();

    for block in blocks {
        match &block.data {
            BlockData::PageBreak(settings) => {
                let background_color = if settings.background_color.is_empty() {
                    DEFAULT_PAGE_BACKGROUND
                } else {
                    settings.background_color.as_str()
                };

                let next = Page {
                    number: current.number + 1,
                    background_color,
                    show_page_number: settings.show_page_number,
                    opened_by: Some(&block.id),
                    blocks: Vec::new(),
                };
                pages.push(std::mem::replace(&mut current, next));
            }
            _ => current.blocks.push(block),
        }
    }

    if !current.is_empty() {
        pages.push(current);
    }

    pages
}

/// Number of the page a block sits on. A page break reports the page it opens.
pub fn page_of(blocks: &[Block], block_id: &BlockId) -> Option<usize> {
    let mut number = 1;
    for block in blocks {
        if block.is_page_break() {
            number += 1;
        }
        if &block.id == block_id {
            return Some(number);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockType, PageBreakData, TextData};

    fn text(id: &str) -> Block {
        Block::new(
            BlockId::new(id),
            BlockData::Text(TextData {
                content: id.to_string(),
            }),
        )
    }

    fn page_break(id: &str, color: &str, show_number: bool) -> Block {
        Block::new(
            BlockId::new(id),
            BlockData::PageBreak(PageBreakData {
                background_color: color.to_string(),
                show_page_number: show_number,
            }),
        )
    }

    fn ids<'a>(page: &'a Page<'a>) -> Vec<&'a str> {
        page.block_ids().map(|id| id.as_str()).collect()
    }

    #[test]
    fn test_empty_document_has_no_pages() {
        assert!(compute_pages(&[]).is_empty());
    }

    #[test]
    fn test_sentinel_describes_the_page_it_opens() {
        let blocks = vec![
            text("a"),
            page_break("pb", "#eee", false),
            text("b"),
            text("c"),
        ];

        let pages = compute_pages(&blocks);
        assert_eq!(pages.len(), 2);

        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[0].background_color, "#ffffff");
        assert!(pages[0].show_page_number);
        assert_eq!(pages[0].opened_by, None);
        assert_eq!(ids(&pages[0]), vec!["a"]);

        assert_eq!(pages[1].number, 2);
        assert_eq!(pages[1].background_color, "#eee");
        assert!(!pages[1].show_page_number);
        assert_eq!(pages[1].opened_by.map(|id| id.as_str()), Some("pb"));
        assert_eq!(ids(&pages[1]), vec!["b", "c"]);
    }

    #[test]
    fn test_trailing_break_adds_no_empty_page() {
        let blocks = vec![text("a"), page_break("pb", "#000", true)];
        let pages = compute_pages(&blocks);
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_leading_break_keeps_empty_first_page() {
        let blocks = vec![page_break("pb", "#123456", true), text("a")];
        let pages = compute_pages(&blocks);

        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_empty());
        assert_eq!(pages[1].background_color, "#123456");
    }

    #[test]
    fn test_blank_background_falls_back_to_default() {
        let blocks = vec![text("a"), page_break("pb", "", true), text("b")];
        let pages = compute_pages(&blocks);
        assert_eq!(pages[1].background_color, DEFAULT_PAGE_BACKGROUND);
    }

    #[test]
    fn test_compute_pages_does_not_touch_blocks() {
        let blocks = vec![text("a"), page_break("pb", "#eee", true), text("b")];
        let before = blocks.clone();

        let first = compute_pages(&blocks);
        let second = compute_pages(&blocks);

        assert_eq!(first, second);
        assert_eq!(blocks, before);
    }

    #[test]
    fn test_page_of() {
        let blocks = vec![text("a"), page_break("pb", "#eee", true), text("b")];

        assert_eq!(page_of(&blocks, &BlockId::new("a")), Some(1));
        assert_eq!(page_of(&blocks, &BlockId::new("pb")), Some(2));
        assert_eq!(page_of(&blocks, &BlockId::new("b")), Some(2));
        assert_eq!(page_of(&blocks, &BlockId::new("zzz")), None);
        assert_eq!(blocks[1].block_type(), Some(BlockType::PageBreak));
    }
}
