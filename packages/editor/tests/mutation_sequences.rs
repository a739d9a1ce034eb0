//! Tests for longer mutation sequences
//!
//! This tests:
//! - Block order against a plain Vec model after add/reorder/delete chains
//! - Undo of a whole sequence back to the start
//! - Batched mutations
//! - Hydrating a saved lesson and continuing to edit it

use lessonkit_editor::{
    Block, BlockId, BlockRegistry, BlockType, Document, EditSession, LessonId, StoredDocument,
};
use std::sync::Arc;

fn ids(session: &EditSession) -> Vec<BlockId> {
    session.document().blocks().iter().map(|b| b.id.clone()).collect()
}

/// Small deterministic generator so sequences are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound.max(1)
    }
}

#[test]
fn test_order_matches_vec_model() {
    let registry = Arc::new(BlockRegistry::standard());

    for seed in 1..=20 {
        let mut rng = Lcg(seed);
        let mut session = EditSession::new(Document::new(LessonId::new("model")), registry.clone());
        let mut model: Vec<BlockId> = Vec::new();

        for _ in 0..60 {
            match rng.next(3) {
                0 => {
                    let block_type = BlockType::ALL[rng.next(BlockType::ALL.len())];
                    let at = rng.next(model.len() + 3);
                    let id = session
                        .add_block(block_type, Some(at))
                        .unwrap()
                        .block_id
                        .unwrap();
                    model.insert(at.min(model.len()), id);
                }
                1 if !model.is_empty() => {
                    let id = model[rng.next(model.len())].clone();
                    let to = rng.next(model.len() + 3);
                    session.reorder_block(&id, to).unwrap();

                    let from = model.iter().position(|m| m == &id).unwrap();
                    let block = model.remove(from);
                    model.insert(to.min(model.len()), block);
                }
                2 if !model.is_empty() => {
                    let id = model.remove(rng.next(model.len()));
                    session.delete_block(&id).unwrap();
                }
                _ => {}
            }

            assert_eq!(ids(&session), model, "seed {}", seed);
        }
    }
}

#[test]
fn test_undo_everything_returns_to_empty() {
    let mut session = EditSession::new(
        Document::new(LessonId::new("rewind")),
        Arc::new(BlockRegistry::standard()),
    );

    let heading = session.add_block(BlockType::Heading, None).unwrap().block_id.unwrap();
    session.add_block(BlockType::Text, None).unwrap();
    session.duplicate_block(&heading).unwrap();
    session.reorder_block(&heading, 2).unwrap();
    session.delete_block(&heading).unwrap();

    while session.undo().unwrap() {}
    assert!(session.document().is_empty());

    while session.redo().unwrap() {}
    assert_eq!(session.document().len(), 2);
    assert!(session.document().block(&heading).is_none());
}

#[test]
fn test_batch_undoes_as_one_step() {
    let mut session = EditSession::new(
        Document::new(LessonId::new("batch")),
        Arc::new(BlockRegistry::standard()),
    );
    session.add_block(BlockType::Text, None).unwrap();

    session.begin_batch("Add quiz page");
    session.add_block(BlockType::PageBreak, None).unwrap();
    session.add_block(BlockType::Quiz, None).unwrap();
    session.end_batch();

    assert_eq!(session.document().compute_pages().len(), 2);
    session.undo().unwrap();
    assert_eq!(session.document().compute_pages().len(), 1);
    assert_eq!(session.document().len(), 1);
}

#[test]
fn test_hydrated_lesson_keeps_editing() {
    let stored: StoredDocument = serde_json::from_value(serde_json::json!({
        "blocks": [
            { "id": "h1", "type": "heading", "data": { "text": "Intro", "level": 1 } },
            { "id": "pb", "type": "page_break", "data": { "backgroundColor": "#eee" } },
            { "id": "t1", "type": "text", "data": { "content": "Body" } }
        ]
    }))
    .unwrap();

    let document = Document::hydrate(LessonId::new("saved"), stored.blocks).unwrap();
    let mut session = EditSession::new(document, Arc::new(BlockRegistry::standard()));
    assert!(!session.is_dirty());

    let pages = session.document().compute_pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1].background_color, "#eee");
    assert!(pages[1].show_page_number);

    let copy = session
        .duplicate_block(&BlockId::new("t1"))
        .unwrap()
        .block_id
        .unwrap();
    assert_eq!(session.document().position(&copy), Some(3));
    assert!(session.is_dirty());

    let saved: Vec<Block> = session.document().blocks().to_vec();
    let json = serde_json::to_value(StoredDocument { blocks: saved }).unwrap();
    assert_eq!(json["blocks"][3]["type"], "text");
    assert_eq!(json["blocks"][3]["data"]["content"], "Body");
}
