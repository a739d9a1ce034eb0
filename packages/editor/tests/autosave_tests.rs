//! Autosave wired to real sessions and stores

use lessonkit_editor::{
    spawn_autosave, BlockId, BlockRegistry, BlockType, Document, EditSession, EditorConfig,
    EditorError, FileStore, LessonHost, LessonId, LessonStore, MemoryStore, MutationError,
    SaveOutcome, UnsavedPolicy,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn write_lesson(store: &FileStore, lesson_id: &LessonId, content: Value) {
    let path = store.lesson_path(lesson_id).unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, serde_json::to_vec_pretty(&content).unwrap()).unwrap();
}

fn read_lesson(store: &FileStore, lesson_id: &LessonId) -> Value {
    let path = store.lesson_path(lesson_id).unwrap();
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_session_edits_reach_store_after_quiet_period() {
    let store = Arc::new(MemoryStore::new());
    let lesson = LessonId::new("debounced");
    let autosave = spawn_autosave(store.clone(), lesson.clone(), Duration::from_secs(30), 0);

    let mut session = EditSession::new(
        Document::new(lesson.clone()),
        Arc::new(BlockRegistry::standard()),
    );
    session.observe(Box::new(autosave.clone()));

    session.add_block(BlockType::Heading, None).unwrap();
    sleep(Duration::from_secs(5)).await;
    session.add_block(BlockType::Text, None).unwrap();

    sleep(Duration::from_secs(29)).await;
    assert_eq!(store.save_count(), 0);
    assert!(autosave.status().has_unsaved_changes);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(store.save_count(), 1);

    let status = autosave.status();
    assert!(!status.has_unsaved_changes);
    assert!(status.last_saved_at.is_some());
    session.mark_saved(status.saved_version);
    assert!(!session.is_dirty());

    let saved = store.lesson(&lesson).await.unwrap();
    assert_eq!(saved.blocks, session.document().blocks());
}

#[tokio::test(start_paused = true)]
async fn test_persisted_state_is_the_latest_one() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_secs(45)));
    let lesson = LessonId::new("latest");
    let autosave = spawn_autosave(store.clone(), lesson.clone(), Duration::from_secs(30), 0);

    let mut session = EditSession::new(
        Document::new(lesson.clone()),
        Arc::new(BlockRegistry::standard()),
    );
    session.observe(Box::new(autosave.clone()));

    for _ in 0..3 {
        session.add_block(BlockType::Text, None).unwrap();
        sleep(Duration::from_secs(31)).await;
    }
    sleep(Duration::from_secs(300)).await;

    // v1 is in flight from 30s to 75s; the firings at 61s and 92s collapse
    // into a single follow-up that persists v3
    assert_eq!(store.save_count(), 2);
    let saved = store.lesson(&lesson).await.unwrap();
    assert_eq!(saved.blocks.len(), 3);
    assert_eq!(autosave.status().saved_version, session.document().version);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_save_after_failure() {
    let store = Arc::new(MemoryStore::new());
    store.set_failure(Some("quota exceeded".to_string()));

    let mut host = LessonHost::new(
        store.clone(),
        Arc::new(BlockRegistry::standard()),
        EditorConfig::default(),
    );

    host.open_lesson(LessonId::new("retry"), UnsavedPolicy::Flush)
        .await
        .unwrap()
        .add_block(BlockType::Code, None)
        .unwrap();

    assert!(host.save_now().await.is_err());
    assert!(host.session().unwrap().is_dirty());
    assert!(host.autosave().unwrap().status().last_error.is_some());

    store.set_failure(None);
    assert_eq!(host.save_now().await.unwrap(), SaveOutcome::Saved { version: 1 });
    assert!(!host.session().unwrap().is_dirty());
}

#[tokio::test]
async fn test_file_store_lessons_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let registry = Arc::new(BlockRegistry::standard());

    let mut host = LessonHost::new(store.clone(), registry.clone(), EditorConfig::default());
    let session = host
        .open_lesson(LessonId::new("week-1"), UnsavedPolicy::Flush)
        .await
        .unwrap();
    session.add_block(BlockType::Heading, None).unwrap();
    session.add_block(BlockType::PageBreak, None).unwrap();
    session.add_block(BlockType::Video, None).unwrap();
    host.close_lesson(UnsavedPolicy::Flush).await.unwrap();

    let stored = store.load_document(&LessonId::new("week-1")).await.unwrap();
    assert_eq!(stored.blocks.len(), 3);

    let mut host = LessonHost::new(store, registry, EditorConfig::default());
    let session = host
        .open_lesson(LessonId::new("week-1"), UnsavedPolicy::Flush)
        .await
        .unwrap();
    assert_eq!(session.document().compute_pages().len(), 2);

    // New ids never collide with the reloaded ones
    let id = session.add_block(BlockType::Text, None).unwrap().block_id.unwrap();
    assert_eq!(
        session
            .document()
            .blocks()
            .iter()
            .filter(|b| b.id == id)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_unrecognized_block_type_opens_and_survives_resave() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let registry = Arc::new(BlockRegistry::standard());
    let lesson = LessonId::new("future");

    let carousel = json!({
        "id": "c1",
        "type": "carousel",
        "data": { "slides": ["a.png", "b.png"], "loop": true }
    });
    write_lesson(
        &store,
        &lesson,
        json!({
            "blocks": [
                { "id": "t1", "type": "text", "data": { "content": "Hello" } },
                carousel.clone()
            ]
        }),
    );

    let mut host = LessonHost::new(store.clone(), registry.clone(), EditorConfig::default());
    let session = host
        .open_lesson(lesson.clone(), UnsavedPolicy::Flush)
        .await
        .unwrap();

    let carousel_id = BlockId::new("c1");
    let block = session.document().block(&carousel_id).unwrap();
    assert_eq!(block.block_type(), None);
    assert!(registry.definition(block.type_name()).block_type.is_none());
    assert_eq!(session.document().compute_pages()[0].blocks.len(), 2);

    let partial = json!({ "loop": false }).as_object().unwrap().clone();
    assert!(matches!(
        session.update_block_data(&carousel_id, partial),
        Err(EditorError::Mutation(MutationError::UnknownBlockType(name))) if name == "carousel"
    ));

    session.reorder_block(&carousel_id, 0).unwrap();
    session.add_block(BlockType::Heading, None).unwrap();
    host.close_lesson(UnsavedPolicy::Flush).await.unwrap();

    let saved = read_lesson(&store, &lesson);
    assert_eq!(saved["blocks"].as_array().unwrap().len(), 3);
    assert_eq!(saved["blocks"][0], carousel);
    assert_eq!(saved["blocks"][1]["id"], "t1");
}

#[tokio::test]
async fn test_unrecognized_fields_survive_saving_other_edits() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let lesson = LessonId::new("legacy");
    write_lesson(
        &store,
        &lesson,
        json!({
            "blocks": [
                { "id": "h1", "type": "heading", "data": { "text": "T", "legacyColor": "blue" } }
            ]
        }),
    );

    let mut host = LessonHost::new(
        store.clone(),
        Arc::new(BlockRegistry::standard()),
        EditorConfig::default(),
    );
    host.open_lesson(lesson.clone(), UnsavedPolicy::Flush)
        .await
        .unwrap()
        .add_block(BlockType::Text, None)
        .unwrap();
    assert_eq!(host.save_now().await.unwrap(), SaveOutcome::Saved { version: 1 });

    let saved = read_lesson(&store, &lesson);
    let heading = &saved["blocks"][0]["data"];
    assert_eq!(heading["text"], "T");
    assert_eq!(heading["legacyColor"], "blue");
    assert_eq!(heading["level"], 2);
}
