use imagedb::{
    catalog::{CatalogApi, ROOT_TAG_ID},
    search::{Commit, InputEvent},
    tags::{AddTagOutcome, Rejection, TagEditor, build_subtree},
};

use super::support::persisted_catalog;

#[tokio::test]
async fn editor_changes_survive_a_reload() {
    let (catalog, store, _dir) = persisted_catalog();
    let mut editor = TagEditor::load(catalog.clone()).await;
    let mut photo = catalog.fetch_entity(3).await.unwrap();

    let outcome = editor.add_tag(&mut photo, "Golden Retriever", 3).await.unwrap();
    let AddTagOutcome::Added(retriever) = outcome else {
        panic!("expected a new tag");
    };
    assert_eq!(retriever.canonical_name, "golden-retriever");
    assert!(editor.remove_tag(&mut photo, "outdoors").await.unwrap());

    let reloaded = store.load().unwrap().expect("catalog on disk");
    let stored = reloaded.entity(3).unwrap();
    assert!(stored.has_tag("golden-retriever"));
    assert!(stored.has_tag("dogs"));
    assert!(!stored.has_tag("outdoors"));

    let forest = build_subtree(&reloaded.tags, ROOT_TAG_ID).unwrap();
    let labels: Vec<String> = forest
        .paths()
        .into_iter()
        .map(|(_, path)| path.join("/"))
        .collect();
    assert!(labels.contains(&"Animals/Dogs/Golden Retriever".to_string()));
}

#[tokio::test]
async fn duplicates_are_refused_before_reaching_the_catalog() {
    let (catalog, _store, _dir) = persisted_catalog();
    let mut editor = TagEditor::load(catalog.clone()).await;
    let mut photo = catalog.fetch_entity(1).await.unwrap();
    let before = photo.clone();

    let outcome = editor.add_tag(&mut photo, "Animals", ROOT_TAG_ID).await.unwrap();
    assert_eq!(
        outcome,
        AddTagOutcome::Rejected(Rejection::Duplicate("Animals".into()))
    );
    assert_eq!(photo, before);
    assert_eq!(catalog.fetch_tags().await.unwrap().len(), 4);
}

#[tokio::test]
async fn picker_attaches_existing_tag() {
    let (catalog, _store, _dir) = persisted_catalog();
    let mut editor = TagEditor::load(catalog.clone()).await;
    let mut photo = catalog.fetch_entity(1).await.unwrap();

    editor.handle(InputEvent::Focus);
    editor.handle(InputEvent::TextChanged("out".into()));
    editor.handle(InputEvent::ArrowDown);
    let Some(Commit::Selected(tag)) = editor.handle(InputEvent::Enter).commit else {
        panic!("expected a selection");
    };
    assert_eq!(tag.canonical_name, "outdoors");

    assert!(editor.attach_tag(&mut photo, tag).await.unwrap());
    let stored = catalog.fetch_entity(1).await.unwrap();
    assert!(stored.has_tag("outdoors"));
}
