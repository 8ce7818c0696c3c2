//! Entity coalescing from service payloads.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use birdwire::entities::{coalesce, EntityKind, EntityPayload, MediaEntity, TextEntities};
use birdwire::error::EntityError;
use pretty_assertions::assert_eq;
use serde_json::json;

fn tweet() -> serde_json::Value {
    json!({
        "text": "@ferris three photos of #rust crabs https://t.co/abc https://t.co/pics",
        "entities": {
            "hashtags": [{"text": "rust", "indices": [24, 29]}],
            "user_mentions": [{"screen_name": "ferris", "name": "Ferris", "id_str": "7", "indices": [0, 7]}],
            "urls": [{
                "url": "https://t.co/abc",
                "expanded_url": "https://example.com/crabs",
                "display_url": "example.com/crabs",
                "indices": [36, 52]
            }],
            "media": [
                {"id_str": "1", "type": "photo", "url": "https://t.co/pics", "indices": [53, 70]}
            ]
        },
        "extended_entities": {
            "media": [
                {"id_str": "1", "type": "photo", "url": "https://t.co/pics", "indices": [53, 70]},
                {"id_str": "2", "type": "photo", "url": "https://t.co/pics", "indices": [53, 70]},
                {"id_str": "3", "type": "photo", "url": "https://t.co/pics", "indices": [53, 70]}
            ]
        }
    })
}

fn parse(value: &serde_json::Value) -> TextEntities {
    let entities: TextEntities = serde_json::from_value(value["entities"].clone()).unwrap();
    let extended: Vec<MediaEntity> =
        serde_json::from_value(value["extended_entities"]["media"].clone()).unwrap();
    entities.with_extended_media(extended)
}

#[test]
fn test_multi_photo_tweet_merged() {
    let out = parse(&tweet()).coalesce(true).unwrap();
    let kinds: Vec<_> = out.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EntityKind::Mention,
            EntityKind::HashTag,
            EntityKind::Url,
            EntityKind::Media
        ]
    );

    let EntityPayload::Media { photos } = &out[3].payload else {
        panic!("expected media payload");
    };
    let ids: Vec<_> = photos.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[test]
fn test_multi_photo_tweet_unmerged() {
    let out = parse(&tweet()).coalesce(false).unwrap();
    assert_eq!(out.len(), 6);
    assert!(out[3..].iter().all(|e| e.kind() == EntityKind::Media));
}

#[test]
fn test_legacy_media_only() {
    let entities: TextEntities = serde_json::from_value(tweet()["entities"].clone()).unwrap();
    let out = coalesce(&entities.to_text_entities(), true).unwrap();
    assert_eq!(out.len(), 4);
    assert_eq!(out[3].photos().len(), 1);
}

#[test]
fn test_malformed_indices_rejected() {
    let entities: TextEntities = serde_json::from_value(json!({
        "hashtags": [{"text": "broken", "indices": [10, 4]}]
    }))
    .unwrap();
    assert_eq!(
        entities.coalesce(false).unwrap_err(),
        EntityError::InvalidSpan {
            kind: "hashtag".into(),
            start: 10,
            end: 4
        }
    );
}
