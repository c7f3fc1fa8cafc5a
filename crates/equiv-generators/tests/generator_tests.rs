//! Integration tests for equiv-generators
//!
//! Generators run against an in-memory store loaded with a small catalogue.

use chrono::{Duration, TimeZone, Utc};
use equiv_alias::{AliasExpansion, AliasExpansionConfig};
use equiv_domain::{
    Alias, Broadcast, Channel, Content, ContentKind, Publisher, Score, Specialization,
};
use equiv_generators::{
    AliasResolvingGenerator, BroadcastMatchingConfig, BroadcastMatchingGenerator,
    EquivalenceGenerator, GeneratorError, TitleSearchConfig, TitleSearchGenerator,
};
use equiv_store::InMemoryStore;
use std::collections::BTreeSet;
use std::sync::Arc;

const CHANNEL_4: &str = "http://www.channel4.com";

fn publishers(keys: &[&str]) -> BTreeSet<Publisher> {
    keys.iter().map(|k| Publisher::new(*k)).collect()
}

fn episode(id: u64, publisher: &str, title: &str) -> Content {
    Content::new(
        id,
        format!("http://{}/{}", publisher, id),
        Publisher::new(publisher),
        ContentKind::Episode,
    )
    .with_title(title)
    .with_specialization(Specialization::Tv)
}

fn catalogue() -> InMemoryStore {
    let start = Utc.with_ymd_and_hms(2024, 2, 10, 21, 0, 0).unwrap();
    let end = start + Duration::hours(1);

    InMemoryStore::new()
        .with_channel(Channel::new(CHANNEL_4))
        .with_content(
            episode(1, "c4", "Dr Who")
                .with_alias(Alias::new("gb:channel4:prod:pmlsd:programmeId", "12345/001"))
                .with_broadcasts(vec![Broadcast::new(CHANNEL_4, start, end)]),
        )
        .with_content(
            episode(2, "barb", "DOCTOR WHO")
                .with_alias(Alias::new("gb:barb:broadcastGroup:3:bcid", "C4:12345/001"))
                .with_broadcasts(vec![Broadcast::new(
                    CHANNEL_4,
                    start + Duration::minutes(2),
                    end + Duration::minutes(1),
                )]),
        )
        .with_content(episode(3, "pa", "Doctor Who"))
        .with_content(episode(4, "pa", "Doctor Who").unpublished())
        .with_content(
            Content::new(5, "http://pa/5", Publisher::new("pa"), ContentKind::Brand)
                .with_title("Doctor Who")
                .with_specialization(Specialization::Tv),
        )
        .with_content(episode(6, "pa", "Who Do You Think You Are?"))
}

#[tokio::test]
async fn test_alias_generator_translates_cms_prefix() {
    let store = Arc::new(catalogue());
    let expansion = Arc::new(AliasExpansion::new(AliasExpansionConfig::default()).unwrap());
    let subject = store.content("http://c4/1").unwrap();

    let generator =
        AliasResolvingGenerator::new(store.clone(), store.clone(), expansion, publishers(&[]));
    let scores = generator.generate(&subject).await.unwrap();

    let uris: Vec<&str> = scores.iter().map(|c| c.uri()).collect();
    assert_eq!(uris, vec!["http://barb/2"]);
}

#[tokio::test]
async fn test_title_search_expands_abbreviations() {
    let store = Arc::new(catalogue());
    let subject = store.content("http://c4/1").unwrap();

    let generator = TitleSearchGenerator::new(
        store.clone(),
        publishers(&["pa", "c4"]),
        TitleSearchConfig::default(),
    );
    let scores = generator.generate(&subject).await.unwrap();

    assert_eq!(scores.source(), TitleSearchGenerator::NAME);
    assert_eq!(scores.score_for("http://pa/3"), Some(Score::Real(2.0)));
    assert!(!scores.contains("http://pa/4"), "unpublished records are skipped");
    assert!(!scores.contains("http://pa/5"), "containers never match items");
    assert!(!scores.contains("http://c4/1"), "own publisher is not searched");

    let partial = scores.score_for("http://pa/6");
    assert!(matches!(partial, Some(Score::Real(v)) if v < 2.0));
}

#[tokio::test]
async fn test_broadcast_generator_against_catalogue() {
    let store = Arc::new(catalogue());
    let subject = store.content("http://c4/1").unwrap();

    let generator = BroadcastMatchingGenerator::new(
        store.clone(),
        store.clone(),
        publishers(&["barb", "pa"]),
        BroadcastMatchingConfig::txlog(),
    );
    let scores = generator.generate(&subject).await.unwrap();

    assert_eq!(scores.len(), 1);
    assert_eq!(scores.score_for("http://barb/2"), Some(Score::Real(3.0)));
}

#[tokio::test]
async fn test_generators_report_read_failures() {
    let store = Arc::new(catalogue());
    let subject = store.content("http://c4/1").unwrap();
    store.set_unavailable(true);

    let generators: Vec<Box<dyn EquivalenceGenerator>> = vec![
        Box::new(TitleSearchGenerator::new(
            store.clone(),
            publishers(&["pa"]),
            TitleSearchConfig::default(),
        )),
        Box::new(BroadcastMatchingGenerator::new(
            store.clone(),
            store.clone(),
            publishers(&["pa"]),
            BroadcastMatchingConfig::unbounded(),
        )),
    ];

    for generator in generators {
        let err = generator.generate(&subject).await.unwrap_err();
        assert!(
            matches!(err, GeneratorError::Read(_)),
            "{} should fail with a read error",
            generator.name()
        );
    }
}
