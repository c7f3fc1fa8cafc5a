//! Integration tests for equiv-store
//!
//! These tests drive the store through the collaborator traits the pipeline
//! uses, plus fixture loading and saving.

use chrono::{Duration, TimeZone, Utc};
use equiv_domain::traits::{
    AliasQuery, ChannelResolver, ContentResolver, EquivalenceResultHandler,
    EquivalenceSummaryStore, LookupStore, ScheduleQuery, ScheduleResolver, SearchQuery,
    SearchResolver,
};
use equiv_domain::{
    Alias, Broadcast, Channel, Content, ContentKind, EquivalenceResult, EquivalenceSummary,
    Publisher, ReadError, RunId, Score, ScoredCandidate, ScoredCandidates, Specialization,
};
use equiv_store::InMemoryStore;
use std::collections::BTreeMap;
use std::sync::Arc;

const BBC_ONE: &str = "http://www.bbc.co.uk/services/bbcone/london";

fn bbc() -> Publisher {
    Publisher::new("bbc.co.uk")
}

fn pa() -> Publisher {
    Publisher::new("pressassociation.com")
}

fn fixture() -> InMemoryStore {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
    let alias = Alias::new("gb:barb:broadcastGroup:1:bcid", "B1");

    InMemoryStore::new()
        .with_channel(Channel::new(BBC_ONE))
        .with_content(
            Content::new(1, "bbc/doctor-who-1", bbc(), ContentKind::Episode)
                .with_title("Doctor Who")
                .with_specialization(Specialization::Tv)
                .with_alias(alias.clone())
                .with_broadcasts(vec![Broadcast::new(BBC_ONE, start, start + Duration::minutes(50))]),
        )
        .with_content(
            Content::new(2, "pa/doctor-who-1", pa(), ContentKind::Episode)
                .with_title("Doctor Who")
                .with_specialization(Specialization::Tv)
                .with_alias(alias.clone())
                .with_broadcasts(vec![Broadcast::new(
                    BBC_ONE,
                    start + Duration::minutes(1),
                    start + Duration::minutes(51),
                )]),
        )
        .with_content(
            Content::new(3, "pa/doctor-who-old", pa(), ContentKind::Episode)
                .with_title("Doctor Who Confidential")
                .with_specialization(Specialization::Tv)
                .with_alias(alias)
                .unpublished(),
        )
        .with_content(
            Content::new(4, "pa/news", pa(), ContentKind::Item)
                .with_title("News")
                .with_specialization(Specialization::Radio)
                .with_broadcasts(vec![Broadcast::new(
                    BBC_ONE,
                    start - Duration::hours(2),
                    start - Duration::hours(1),
                )]),
        )
}

#[tokio::test]
async fn test_alias_lookup_filters() {
    let store = fixture();
    let alias = Alias::new("gb:barb:broadcastGroup:1:bcid", "B1");

    let published = store
        .entries_for_alias(&alias, &AliasQuery::default())
        .await
        .unwrap();
    let uris: Vec<&str> = published.iter().map(|e| e.uri.as_str()).collect();
    assert_eq!(uris, vec!["bbc/doctor-who-1", "pa/doctor-who-1"]);

    let query = AliasQuery {
        publishers: Some([pa()].into_iter().collect()),
        include_unpublished: true,
    };
    let pa_only = store.entries_for_alias(&alias, &query).await.unwrap();
    assert_eq!(pa_only.len(), 2);
    assert!(pa_only.iter().all(|e| e.publisher == pa()));
    assert!(pa_only.iter().any(|e| !e.actively_published));
}

#[tokio::test]
async fn test_resolve_by_uri_and_id_omits_unknown() {
    let store = fixture();

    let by_uri = store
        .resolve_uris(&["pa/news".to_string(), "missing".to_string()])
        .await
        .unwrap();
    assert_eq!(by_uri.len(), 1);
    assert_eq!(by_uri[0].id, 4);

    let by_id = store.resolve_ids(&[2, 99, 1]).await.unwrap();
    let uris: Vec<&str> = by_id.iter().map(|c| c.canonical_uri.as_str()).collect();
    assert_eq!(uris, vec!["pa/doctor-who-1", "bbc/doctor-who-1"]);
}

#[tokio::test]
async fn test_search_ranks_by_shared_words_and_respects_limit() {
    let store = fixture();
    let query = SearchQuery {
        title: "doctor who confidential".to_string(),
        publishers: [pa()].into_iter().collect(),
        specialization: Some(Specialization::Tv),
        limit: 10,
    };

    let results = store.search(&query).await.unwrap();
    let uris: Vec<&str> = results.iter().map(|c| c.canonical_uri.as_str()).collect();
    assert_eq!(uris, vec!["pa/doctor-who-old", "pa/doctor-who-1"]);

    let limited = store
        .search(&SearchQuery { limit: 1, ..query })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_schedule_returns_overlapping_items_per_channel() {
    let store = fixture();
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 19, 55, 0).unwrap();
    let query = ScheduleQuery {
        start,
        end: start + Duration::minutes(10),
        channels: vec![Channel::new(BBC_ONE), Channel::new("http://elsewhere")],
        publishers: [pa()].into_iter().collect(),
    };

    let schedule = store.schedule(&query).await.unwrap();
    assert_eq!(schedule.len(), 2);
    let uris: Vec<&str> = schedule[0]
        .items
        .iter()
        .map(|c| c.canonical_uri.as_str())
        .collect();
    assert_eq!(uris, vec!["pa/doctor-who-1"]);
    assert!(schedule[1].items.is_empty());
}

#[tokio::test]
async fn test_channel_lookup() {
    let store = fixture();
    assert_eq!(
        store.channel_for_uri(BBC_ONE).await.unwrap(),
        Some(Channel::new(BBC_ONE))
    );
    assert_eq!(store.channel_for_uri("http://unknown").await.unwrap(), None);
}

#[tokio::test]
async fn test_unavailable_store_fails_reads() {
    let store = fixture();
    store.set_unavailable(true);

    let result = store.resolve_uris(&["pa/news".to_string()]).await;
    assert!(matches!(result, Err(ReadError::Unavailable(_))));
    assert!(store.channel_for_uri(BBC_ONE).await.is_err());

    store.set_unavailable(false);
    assert!(store.channel_for_uri(BBC_ONE).await.is_ok());
}

#[tokio::test]
async fn test_handler_persists_summary() {
    let store = fixture();
    let subject = store.content("bbc/doctor-who-1").unwrap();
    let candidate = store.content("pa/doctor-who-1").unwrap();

    let mut combined = ScoredCandidates::new("combined");
    combined.add(candidate.clone(), Score::Real(3.0));
    let mut accepted = BTreeMap::new();
    accepted.insert(pa(), vec![ScoredCandidate::new(candidate, Score::Real(3.0))]);

    let result = EquivalenceResult {
        run_id: RunId::new(),
        subject: Arc::clone(&subject),
        raw_scores: vec![],
        combined,
        accepted,
    };
    store.handle(&result).await.unwrap();

    let summaries = store
        .summaries_for_uris(&["bbc/doctor-who-1".to_string(), "pa/news".to_string()])
        .await
        .unwrap();
    assert_eq!(summaries.len(), 1);
    let summary = &summaries["bbc/doctor-who-1"];
    assert_eq!(summary.candidates, vec!["pa/doctor-who-1"]);
    assert_eq!(summary.all_equivalents().count(), 1);
}

#[test]
fn test_fixture_file_round_trip() {
    let store = fixture().with_summary(EquivalenceSummary {
        subject: "pa/news".to_string(),
        parent: None,
        candidates: vec![],
        equivalents: BTreeMap::new(),
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, store.to_json().unwrap()).unwrap();

    let loaded = InMemoryStore::from_file(&path).unwrap();
    assert_eq!(loaded.len(), 4);
    assert!(loaded.summary("pa/news").is_some());
    assert_eq!(loaded.to_data().unwrap(), store.to_data().unwrap());
}

#[test]
fn test_minimal_json_fixture() {
    let json = r#"{
        "contents": [
            {
                "id": 7,
                "canonical_uri": "http://example.com/7",
                "publisher": "example",
                "kind": "film",
                "title": "Heat"
            }
        ]
    }"#;

    let store = InMemoryStore::from_json(json).unwrap();
    let film = store.content("http://example.com/7").unwrap();
    assert_eq!(film.kind, ContentKind::Film);
    assert!(film.actively_published);
    assert!(film.aliases.is_empty());
}
