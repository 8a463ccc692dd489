use chrono::Utc;
use tjm_core::AppError;
use tjm_core::models::OfferRow;
use tjm_core::traits::OfferStore;
use tjm_db::OfferRepository;

use crate::common::setup_test_db;

fn offer(source: &str, source_id: &str) -> OfferRow {
    OfferRow {
        source: source.into(),
        source_id: source_id.into(),
        url: Some(format!("https://{source}.example/{source_id}")),
        title: "Senior Rust Developer".into(),
        description: Some("Build data pipelines".into()),
        company: Some("Acme".into()),
        tjm_min: Some(500.0),
        tjm_max: Some(650.0),
        tjm_currency: "EUR".into(),
        technologies: vec!["PostgreSQL".into(), "Rust".into()],
        seniority_level: "senior".into(),
        location: Some("Lyon, Auvergne-Rhône-Alpes, France".into()),
        remote_policy: "hybrid".into(),
        contract_type: "freelance".into(),
        scraped_at: Some(Utc::now()),
        processed_at: Utc::now(),
        quality_score: 0.9,
        raw_payload: serde_json::json!({"sourceId": source_id}),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn insert_and_fetch_offer() {
    let (pool, _container) = setup_test_db().await;
    let repo = OfferRepository::new(pool);

    repo.health_check().await.unwrap();
    repo.insert(&offer("freework", "1")).await.unwrap();

    let stored = repo
        .get("freework", "1")
        .await
        .unwrap()
        .expect("Should find the offer");
    assert_eq!(stored.title, "Senior Rust Developer");
    assert_eq!(stored.technologies, vec!["PostgreSQL", "Rust"]);
    assert_eq!(stored.tjm_max, Some(650.0));
    assert_eq!(stored.raw_payload, serde_json::json!({"sourceId": "1"}));
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn duplicate_insert_reports_duplicate_key() {
    let (pool, _container) = setup_test_db().await;
    let repo = OfferRepository::new(pool);

    repo.insert(&offer("freework", "1")).await.unwrap();
    let err = repo.insert(&offer("freework", "1")).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateKey(ref key) if key == "freework:1"));

    // Same id under another source is a different offer.
    repo.insert(&offer("malt", "1")).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn update_by_key_replaces_fields() {
    let (pool, _container) = setup_test_db().await;
    let repo = OfferRepository::new(pool);

    repo.insert(&offer("freework", "7")).await.unwrap();
    let mut changed = offer("freework", "7");
    changed.title = "Lead Rust Developer".into();
    changed.tjm_min = None;
    changed.quality_score = 0.75;
    repo.update_by_key(&changed).await.unwrap();

    let stored = repo.get("freework", "7").await.unwrap().unwrap();
    assert_eq!(stored.title, "Lead Rust Developer");
    assert_eq!(stored.tjm_min, None);
    assert_eq!(stored.quality_score, 0.75);
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn update_missing_offer_fails() {
    let (pool, _container) = setup_test_db().await;
    let repo = OfferRepository::new(pool);

    let err = repo.update_by_key(&offer("freework", "404")).await.unwrap_err();
    assert!(matches!(err, AppError::DatabaseError(_)));
}
