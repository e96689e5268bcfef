//! Integration tests for the SQLite repositories.

use chrono::TimeDelta;
use std::time::Duration;
use tempfile::TempDir;
use vitrine_core::{now_millis, ImageFilter, ListQuery, OrderBy};
use vitrine_database::{Database, Inserted, PoolOptions};
use vitrine_error::ErrorCategory;

const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

async fn open(dir: &TempDir) -> Database {
    let url = dir.path().join("vitrine.db");
    Database::connect(
        url.to_str().expect("utf-8 path"),
        PoolOptions::new(4, Duration::from_secs(5)),
    )
    .await
    .expect("Failed to open database")
}

fn hash(n: usize) -> String {
    format!("{:064x}", n)
}

#[tokio::test]
async fn test_insert_image_deduplicates_by_hash() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;
    let now = now_millis();

    let (first, inserted) = db.insert_image(HASH_A, "png", now).await.unwrap();
    assert_eq!(inserted, Inserted::New);

    let later = now + TimeDelta::days(3);
    let (second, inserted) = db.insert_image(HASH_A, "png", later).await.unwrap();
    assert_eq!(inserted, Inserted::Existing);
    assert_eq!(first, second);
    assert_eq!(second.created_time, now);
}

#[tokio::test]
async fn test_hash_lookup_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;

    let (image, _) = db.insert_image(HASH_A, "jpg", now_millis()).await.unwrap();
    let found = db
        .find_image_by_hash(&HASH_A.to_uppercase())
        .await
        .unwrap()
        .expect("image by hash");
    assert_eq!(found.image_id, image.image_id);
    assert!(db.find_image_by_hash(HASH_B).await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_missing_image_is_not_found() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;

    let err = db.get_image(42).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_duplicate_ownership_is_already_owned() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;
    let (image, _) = db.insert_image(HASH_A, "png", now_millis()).await.unwrap();

    db.create_ownership(1, image.image_id, true, now_millis())
        .await
        .unwrap();
    let err = db
        .create_ownership(1, image.image_id, false, now_millis())
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::AlreadyOwned);

    // A different user may own the same image.
    let other = db
        .create_ownership(2, image.image_id, false, now_millis())
        .await
        .unwrap();
    assert_eq!(other.image_id, image.image_id);
    assert_eq!(db.count_owners(image.image_id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_ownership_of_missing_image_is_not_found() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;

    let err = db
        .create_ownership(1, 404, false, now_millis())
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_remove_unowned_image_only_drops_ownerless_rows() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;
    let now = now_millis();

    let (owned, _) = db.insert_image(HASH_A, "png", now).await.unwrap();
    db.create_ownership(1, owned.image_id, false, now).await.unwrap();
    assert!(db.remove_unowned_image(owned.image_id).await.unwrap().is_none());
    assert!(db.get_image(owned.image_id).await.is_ok());

    let (orphan, _) = db.insert_image(HASH_B, "png", now).await.unwrap();
    let removed = db.remove_unowned_image(orphan.image_id).await.unwrap();
    assert_eq!(removed, Some(orphan.clone()));
    assert!(db.find_image_by_hash(HASH_B).await.unwrap().is_none());

    assert!(db.remove_unowned_image(orphan.image_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_orders_filters_and_paginates() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;
    let base = now_millis();

    for n in 0..5 {
        let (image, _) = db
            .insert_image(&hash(n), "png", base)
            .await
            .unwrap();
        let created = base + TimeDelta::seconds(n as i64);
        db.create_ownership(7, image.image_id, n % 2 == 0, created)
            .await
            .unwrap();
    }
    let (foreign, _) = db.insert_image(HASH_B, "png", base).await.unwrap();
    db.create_ownership(8, foreign.image_id, false, base).await.unwrap();

    let newest_first = db.list_ownerships(7, ListQuery::default()).await.unwrap();
    assert_eq!(newest_first.len(), 5);
    assert!(newest_first
        .windows(2)
        .all(|w| w[0].0.updated_time >= w[1].0.updated_time));
    assert!(newest_first.iter().all(|(o, _)| o.user_id == 7));

    let private = db
        .list_ownerships(7, ListQuery::builder().filter(ImageFilter::Private).build())
        .await
        .unwrap();
    assert_eq!(private.len(), 3);
    assert!(private.iter().all(|(o, _)| o.is_private));

    let public = db
        .list_ownerships(7, ListQuery::builder().filter(ImageFilter::Public).build())
        .await
        .unwrap();
    assert_eq!(public.len(), 2);

    let query = |page| {
        ListQuery::builder()
            .order_by(OrderBy::CreatedTime)
            .ascending(true)
            .page(page)
            .limit(2)
            .build()
    };
    let mut seen = Vec::new();
    for page in 1..=3 {
        let rows = db.list_ownerships(7, query(page)).await.unwrap();
        seen.extend(rows.into_iter().map(|(o, _)| o.created_time));
    }
    assert_eq!(seen.len(), 5);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_list_ties_break_on_ownership_id() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;
    let stamp = now_millis();

    let mut ids = Vec::new();
    for n in 0..4 {
        let (image, _) = db.insert_image(&hash(n), "png", stamp).await.unwrap();
        let ownership = db
            .create_ownership(3, image.image_id, false, stamp)
            .await
            .unwrap();
        ids.push(ownership.ownership_id);
    }

    let rows = db.list_ownerships(3, ListQuery::default()).await.unwrap();
    let listed: Vec<i64> = rows.iter().map(|(o, _)| o.ownership_id).collect();
    ids.reverse();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_list_rejects_out_of_range_pagination() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;

    for query in [
        ListQuery::builder().page(0).build(),
        ListQuery::builder().limit(0).build(),
        ListQuery::builder().limit(101).build(),
    ] {
        let err = db.list_ownerships(1, query).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidRequest);
    }
}

#[tokio::test]
async fn test_set_visibility_always_advances_updated_time() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;
    let (image, _) = db.insert_image(HASH_A, "png", now_millis()).await.unwrap();
    let created = now_millis();
    let ownership = db
        .create_ownership(1, image.image_id, true, created)
        .await
        .unwrap();

    // Same clock reading as creation.
    let first = db
        .set_visibility(ownership.ownership_id, false, created)
        .await
        .unwrap();
    assert!(!first.is_private);
    assert_eq!(first.updated_time, created + TimeDelta::milliseconds(1));
    assert_eq!(first.created_time, created);

    // A clock that went backwards still moves the stamp forward.
    let second = db
        .set_visibility(ownership.ownership_id, true, created - TimeDelta::seconds(10))
        .await
        .unwrap();
    assert!(second.is_private);
    assert!(second.updated_time > first.updated_time);

    let later = created + TimeDelta::minutes(5);
    let third = db
        .set_visibility(ownership.ownership_id, false, later)
        .await
        .unwrap();
    assert_eq!(third.updated_time, later);
}

#[tokio::test]
async fn test_set_visibility_on_missing_row_is_not_found() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;

    let err = db.set_visibility(99, false, now_millis()).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_shared_image_survives_until_last_owner_leaves() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;
    let (image, _) = db.insert_image(HASH_A, "png", now_millis()).await.unwrap();
    db.create_ownership(1, image.image_id, false, now_millis())
        .await
        .unwrap();
    db.create_ownership(2, image.image_id, true, now_millis())
        .await
        .unwrap();

    let outcome = db.delete_ownership(1, image.image_id).await.unwrap();
    assert_eq!(*outcome.remaining_owners(), 1);
    assert!(outcome.removed_image().is_none());
    assert!(db.get_image(image.image_id).await.is_ok());
    assert!(db.find_ownership(1, image.image_id).await.unwrap().is_none());

    let outcome = db.delete_ownership(2, image.image_id).await.unwrap();
    assert_eq!(*outcome.remaining_owners(), 0);
    assert_eq!(outcome.removed_image().as_ref(), Some(&image));
    assert_eq!(
        db.get_image(image.image_id).await.unwrap_err().category(),
        ErrorCategory::NotFound
    );
    assert!(db.find_image_by_hash(HASH_A).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_without_ownership_is_not_found() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;
    let (image, _) = db.insert_image(HASH_A, "png", now_millis()).await.unwrap();
    db.create_ownership(1, image.image_id, false, now_millis())
        .await
        .unwrap();

    let err = db.delete_ownership(2, image.image_id).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert_eq!(db.count_owners(image.image_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_inserts_converge_on_one_row() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir).await;
    let now = now_millis();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = db.clone();
            tokio::spawn(async move { db.insert_image(HASH_A, "png", now).await })
        })
        .collect();

    let mut ids = Vec::new();
    let mut fresh = 0;
    for handle in handles {
        let (image, inserted) = handle.await.unwrap().unwrap();
        ids.push(image.image_id);
        if inserted == Inserted::New {
            fresh += 1;
        }
    }
    assert_eq!(fresh, 1);
    ids.dedup();
    assert_eq!(ids.len(), 1);
}
