//! Tests for filesystem storage backend.

use vitrine_storage::{BlobKey, BlobStore, FileSystemStorage};
use tempfile::TempDir;

fn key(name: &str) -> BlobKey {
    BlobKey::from_segments(["image", "2024", "01", "02", name])
}

#[tokio::test]
async fn test_put_and_get() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();

    let data = b"Hello, world!";
    let key = key("hello.png");

    storage.put(&key, data).await.unwrap();

    assert!(storage.exists(&key).await.unwrap());
    assert_eq!(storage.size(&key).await.unwrap(), data.len() as u64);
    assert_eq!(storage.get(&key).await.unwrap(), data);
    assert!(storage.local_path(&key).starts_with(temp_dir.path()));
}

#[tokio::test]
async fn test_put_replaces_and_leaves_no_temp_files() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();
    let key = key("replace.png");

    storage.put(&key, b"first").await.unwrap();
    storage.put(&key, b"second").await.unwrap();
    assert_eq!(storage.get(&key).await.unwrap(), b"second");

    let parent = storage.local_path(&key).parent().unwrap().to_path_buf();
    let entries: Vec<_> = std::fs::read_dir(parent).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_concurrent_writers_converge() {
    let temp_dir = TempDir::new().unwrap();
    let storage = std::sync::Arc::new(FileSystemStorage::new(temp_dir.path()).unwrap());
    let key = key("race.png");
    let data = vec![7u8; 64 * 1024];

    let mut handles = Vec::new();
    for _ in 0..8 {
        let storage = storage.clone();
        let key = key.clone();
        let data = data.clone();
        handles.push(tokio::spawn(async move { storage.put(&key, &data).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(storage.get(&key).await.unwrap(), data);
}

#[tokio::test]
async fn test_delete() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();
    let key = key("delete.png");

    storage.put(&key, b"Delete me").await.unwrap();
    assert!(storage.delete(&key).await.unwrap());
    assert!(!storage.exists(&key).await.unwrap());

    // Deleting again reports that nothing was there
    assert!(!storage.delete(&key).await.unwrap());
}

#[tokio::test]
async fn test_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();

    let result = storage.get(&key("missing.png")).await;
    let err = result.unwrap_err();
    assert_eq!(err.category(), vitrine_error::ErrorCategory::NotFound);
}

#[tokio::test]
async fn test_alias_is_byte_identical() {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileSystemStorage::new(temp_dir.path()).unwrap();
    let src = key("source.jpg");
    let dst = BlobKey::from_segments(["image", "compress", "source.jpeg"]);

    storage.put(&src, b"jpeg bytes").await.unwrap();
    storage.alias(&src, &dst).await.unwrap();
    // Aliasing twice must not fail or leave temp files behind
    storage.alias(&src, &dst).await.unwrap();

    assert_eq!(storage.get(&dst).await.unwrap(), b"jpeg bytes");

    // Removing the source keeps the alias readable
    storage.delete(&src).await.unwrap();
    assert_eq!(storage.get(&dst).await.unwrap(), b"jpeg bytes");

    let parent = storage.local_path(&dst).parent().unwrap().to_path_buf();
    assert_eq!(std::fs::read_dir(parent).unwrap().count(), 1);
}
