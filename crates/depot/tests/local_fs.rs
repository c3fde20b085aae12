//! End-to-end tests over the local filesystem provider.

use std::path::Path;

use depot::storage::{ObjectStorage, SignedUrlOptions, StorageConfig, StorageError, StorageProvider};
use depot::transfer::{OperatorAccessor, RemoteObjectAccessor, TransferError, partial_path};

fn service(root: &Path) -> ObjectStorage {
    let config = StorageConfig::new(StorageProvider::local_fs(root));
    ObjectStorage::from_config(config).expect("should create service")
}

/// Accessor over the same bucket the service would build, used to observe
/// object metadata from tests.
fn fs_accessor(root: &Path, bucket: &str) -> OperatorAccessor {
    let builder = opendal::services::Fs::default().root(
        root.join(bucket)
            .to_str()
            .expect("tempdir paths are UTF-8"),
    );
    let operator = opendal::Operator::new(builder)
        .expect("fs operator")
        .finish();
    OperatorAccessor::new(operator, "local")
}

fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn upload_read_exists_delete_round_trip() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());

    storage
        .upload("releases", "notes/readme.txt", b"hello depot".to_vec())
        .await
        .unwrap();

    assert!(storage.exists("releases", "notes/readme.txt").await);
    let read = storage.read("releases", "notes/readme.txt").await.unwrap();
    assert_eq!(read.as_ref(), b"hello depot");

    storage.delete("releases", "notes/readme.txt").await.unwrap();
    assert!(!storage.exists("releases", "notes/readme.txt").await);
}

#[tokio::test]
async fn read_missing_object_reports_not_found() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());

    let err = storage.read("releases", "absent.bin").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { .. }));
}

#[tokio::test]
async fn copy_within_and_across_buckets() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());
    let data = content(4096);

    storage.upload("releases", "a.bin", data.clone()).await.unwrap();

    storage
        .copy("releases", "a.bin", "releases", "b.bin")
        .await
        .unwrap();
    assert_eq!(storage.read("releases", "b.bin").await.unwrap(), data);

    storage
        .copy("releases", "a.bin", "archive", "a.bin")
        .await
        .unwrap();
    assert_eq!(storage.read("archive", "a.bin").await.unwrap(), data);
}

#[tokio::test]
async fn create_bucket_and_bucket_exists_are_native_locally() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());

    assert!(!storage.bucket_exists("releases").await.unwrap());
    storage.create_bucket("releases").await.unwrap();
    assert!(storage.bucket_exists("releases").await.unwrap());
}

#[tokio::test]
async fn download_writes_the_complete_object() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());
    let data = content(100_000);
    storage.upload("releases", "manifest.tar", data.clone()).await.unwrap();

    let dest_dir = tempfile::tempdir().unwrap();
    let destination = dest_dir.path().join("manifest.tar");
    storage
        .download("releases", "manifest.tar", &destination)
        .await
        .unwrap();

    assert_eq!(tokio::fs::read(&destination).await.unwrap(), data);
}

#[tokio::test]
async fn second_download_leaves_existing_file_alone() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());
    let data = content(1000);
    storage.upload("releases", "manifest.tar", data.clone()).await.unwrap();

    let dest_dir = tempfile::tempdir().unwrap();
    let destination = dest_dir.path().join("manifest.tar");
    storage
        .download("releases", "manifest.tar", &destination)
        .await
        .unwrap();

    // Replace the remote object; the local final file stays authoritative.
    storage
        .upload("releases", "manifest.tar", content(2000))
        .await
        .unwrap();
    storage
        .download("releases", "manifest.tar", &destination)
        .await
        .unwrap();

    assert_eq!(tokio::fs::read(&destination).await.unwrap(), data);
}

#[tokio::test]
async fn download_resumes_a_seeded_partial_file() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());
    let data = content(1_000_000);
    storage.upload("releases", "manifest.tar", data.clone()).await.unwrap();

    let meta = fs_accessor(root.path(), "releases")
        .stat("releases", "manifest.tar")
        .await
        .unwrap();
    assert_eq!(meta.total_size, 1_000_000);

    let dest_dir = tempfile::tempdir().unwrap();
    let destination = dest_dir.path().join("manifest.tar");
    let partial = partial_path(&destination, &meta.version_tag, "local");
    tokio::fs::write(&partial, &data[..400_000]).await.unwrap();

    storage
        .download("releases", "manifest.tar", &destination)
        .await
        .unwrap();

    assert_eq!(tokio::fs::read(&destination).await.unwrap(), data);
    assert!(!partial.exists());
}

#[tokio::test]
async fn download_to_directory_is_a_conflict() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());
    storage.upload("releases", "manifest.tar", content(10)).await.unwrap();

    let dest_dir = tempfile::tempdir().unwrap();
    let err = storage
        .download("releases", "manifest.tar", dest_dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::DestinationConflict(_)));
}

#[tokio::test]
async fn download_missing_object_reports_not_found() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());

    let dest_dir = tempfile::tempdir().unwrap();
    let destination = dest_dir.path().join("absent.bin");
    let err = storage
        .download("releases", "absent.bin", &destination)
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::NotFound(_)));
    assert!(!destination.exists());
}

#[tokio::test]
async fn zero_byte_object_downloads_to_empty_file() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());
    storage.upload("releases", "empty.bin", Vec::new()).await.unwrap();

    let dest_dir = tempfile::tempdir().unwrap();
    let destination = dest_dir.path().join("empty.bin");
    storage
        .download("releases", "empty.bin", &destination)
        .await
        .unwrap();

    assert_eq!(tokio::fs::metadata(&destination).await.unwrap().len(), 0);
}

#[tokio::test]
async fn upload_reader_round_trips_with_declared_length() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());
    let data = content(50_000);

    storage
        .upload_reader(
            "releases",
            "streamed.bin",
            std::io::Cursor::new(data.clone()),
            "application/octet-stream",
            50_000,
        )
        .await
        .unwrap();

    assert_eq!(storage.read("releases", "streamed.bin").await.unwrap(), data);
}

#[tokio::test]
async fn upload_reader_rejects_length_mismatch() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());

    let err = storage
        .upload_reader(
            "releases",
            "streamed.bin",
            std::io::Cursor::new(content(100)),
            "application/octet-stream",
            200,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Operation(_)));
}

#[tokio::test]
async fn signed_url_is_not_supported_on_the_filesystem() {
    let root = tempfile::tempdir().unwrap();
    let storage = service(root.path());
    storage.upload("releases", "manifest.tar", content(10)).await.unwrap();

    let err = storage
        .signed_url("releases", "manifest.tar", &SignedUrlOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::PresignNotSupported));
}
