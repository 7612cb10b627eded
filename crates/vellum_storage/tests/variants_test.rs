//! Tests for variant generation and regeneration passes.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::{Notify, mpsc};
use vellum_error::{GeneratorError, StorageErrorKind, VellumErrorKind, VellumResult};
use vellum_identify::{FixedMediaType, MediaTypes, Payload};
use vellum_storage::{
    FallbackChain, FileId, FileStorage, GenerateOptions, ProgressEvent, SaveOptions,
    VariantDescription, VariantGenerator, Variants,
};

/// Writes the first `length` bytes of the original.
struct Truncate;

#[async_trait::async_trait]
impl VariantGenerator for Truncate {
    async fn generate(
        &self,
        _id: &FileId,
        src: &Path,
        dest: &Path,
        variant: &VariantDescription,
    ) -> VellumResult<()> {
        let length = variant.param_u64("length").unwrap_or(u64::MAX) as usize;
        let bytes = tokio::fs::read(src)
            .await
            .map_err(|e| GeneratorError::new(&variant.name, e.to_string()))?;
        tokio::fs::write(dest, &bytes[..length.min(bytes.len())])
            .await
            .map_err(|e| GeneratorError::new(&variant.name, e.to_string()))?;
        Ok(())
    }
}

/// Writes a fixed stamp, failing on variants named `broken`.
struct Stamp(&'static str);

#[async_trait::async_trait]
impl VariantGenerator for Stamp {
    async fn generate(
        &self,
        _id: &FileId,
        _src: &Path,
        dest: &Path,
        variant: &VariantDescription,
    ) -> VellumResult<()> {
        if variant.name == "broken" {
            return Err(GeneratorError::new(&variant.name, "refusing to generate").into());
        }
        tokio::fs::write(dest, self.0)
            .await
            .map_err(|e| GeneratorError::new(&variant.name, e.to_string()).into())
    }
}

/// Blocks inside the first variant until released.
#[derive(Default)]
struct Gate {
    started: Notify,
    release: Notify,
}

#[async_trait::async_trait]
impl VariantGenerator for Gate {
    async fn generate(
        &self,
        _id: &FileId,
        _src: &Path,
        dest: &Path,
        _variant: &VariantDescription,
    ) -> VellumResult<()> {
        self.started.notify_one();
        self.release.notified().await;
        tokio::fs::write(dest, "gated")
            .await
            .map_err(|e| GeneratorError::new("gate", e.to_string()).into())
    }
}

fn storage(root: &Path, variants: impl Into<Variants>) -> FileStorage {
    let mut media_types = MediaTypes::new();
    media_types.insert("text/plain".to_string(), vec!["txt".to_string()]);

    FileStorage::builder()
        .path(root)
        .sniffer(Arc::new(FixedMediaType::new("text/plain")))
        .media_types(media_types)
        .variants(variants)
        .build()
        .unwrap()
}

fn tiny_and_preview() -> Vec<VariantDescription> {
    vec![
        VariantDescription::new("tiny").with_param("length", 10),
        VariantDescription::new("preview").with_param("length", 100),
    ]
}

fn named(names: &[&str]) -> Vec<VariantDescription> {
    names.iter().map(|name| VariantDescription::new(*name)).collect()
}

async fn save(storage: &FileStorage, payload: &[u8]) -> FileId {
    storage
        .save_file(Payload::Bytes(payload), SaveOptions::new())
        .await
        .unwrap()
        .id
}

fn drain(receiver: &mut mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    std::iter::from_fn(|| receiver.try_recv().ok()).collect()
}

#[tokio::test]
async fn test_truncated_variants_end_to_end() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), tiny_and_preview());
    let id = save(&storage, &[b'x'; 500]).await;

    storage
        .generate_file_variants(&id, &Truncate, GenerateOptions::new())
        .await
        .unwrap();

    let size = |path: Option<std::path::PathBuf>| std::fs::metadata(path.unwrap()).unwrap().len();
    let none = FallbackChain::none;
    assert_eq!(size(storage.file_path(&id, Some("tiny"), none()).await), 10);
    assert_eq!(size(storage.file_path(&id, Some("preview"), none()).await), 100);
    assert_eq!(size(storage.original_path(&id).await), 500);
}

#[tokio::test]
async fn test_generated_variant_path_differs_from_original() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), tiny_and_preview());
    let id = save(&storage, b"some text").await;

    storage
        .generate_file_variants(&id, &Truncate, GenerateOptions::new())
        .await
        .unwrap();

    let original = storage.original_path(&id).await.unwrap();
    let tiny = storage
        .file_path(&id, Some("tiny"), FallbackChain::none())
        .await
        .unwrap();
    assert_ne!(tiny, original);
    assert_eq!(tiny.parent(), original.parent());
    assert_eq!(
        tiny.file_name().unwrap().to_str().unwrap(),
        format!("{}.tiny.txt", id.name())
    );
}

#[tokio::test]
async fn test_regeneration_overwrites() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), named(&["thumb"]));
    let id = save(&storage, b"original").await;

    storage
        .generate_file_variants(&id, &Stamp("first"), GenerateOptions::new())
        .await
        .unwrap();
    storage
        .generate_file_variants(&id, &Stamp("second"), GenerateOptions::new())
        .await
        .unwrap();

    let thumb = storage
        .file_path(&id, Some("thumb"), FallbackChain::none())
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(thumb).unwrap(), "second");
}

#[tokio::test]
async fn test_clean_removes_stale_variants() {
    let dir = TempDir::new().unwrap();
    let before = storage(dir.path(), named(&["old", "kept"]));
    let id = save(&before, b"original payload").await;
    before
        .generate_file_variants(&id, &Stamp("v1"), GenerateOptions::new())
        .await
        .unwrap();

    let original = before.original_path(&id).await.unwrap();
    let metadata_path = format!("{}.json", original.display());
    let original_bytes = std::fs::read(&original).unwrap();
    let metadata_bytes = std::fs::read(&metadata_path).unwrap();

    let after = storage(dir.path(), named(&["kept", "new"]));
    after
        .generate_file_variants(&id, &Stamp("v2"), GenerateOptions::clean())
        .await
        .unwrap();

    let none = FallbackChain::none;
    assert_eq!(after.file_path(&id, Some("old"), none()).await, None);
    assert!(after.file_path(&id, Some("kept"), none()).await.is_some());
    assert!(after.file_path(&id, Some("new"), none()).await.is_some());
    assert_eq!(std::fs::read(&original).unwrap(), original_bytes);
    assert_eq!(std::fs::read(&metadata_path).unwrap(), metadata_bytes);
}

#[tokio::test]
async fn test_without_clean_stale_variants_stay() {
    let dir = TempDir::new().unwrap();
    let before = storage(dir.path(), named(&["old"]));
    let id = save(&before, b"original payload").await;
    before
        .generate_file_variants(&id, &Stamp("v1"), GenerateOptions::new())
        .await
        .unwrap();

    let after = storage(dir.path(), named(&["new"]));
    after
        .generate_file_variants(&id, &Stamp("v2"), GenerateOptions::new())
        .await
        .unwrap();

    assert!(
        after
            .file_path(&id, Some("old"), FallbackChain::none())
            .await
            .is_some()
    );
}

#[tokio::test]
async fn test_variant_progress_events() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), named(&["a", "b", "c"]));
    let id = save(&storage, b"progress").await;
    let mut receiver = storage.subscribe();

    storage
        .generate_file_variants(&id, &Stamp("x"), GenerateOptions::new())
        .await
        .unwrap();

    let events = drain(&mut receiver);
    assert_eq!(events.len(), 4);
    for (index, event) in events.iter().enumerate() {
        let ProgressEvent::Variant(progress) = event else {
            panic!("unexpected event {:?}", event);
        };
        assert_eq!(progress.id(), &id);
        assert_eq!(*progress.total(), 3);
        assert_eq!(progress.ready().len(), index);
    }
    let ProgressEvent::Variant(last) = &events[3] else {
        unreachable!()
    };
    assert_eq!(last.ready(), &["a", "b", "c"]);
}

#[tokio::test]
async fn test_progress_survives_slow_receivers() {
    let dir = TempDir::new().unwrap();
    let names: Vec<String> = (0..300).map(|i| format!("v{}", i)).collect();
    let variants: Vec<_> = names.iter().map(VariantDescription::new).collect();
    let storage = storage(dir.path(), variants);
    let id = save(&storage, b"many").await;
    let mut early = storage.subscribe();
    let mut late = storage.subscribe();

    storage
        .generate_file_variants(&id, &Stamp("x"), GenerateOptions::new())
        .await
        .unwrap();

    // nothing was read while generating
    let events = drain(&mut early);
    assert_eq!(events.len(), 301);
    let ProgressEvent::Variant(first) = &events[0] else {
        panic!("unexpected event {:?}", events[0]);
    };
    assert!(first.ready().is_empty());
    let ProgressEvent::Variant(last) = &events[300] else {
        panic!("unexpected event {:?}", events[300]);
    };
    assert_eq!(last.ready(), &names);
    assert_eq!(drain(&mut late), events);
}

#[tokio::test]
async fn test_dropped_receiver_does_not_block_others() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), named(&["a", "b"]));
    let id = save(&storage, b"dropped").await;
    drop(storage.subscribe());
    let mut receiver = storage.subscribe();

    storage
        .generate_file_variants(&id, &Stamp("x"), GenerateOptions::new())
        .await
        .unwrap();

    assert_eq!(drain(&mut receiver).len(), 3);
}

#[tokio::test]
async fn test_missing_original_is_noop() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), named(&["thumb"]));
    let id: FileId = "7c9e6679-7425-40de-944b-e07fc1f90ae7.txt".parse().unwrap();
    let mut receiver = storage.subscribe();

    storage
        .generate_file_variants(&id, &Stamp("x"), GenerateOptions::clean())
        .await
        .unwrap();

    assert!(drain(&mut receiver).is_empty());
    assert!(!dir.path().join("a").exists());
}

#[tokio::test]
async fn test_invalid_variant_name_is_rejected() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), named(&["good", "bad.name"]));
    let id = save(&storage, b"payload").await;

    let err = storage
        .generate_file_variants(&id, &Stamp("x"), GenerateOptions::new())
        .await
        .unwrap_err();

    let VellumErrorKind::Storage(storage_err) = err.kind() else {
        panic!("expected a storage error, got {:?}", err);
    };
    assert!(matches!(
        storage_err.kind(),
        StorageErrorKind::InvalidVariant(_)
    ));
    assert_eq!(
        storage
            .file_path(&id, Some("good"), FallbackChain::none())
            .await,
        None
    );
}

#[tokio::test]
async fn test_generator_failure_keeps_earlier_variants() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), named(&["first", "broken", "last"]));
    let id = save(&storage, b"payload").await;

    let err = storage
        .generate_file_variants(&id, &Stamp("x"), GenerateOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err.kind(), VellumErrorKind::Generator(e) if e.variant == "broken"));
    let none = FallbackChain::none;
    assert!(storage.file_path(&id, Some("first"), none()).await.is_some());
    assert_eq!(storage.file_path(&id, Some("last"), none()).await, None);
}

#[tokio::test]
async fn test_derived_variants_follow_metadata() {
    let dir = TempDir::new().unwrap();
    let variants = Variants::derived(|metadata| {
        [10u64, 100, 1000]
            .into_iter()
            .filter(|length| *length < metadata.size)
            .map(|length| VariantDescription::new(format!("len{}", length)).with_param("length", length))
            .collect()
    });
    let storage = storage(dir.path(), variants);
    let id = save(&storage, &[b'y'; 150]).await;

    storage
        .generate_file_variants(&id, &Truncate, GenerateOptions::new())
        .await
        .unwrap();

    let none = FallbackChain::none;
    assert!(storage.file_path(&id, Some("len10"), none()).await.is_some());
    assert!(storage.file_path(&id, Some("len100"), none()).await.is_some());
    assert_eq!(storage.file_path(&id, Some("len1000"), none()).await, None);
}

#[tokio::test]
async fn test_derived_variants_need_metadata() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), Variants::derived(|_| named(&["thumb"])));
    let id = save(&storage, b"payload").await;
    let original = storage.original_path(&id).await.unwrap();
    std::fs::remove_file(format!("{}.json", original.display())).unwrap();

    let err = storage
        .generate_file_variants(&id, &Stamp("x"), GenerateOptions::new())
        .await
        .unwrap_err();

    let VellumErrorKind::Storage(storage_err) = err.kind() else {
        panic!("expected a storage error, got {:?}", err);
    };
    assert!(matches!(
        storage_err.kind(),
        StorageErrorKind::MissingMetadata(_)
    ));
}

#[tokio::test]
async fn test_file_ids_lists_only_originals() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), named(&["thumb"]));
    let first = save(&storage, b"one").await;
    let second = save(&storage, b"two").await;
    storage
        .generate_file_variants(&first, &Stamp("x"), GenerateOptions::new())
        .await
        .unwrap();
    std::fs::write(dir.path().join("stray.txt"), "not in a shard").unwrap();

    let ids = storage.file_ids().await.unwrap();

    let mut expected = vec![first, second];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_file_ids_includes_json_uploads() {
    let dir = TempDir::new().unwrap();
    let mut media_types = MediaTypes::new();
    media_types.insert("application/json".to_string(), vec!["json".to_string()]);
    let storage = FileStorage::builder()
        .path(dir.path())
        .sniffer(Arc::new(FixedMediaType::new("application/json")))
        .media_types(media_types)
        .build()
        .unwrap();

    let id = save(&storage, br#"{"hello":"world"}"#).await;

    assert_eq!(id.ext(), "json");
    assert_eq!(storage.file_ids().await.unwrap(), vec![id]);
}

#[tokio::test]
async fn test_file_ids_of_missing_root() {
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir.path().join("absent"), named(&["thumb"]));

    assert!(storage.file_ids().await.unwrap().is_empty());
    assert!(
        storage
            .generate_all_files_variants(&Stamp("x"), GenerateOptions::new())
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_regenerate_all_files() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), named(&["thumb", "preview"]));
    let mut ids = vec![
        save(&storage, b"one").await,
        save(&storage, b"two").await,
        save(&storage, b"three").await,
    ];
    ids.sort();
    let mut receiver = storage.subscribe();

    let ran = storage
        .generate_all_files_variants(&Stamp("all"), GenerateOptions::new())
        .await
        .unwrap();

    assert!(ran);
    for id in &ids {
        let thumb = storage
            .file_path(id, Some("thumb"), FallbackChain::none())
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(thumb).unwrap(), "all");
    }

    let batches: Vec<_> = drain(&mut receiver)
        .into_iter()
        .filter_map(|event| match event {
            ProgressEvent::Batch(batch) => Some(batch),
            ProgressEvent::Variant(_) => None,
        })
        .collect();
    assert_eq!(batches.len(), 4);
    assert_eq!(batches[0].id(), &None);
    for (done, batch) in batches.iter().enumerate() {
        assert_eq!(*batch.ready(), done);
        assert_eq!(*batch.total(), 3);
    }
    let reported: Vec<_> = batches[1..]
        .iter()
        .map(|batch| batch.id().clone().unwrap())
        .collect();
    assert_eq!(reported, ids);
}

#[tokio::test]
async fn test_concurrent_regeneration_is_skipped() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(storage(dir.path(), named(&["thumb"])));
    save(&storage, b"payload").await;
    let gate = Arc::new(Gate::default());

    let first = {
        let storage = Arc::clone(&storage);
        let gate = Arc::clone(&gate);
        tokio::spawn(async move {
            storage
                .generate_all_files_variants(gate.as_ref(), GenerateOptions::new())
                .await
        })
    };

    gate.started.notified().await;
    assert!(storage.is_regenerating());

    let second = storage
        .generate_all_files_variants(gate.as_ref(), GenerateOptions::new())
        .await
        .unwrap();
    assert!(!second);

    gate.release.notify_one();
    assert!(first.await.unwrap().unwrap());
    assert!(!storage.is_regenerating());
}

#[tokio::test]
async fn test_failed_regeneration_releases_guard() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), named(&["broken"]));
    save(&storage, b"payload").await;

    let err = storage
        .generate_all_files_variants(&Stamp("x"), GenerateOptions::new())
        .await;

    assert!(err.is_err());
    assert!(!storage.is_regenerating());

    // a held guard would skip with Ok(false) instead of failing again
    let again = storage
        .generate_all_files_variants(&Stamp("x"), GenerateOptions::new())
        .await;
    assert!(again.is_err());
}

#[tokio::test]
async fn test_dropped_regeneration_releases_guard() {
    let dir = TempDir::new().unwrap();
    let storage = storage(dir.path(), named(&["thumb"]));
    save(&storage, b"payload").await;
    let gate = Gate::default();

    {
        let pass = storage.generate_all_files_variants(&gate, GenerateOptions::new());
        tokio::pin!(pass);
        tokio::select! {
            _ = &mut pass => panic!("the gate was never released"),
            _ = gate.started.notified() => {}
        }
        assert!(storage.is_regenerating());
    }

    assert!(!storage.is_regenerating());
}
