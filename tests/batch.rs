mod common;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use common::{TestResult, library_cleaner, write_docx, write_png, write_tagged_jpeg, write_tagged_mp3};
use metaclean::adapters::{BackendAdapter, Backends, Capability};
use metaclean::classifier::AdapterId;
use metaclean::error::{AdapterError, BatchError};
use metaclean::{BatchCoordinator, BatchEvent, CleanOptions, Cleaner, FallbackDispatcher, MetadataMap, RuleSet};
use tempfile::tempdir;

/// Copia las imágenes y falla con las que contienen "rota" en el nombre.
#[derive(Clone, Default)]
struct CopyingAdapter {
    calls: Arc<AtomicUsize>,
}

impl BackendAdapter for CopyingAdapter {
    fn name(&self) -> &'static str {
        "copia"
    }

    fn capability(&self, _extension: &str) -> Capability {
        Capability::ExtractAndRemove
    }

    fn extract(&self, _path: &Path) -> Result<MetadataMap, AdapterError> {
        Ok(MetadataMap::new())
    }

    fn remove(&self, input: &Path, output: &Path, _retained: &MetadataMap) -> Result<PathBuf, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if input.to_string_lossy().contains("rota") {
            return Err(AdapterError::parse("imagen rota"));
        }
        fs::copy(input, output)?;
        Ok(output.to_path_buf())
    }
}

fn mock_coordinator(adapter: CopyingAdapter, workers: usize) -> BatchCoordinator {
    let backends = Backends::empty().with(AdapterId::ExifTags, adapter);
    BatchCoordinator::new(Cleaner::new(FallbackDispatcher::new(backends)), workers)
}

#[test]
fn failures_never_abort_the_batch() -> TestResult {
    let dir = tempdir()?;
    for index in 0..6 {
        write_png(dir.path(), &format!("foto{index}.png"))?;
    }
    write_png(dir.path(), "rota.png")?;
    fs::write(dir.path().join("vacia.png"), b"")?;

    let adapter = CopyingAdapter::default();
    let report = mock_coordinator(adapter.clone(), 3).process_folder(dir.path(), None, false, None)?;

    assert_eq!(report.succeeded.len(), 6);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 7);

    let sources: HashSet<_> = report
        .succeeded
        .iter()
        .chain(report.failed.iter())
        .map(|file| file.source.clone())
        .collect();
    assert_eq!(sources.len(), 8);
    Ok(())
}

#[test]
fn outputs_with_the_same_stem_never_collide() -> TestResult {
    let dir = tempdir()?;
    for folder in ["a", "b", "c", "d"] {
        let nested = dir.path().join(folder);
        fs::create_dir(&nested)?;
        write_png(&nested, "portada.png")?;
    }
    let output_dir = dir.path().join("salida");

    let report = mock_coordinator(CopyingAdapter::default(), 4).process_folder(
        dir.path(),
        Some(&output_dir),
        true,
        None,
    )?;

    assert_eq!(report.succeeded.len(), 4);
    let outputs: HashSet<_> = report
        .succeeded
        .iter()
        .filter_map(|file| file.output().map(Path::to_path_buf))
        .collect();
    assert_eq!(outputs.len(), 4);
    assert!(outputs.contains(&output_dir.join("portada_cleaned.png")));
    assert_eq!(fs::read_dir(&output_dir)?.count(), 4);
    Ok(())
}

#[test]
fn events_bracket_the_run() -> TestResult {
    let dir = tempdir()?;
    write_png(dir.path(), "uno.png")?;
    write_png(dir.path(), "rota.png")?;

    let (tx, rx) = mpsc::channel();
    let report = mock_coordinator(CopyingAdapter::default(), 2).process_folder_with(
        dir.path(),
        None,
        false,
        &CleanOptions::default(),
        Some(tx),
    )?;
    let events: Vec<BatchEvent> = rx.into_iter().collect();

    assert!(matches!(events.first(), Some(BatchEvent::Started { total: 2 })));
    assert!(matches!(
        events.last(),
        Some(BatchEvent::Finished { succeeded: 1, failed: 1 })
    ));
    let processing = events
        .iter()
        .filter(|event| matches!(event, BatchEvent::Processing { .. }))
        .count();
    assert_eq!(processing, 2);
    assert_eq!(report.total(), 2);
    Ok(())
}

#[test]
fn folder_errors_are_reported_before_any_work() -> TestResult {
    let dir = tempdir()?;
    let file = write_png(dir.path(), "foto.png")?;
    let adapter = CopyingAdapter::default();
    let coordinator = mock_coordinator(adapter.clone(), 2);

    assert!(matches!(
        coordinator.process_folder(&dir.path().join("no-existe"), None, false, None),
        Err(BatchError::NotFound(_))
    ));
    assert!(matches!(
        coordinator.process_folder(&file, None, false, None),
        Err(BatchError::NotADirectory(_))
    ));
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[test]
fn mixed_folder_with_library_adapters() -> TestResult {
    let dir = tempdir()?;
    write_tagged_jpeg(dir.path(), "playa.jpg")?;
    write_png(dir.path(), "icono.png")?;
    write_docx(dir.path(), "presupuesto.docx")?;
    write_tagged_mp3(dir.path(), "tema.mp3")?;
    fs::write(dir.path().join("leeme.txt"), "sin metadata")?;

    let coordinator = BatchCoordinator::new(library_cleaner(), 2);
    let rules = RuleSet::default();
    let report = coordinator.process_folder(dir.path(), None, false, Some(&rules))?;

    assert!(report.is_clean(), "fallos: {:?}", report.failed);
    assert_eq!(report.succeeded.len(), 4);
    assert_eq!(report.output_dir, dir.path().join("cleaned"));

    let csv_path = dir.path().join("reporte.csv");
    report.write_csv(&csv_path)?;
    let contents = fs::read_to_string(&csv_path)?;
    assert_eq!(contents.lines().count(), 5);
    assert!(contents.starts_with("source,status,output,fields_before,backup,error"));
    Ok(())
}
