//! Limpieza masiva de carpetas con un grupo fijo de hilos.
//!
//! Cada archivo pasa por el mismo [`Cleaner`] que una ejecución individual.
//! Un fallo nunca detiene el lote y cada archivo enumerado aparece una sola
//! vez en el reporte, ya sea como éxito o como fallo.

use serde::Serialize;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::classifier::is_supported;
use crate::cleaner::{CleanOptions, Cleaner, FileReport};
use crate::config::Settings;
use crate::error::BatchError;
use crate::filter::RuleSet;
use crate::output::OutputNamer;

pub const DEFAULT_OUTPUT_DIR: &str = "cleaned";

#[derive(Clone, Debug, Serialize)]
pub enum BatchEvent {
    Started { total: usize },
    Processing { index: usize, total: usize, path: PathBuf },
    Success { path: PathBuf, output: PathBuf },
    Failure { path: PathBuf, error: String },
    Finished { succeeded: usize, failed: usize },
}

/// Señal de parada cooperativa: los archivos en curso terminan y no empieza
/// ninguno nuevo.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    pub succeeded: Vec<FileReport>,
    pub failed: Vec<FileReport>,
    pub stopped: bool,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    source: String,
    status: &'a str,
    output: String,
    fields_before: Option<usize>,
    backup: String,
    error: String,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Una fila por archivo, éxitos primero.
    pub fn write_csv(&self, path: &Path) -> Result<(), BatchError> {
        let mut writer = csv::Writer::from_path(path)?;
        for (status, reports) in [("ok", &self.succeeded), ("error", &self.failed)] {
            for report in reports {
                writer.serialize(CsvRow {
                    source: report.source.display().to_string(),
                    status,
                    output: report
                        .output()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    fields_before: report.fields_before,
                    backup: report
                        .backup
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    error: report.outcome.failure_reason().unwrap_or_default(),
                })?;
            }
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

fn same_location(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Archivos con extensión reconocida, en orden estable, sin entrar en
/// `skip_dir`.
pub fn collect_candidate_files(
    folder: &Path,
    recursive: bool,
    skip_dir: Option<&Path>,
) -> Result<Vec<PathBuf>, BatchError> {
    if !folder.exists() {
        return Err(BatchError::NotFound(folder.to_path_buf()));
    }
    if !folder.is_dir() {
        return Err(BatchError::NotADirectory(folder.to_path_buf()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir() && skip_dir.is_some_and(|skip| same_location(entry.path(), skip)))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) if error.depth() == 0 => {
                return Err(BatchError::Enumeration {
                    path: folder.to_path_buf(),
                    reason: error.to_string(),
                });
            }
            Err(error) => {
                warn!(%error, "Entrada ilegible, se omite");
                continue;
            }
        };
        if entry.file_type().is_file() && is_supported(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub struct BatchCoordinator {
    cleaner: Cleaner,
    workers: usize,
    stop: StopHandle,
}

impl BatchCoordinator {
    pub fn new(cleaner: Cleaner, workers: usize) -> Self {
        Self {
            cleaner,
            workers: workers.max(1),
            stop: StopHandle::default(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Cleaner::from_settings(settings), settings.effective_workers())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn process_folder(
        &self,
        folder: &Path,
        output_dir: Option<&Path>,
        recursive: bool,
        rules: Option<&RuleSet>,
    ) -> Result<BatchReport, BatchError> {
        let options = CleanOptions {
            rules: rules.cloned(),
            ..CleanOptions::default()
        };
        self.process_folder_with(folder, output_dir, recursive, &options, None)
    }

    pub fn process_folder_with(
        &self,
        folder: &Path,
        output_dir: Option<&Path>,
        recursive: bool,
        options: &CleanOptions,
        events: Option<Sender<BatchEvent>>,
    ) -> Result<BatchReport, BatchError> {
        if !folder.is_dir() {
            return Err(if folder.exists() {
                BatchError::NotADirectory(folder.to_path_buf())
            } else {
                BatchError::NotFound(folder.to_path_buf())
            });
        }

        let output_dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| folder.join(DEFAULT_OUTPUT_DIR));
        if !options.dry_run {
            fs::create_dir_all(&output_dir).map_err(|source| BatchError::OutputDir {
                path: output_dir.clone(),
                source,
            })?;
        }

        let files = collect_candidate_files(folder, recursive, Some(&output_dir))?;
        let total = files.len();
        info!(
            carpeta = %folder.display(),
            archivos = total,
            hilos = self.workers,
            "Iniciando limpieza por lotes"
        );
        send(&events, BatchEvent::Started { total });

        let queue = Mutex::new(files.into_iter().collect::<VecDeque<_>>());
        let results = Mutex::new(BatchReport {
            output_dir: output_dir.clone(),
            ..BatchReport::default()
        });
        let namer = OutputNamer::new(&output_dir);
        let started = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for worker in 0..self.workers.min(total.max(1)) {
                let events = events.clone();
                let (queue, results, namer, started) = (&queue, &results, &namer, &started);
                scope.spawn(move || {
                    loop {
                        if self.stop.is_stopped() {
                            debug!(hilo = worker, "Parada solicitada");
                            break;
                        }
                        let next = lock(queue).pop_front();
                        let Some(path) = next else { break };

                        let index = started.fetch_add(1, Ordering::SeqCst) + 1;
                        send(&events, BatchEvent::Processing { index, total, path: path.clone() });

                        let output = namer.reserve(&path);
                        let report = self.cleaner.clean_file(&path, &output, options);
                        let event = match report.output() {
                            Some(output) if report.is_success() => BatchEvent::Success {
                                path: path.clone(),
                                output: output.to_path_buf(),
                            },
                            _ => BatchEvent::Failure {
                                path: path.clone(),
                                error: report.outcome.failure_reason().unwrap_or_default(),
                            },
                        };
                        send(&events, event);

                        let mut results = lock(results);
                        if report.is_success() {
                            results.succeeded.push(report);
                        } else {
                            results.failed.push(report);
                        }
                    }
                });
            }
        });

        let mut report = results.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        let remaining = queue.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !remaining.is_empty() {
            report.stopped = true;
            warn!(pendientes = remaining.len(), "Lote detenido antes de terminar");
            report
                .failed
                .extend(remaining.iter().map(|path| FileReport::not_started(path)));
        }
        report.succeeded.sort_by(|a, b| a.source.cmp(&b.source));
        report.failed.sort_by(|a, b| a.source.cmp(&b.source));

        info!(
            exitos = report.succeeded.len(),
            fallos = report.failed.len(),
            "Limpieza por lotes finalizada"
        );
        send(
            &events,
            BatchEvent::Finished {
                succeeded: report.succeeded.len(),
                failed: report.failed.len(),
            },
        );
        Ok(report)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn send(events: &Option<Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(sender) = events {
        let _ = sender.send(event);
    }
}
