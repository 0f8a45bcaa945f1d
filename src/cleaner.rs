//! Limpieza de un archivo: respaldo opcional, simulación y despacho.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::backup::{read_backup, write_backup};
use crate::classifier::{FileCategory, classify};
use crate::config::Settings;
use crate::dispatcher::{AdapterAttempt, Dispatch, DispatchOutcome, FallbackDispatcher};
use crate::error::BackupError;
use crate::filter::{self, RuleSet};
use crate::metadata::MetadataMap;
use crate::output::unique_output_path;

#[derive(Clone, Debug, Default)]
pub struct CleanOptions {
    pub rules: Option<RuleSet>,
    /// Solo extrae e informa; no escribe nada.
    pub dry_run: bool,
    pub backup: bool,
}

#[derive(Clone, Debug)]
pub struct FileReport {
    pub source: PathBuf,
    pub outcome: DispatchOutcome,
    /// Campos encontrados antes de limpiar, cuando hubo que extraerlos.
    pub fields_before: Option<usize>,
    /// En simulación, los campos que se conservarían.
    pub planned: Option<MetadataMap>,
    pub backup: Option<PathBuf>,
    pub dry_run: bool,
}

impl FileReport {
    fn new(source: &Path, outcome: DispatchOutcome) -> Self {
        Self {
            source: source.to_path_buf(),
            outcome,
            fields_before: None,
            planned: None,
            backup: None,
            dry_run: false,
        }
    }

    /// Archivo que un lote no llegó a procesar.
    pub(crate) fn not_started(source: &Path) -> Self {
        Self::new(
            source,
            Dispatch::SoftFailure(vec![AdapterAttempt {
                adapter: "batch",
                error: "el lote se detuvo antes de procesarlo".to_string(),
            }]),
        )
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn output(&self) -> Option<&Path> {
        self.outcome.success().map(PathBuf::as_path)
    }
}

/// Ruta de salida: la indicada, un nombre libre dentro de un directorio o
/// junto a la entrada.
pub fn resolve_output(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => unique_output_path(path, input),
        Some(path) => path.to_path_buf(),
        None => {
            let parent = input.parent().unwrap_or_else(|| Path::new("."));
            unique_output_path(parent, input)
        }
    }
}

fn planned_fields(path: &Path, extracted: &MetadataMap, rules: Option<&RuleSet>) -> MetadataMap {
    match (classify(path).category(), rules) {
        (Some(FileCategory::Image), Some(rules)) => filter::apply(extracted, rules),
        _ => MetadataMap::new(),
    }
}

pub struct Cleaner {
    dispatcher: FallbackDispatcher,
}

impl Cleaner {
    pub fn new(dispatcher: FallbackDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(FallbackDispatcher::from_settings(settings))
    }

    pub fn dispatcher(&self) -> &FallbackDispatcher {
        &self.dispatcher
    }

    pub fn clean_file(&self, input: &Path, output: &Path, options: &CleanOptions) -> FileReport {
        if options.dry_run {
            return self.simulate(input, output, options.rules.as_ref());
        }

        let mut report = FileReport::new(input, Dispatch::SoftFailure(Vec::new()));

        if options.backup {
            let extracted = match self.dispatcher.extract(input) {
                Dispatch::Success(map) => map,
                other => {
                    report.outcome = other.map(|_| PathBuf::new());
                    return report;
                }
            };
            report.fields_before = Some(extracted.len());
            match write_backup(input, &extracted) {
                Ok(path) => report.backup = Some(path),
                Err(err) => {
                    error!(archivo = %input.display(), error = %err, "No se pudo escribir el respaldo; el archivo no se modifica");
                    report.outcome = Dispatch::SoftFailure(vec![AdapterAttempt {
                        adapter: "backup",
                        error: err.to_string(),
                    }]);
                    return report;
                }
            }
        }

        report.outcome = self.dispatcher.remove(input, output, options.rules.as_ref());
        match &report.outcome {
            Dispatch::Success(path) => {
                info!(archivo = %input.display(), salida = %path.display(), "Archivo limpio")
            }
            failure => error!(
                archivo = %input.display(),
                motivo = %failure.failure_reason().unwrap_or_default(),
                "No se pudo limpiar el archivo"
            ),
        }
        report
    }

    fn simulate(&self, input: &Path, output: &Path, rules: Option<&RuleSet>) -> FileReport {
        let extracted = self.dispatcher.extract(input);
        let mut report = FileReport::new(input, Dispatch::SoftFailure(Vec::new()));
        report.dry_run = true;

        match extracted {
            Dispatch::Success(map) => {
                let planned = planned_fields(input, &map, rules);
                info!(
                    archivo = %input.display(),
                    campos = map.len(),
                    conservados = planned.len(),
                    "Simulación: no se escribe ningún archivo"
                );
                report.fields_before = Some(map.len());
                report.planned = Some(planned);
                report.outcome = Dispatch::Success(output.to_path_buf());
            }
            failure => report.outcome = failure.map(|_| PathBuf::new()),
        }
        report
    }

    /// Reinserta los campos de un respaldo en una copia limpia de `input`.
    pub fn restore(&self, input: &Path, backup: &Path, output: &Path) -> Result<FileReport, BackupError> {
        let artifact = read_backup(backup)?;
        let outcome = self.dispatcher.restore(input, output, &artifact.fields);
        let mut report = FileReport::new(input, outcome);
        report.fields_before = Some(artifact.fields.len());
        report.backup = Some(backup.to_path_buf());
        Ok(report)
    }
}
