//! Despachador con cadena de respaldo.
//!
//! Valida la entrada una sola vez, recorre los adaptadores de la categoría en
//! orden de prioridad y acepta el primer resultado que supera la verificación
//! de integridad. Los errores de adaptador se registran y nunca interrumpen la
//! cadena; solo la validación produce un fallo definitivo.

use serde::Serialize;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::adapters::{BackendAdapter, Backends};
use crate::classifier::{Classification, FileCategory, classify};
use crate::config::Settings;
use crate::error::{AdapterError, ValidationError};
use crate::filter::{self, RuleSet};
use crate::metadata::MetadataMap;
use crate::output::temp_path_for;

/// Un intento fallido dentro de la cadena.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdapterAttempt {
    pub adapter: &'static str,
    pub error: String,
}

/// Resultado etiquetado de una operación despachada.
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch<T> {
    Success(T),
    /// Todos los adaptadores candidatos fallaron.
    SoftFailure(Vec<AdapterAttempt>),
    /// La entrada no pasó la validación; no se invocó ningún adaptador.
    HardFailure(ValidationError),
}

pub type DispatchOutcome = Dispatch<PathBuf>;
pub type ExtractionOutcome = Dispatch<MetadataMap>;

impl<T> Dispatch<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Dispatch::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Dispatch::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            Dispatch::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> Dispatch<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Dispatch::Success(value) => Dispatch::Success(f(value)),
            Dispatch::SoftFailure(attempts) => Dispatch::SoftFailure(attempts),
            Dispatch::HardFailure(error) => Dispatch::HardFailure(error),
        }
    }

    pub fn attempts(&self) -> &[AdapterAttempt] {
        match self {
            Dispatch::SoftFailure(attempts) => attempts,
            _ => &[],
        }
    }

    /// Texto breve del fallo, `None` si fue un éxito.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Dispatch::Success(_) => None,
            Dispatch::HardFailure(error) => Some(error.to_string()),
            Dispatch::SoftFailure(attempts) if attempts.is_empty() => {
                Some("ningún adaptador disponible para este formato".to_string())
            }
            Dispatch::SoftFailure(attempts) => Some(format!(
                "todas las herramientas fallaron ({})",
                attempts
                    .iter()
                    .map(|attempt| attempt.adapter)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Qué debe conservar cada intento de eliminación.
#[derive(Clone, Copy, Debug)]
pub enum Retention<'a> {
    StripAll,
    /// Extrae con el mismo adaptador y conserva lo que permitan las reglas.
    Filter(&'a RuleSet),
    /// Reinserta exactamente estos campos.
    Embed(&'a MetadataMap),
}

/// Comprueba existencia, tipo, permisos, tamaño y extensión.
pub fn validate_input(path: &Path) -> Result<Classification, ValidationError> {
    let metadata = fs::metadata(path).map_err(|error| match error.kind() {
        std::io::ErrorKind::NotFound => ValidationError::NotFound(path.to_path_buf()),
        _ => ValidationError::Unreadable {
            path: path.to_path_buf(),
            reason: error.to_string(),
        },
    })?;

    if !metadata.is_file() {
        return Err(ValidationError::NotAFile(path.to_path_buf()));
    }

    File::open(path).map_err(|error| ValidationError::Unreadable {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;

    if metadata.len() == 0 {
        return Err(ValidationError::Empty(path.to_path_buf()));
    }

    let classification = classify(path);
    if !classification.is_supported() {
        return Err(ValidationError::Unsupported {
            extension: classification.extension().to_string(),
        });
    }
    Ok(classification)
}

/// Verificación de la salida declarada por un adaptador.
pub fn verify_output(path: &Path, classification: &Classification) -> Result<(), AdapterError> {
    let size = fs::metadata(path)
        .map_err(|_| AdapterError::Integrity("la salida no existe".to_string()))?
        .len();
    if size == 0 {
        return Err(AdapterError::Integrity("la salida está vacía".to_string()));
    }

    match classification.category() {
        Some(FileCategory::Image) => verify_image(path),
        Some(FileCategory::Document) if classification.extension() == "pdf" => {
            lopdf::Document::load(path)
                .map(|_| ())
                .map_err(|e| AdapterError::Integrity(format!("PDF ilegible: {e}")))
        }
        Some(FileCategory::Document) => verify_office_package(path),
        Some(FileCategory::Audio | FileCategory::Video) => verify_media(path),
        None => Err(AdapterError::UnsupportedContainer(
            classification.extension().to_string(),
        )),
    }
}

fn verify_image(path: &Path) -> Result<(), AdapterError> {
    let decoded = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .ok()
        .and_then(|reader| reader.into_dimensions().ok());
    if decoded.is_some() {
        return Ok(());
    }
    match infer::get_from_path(path)? {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(()),
        _ => Err(AdapterError::Integrity("la imagen no se puede abrir".to_string())),
    }
}

fn verify_office_package(path: &Path) -> Result<(), AdapterError> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)
        .map_err(|e| AdapterError::Integrity(format!("ZIP inválido: {e}")))?;
    archive
        .by_name("[Content_Types].xml")
        .map(|_| ())
        .map_err(|_| AdapterError::Integrity("falta [Content_Types].xml".to_string()))
}

fn verify_media(path: &Path) -> Result<(), AdapterError> {
    if let Some(kind) = infer::get_from_path(path)? {
        if matches!(
            kind.matcher_type(),
            infer::MatcherType::Audio | infer::MatcherType::Video
        ) {
            return Ok(());
        }
    }

    let mut header = [0_u8; 2];
    File::open(path)?.read_exact(&mut header)?;
    if header[0] == 0xFF && header[1] & 0xE0 == 0xE0 {
        return Ok(());
    }
    Err(AdapterError::Integrity("contenido multimedia no reconocido".to_string()))
}

fn discard(path: &Path) {
    if path.exists() {
        if let Err(error) = fs::remove_file(path) {
            warn!(ruta = %path.display(), %error, "No se pudo borrar la salida parcial");
        }
    }
}

fn retained_fields(
    adapter: &dyn BackendAdapter,
    input: &Path,
    classification: &Classification,
    retention: Retention<'_>,
) -> Result<MetadataMap, AdapterError> {
    match retention {
        Retention::StripAll => Ok(MetadataMap::new()),
        Retention::Filter(rules) => {
            if classification.category() != Some(FileCategory::Image) || !adapter.preserves_fields() {
                return Ok(MetadataMap::new());
            }
            let extracted = adapter.extract(input)?;
            Ok(filter::apply(&extracted, rules))
        }
        Retention::Embed(fields) => Ok(fields.clone()),
    }
}

fn attempt_removal(
    adapter: &dyn BackendAdapter,
    input: &Path,
    output: &Path,
    classification: &Classification,
    retention: Retention<'_>,
) -> Result<PathBuf, AdapterError> {
    let retained = retained_fields(adapter, input, classification, retention)?;
    let temp = temp_path_for(output, adapter.name());

    let written = match adapter.remove(input, &temp, &retained) {
        Ok(written) => written,
        Err(error) => {
            discard(&temp);
            return Err(error);
        }
    };

    if let Err(error) = verify_output(&written, classification) {
        discard(&written);
        discard(&temp);
        return Err(error);
    }

    if let Err(error) = fs::rename(&written, output) {
        discard(&written);
        return Err(AdapterError::Io(error));
    }
    Ok(output.to_path_buf())
}

/// Eliminación sobre una cadena ya resuelta.
pub fn remove_with_chain(
    input: &Path,
    output: &Path,
    classification: &Classification,
    chain: &[&dyn BackendAdapter],
    retention: Retention<'_>,
) -> DispatchOutcome {
    let extension = classification.extension();
    let mut attempts = Vec::new();

    for adapter in chain {
        if !adapter.is_available() {
            debug!(adaptador = adapter.name(), "No disponible, se omite");
            continue;
        }
        if !adapter.capability(extension).can_remove() {
            debug!(adaptador = adapter.name(), extension, "Solo lectura para esta extensión, se omite");
            continue;
        }
        if matches!(retention, Retention::Embed(_)) && !adapter.preserves_fields() {
            debug!(adaptador = adapter.name(), "No puede reinsertar campos, se omite");
            continue;
        }

        debug!(adaptador = adapter.name(), archivo = %input.display(), "Intentando eliminación");
        match attempt_removal(*adapter, input, output, classification, retention) {
            Ok(path) => {
                info!(adaptador = adapter.name(), salida = %path.display(), "Metadata eliminada");
                return Dispatch::Success(path);
            }
            Err(error) => {
                warn!(adaptador = adapter.name(), %error, "El adaptador falló, se prueba el siguiente");
                attempts.push(AdapterAttempt {
                    adapter: adapter.name(),
                    error: error.to_string(),
                });
            }
        }
    }

    Dispatch::SoftFailure(attempts)
}

/// Extracción sobre una cadena ya resuelta.
pub fn extract_with_chain(path: &Path, chain: &[&dyn BackendAdapter]) -> ExtractionOutcome {
    let mut attempts = Vec::new();

    for adapter in chain {
        if !adapter.is_available() {
            debug!(adaptador = adapter.name(), "No disponible, se omite");
            continue;
        }
        debug!(adaptador = adapter.name(), archivo = %path.display(), "Intentando extracción");
        match adapter.extract(path) {
            Ok(map) => {
                debug!(adaptador = adapter.name(), campos = map.len(), "Metadata extraída");
                return Dispatch::Success(map);
            }
            Err(error) => {
                warn!(adaptador = adapter.name(), %error, "La extracción falló, se prueba el siguiente");
                attempts.push(AdapterAttempt {
                    adapter: adapter.name(),
                    error: error.to_string(),
                });
            }
        }
    }

    Dispatch::SoftFailure(attempts)
}

pub struct FallbackDispatcher {
    backends: Backends,
}

impl FallbackDispatcher {
    pub fn new(backends: Backends) -> Self {
        Self { backends }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Backends::from_settings(settings))
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn extract(&self, path: &Path) -> ExtractionOutcome {
        let classification = match validate_input(path) {
            Ok(classification) => classification,
            Err(error) => return Dispatch::HardFailure(error),
        };
        let chain = self.backends.chain(classification.adapters());
        extract_with_chain(path, &chain)
    }

    /// Limpia `path` en `output`. Con reglas, las imágenes conservan los
    /// campos permitidos; el resto se limpia por completo.
    pub fn remove(&self, path: &Path, output: &Path, rules: Option<&RuleSet>) -> DispatchOutcome {
        let retention = rules.map_or(Retention::StripAll, Retention::Filter);
        self.run_removal(path, output, retention)
    }

    /// Reinserta `fields` en una copia limpia de `path`.
    pub fn restore(&self, path: &Path, output: &Path, fields: &MetadataMap) -> DispatchOutcome {
        self.run_removal(path, output, Retention::Embed(fields))
    }

    fn run_removal(&self, path: &Path, output: &Path, retention: Retention<'_>) -> DispatchOutcome {
        let classification = match validate_input(path) {
            Ok(classification) => classification,
            Err(error) => {
                warn!(archivo = %path.display(), %error, "Entrada rechazada");
                return Dispatch::HardFailure(error);
            }
        };
        let chain = self.backends.chain(classification.adapters());
        remove_with_chain(path, output, &classification, &chain, retention)
    }
}
