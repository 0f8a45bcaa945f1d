//! Errores del motor agrupados según quién los consume.
//!
//! - [`ValidationError`] termina el procesamiento de un archivo sin invocar adaptadores.
//! - [`AdapterError`] lo absorbe el despachador y solo aparece dentro de un fallo suave.
//! - [`ConfigError`] lo recupera localmente la carga de reglas.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("El archivo no existe: {0}")]
    NotFound(PathBuf),
    #[error("La ruta no es un archivo regular: {0}")]
    NotAFile(PathBuf),
    #[error("No se pudo leer {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
    #[error("El archivo está vacío: {0}")]
    Empty(PathBuf),
    #[error("Formato no soportado: {extension}")]
    Unsupported { extension: String },
}

impl ValidationError {
    /// Etiqueta corta para reportes y tablas.
    pub fn label(&self) -> &'static str {
        match self {
            ValidationError::NotFound(_) => "archivo no encontrado",
            ValidationError::NotAFile(_) => "no es un archivo",
            ValidationError::Unreadable { .. } => "sin permisos de lectura",
            ValidationError::Empty(_) => "archivo vacío",
            ValidationError::Unsupported { .. } => "formato no soportado",
        }
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Error de E/S: {0}")]
    Io(#[from] io::Error),
    #[error("No se pudo interpretar el contenido: {0}")]
    Parse(String),
    #[error("No se pudo ejecutar {tool}: {reason}")]
    Spawn { tool: &'static str, reason: String },
    #[error("{tool} terminó con estado {status}: {stderr}")]
    Tool {
        tool: &'static str,
        status: String,
        stderr: String,
    },
    #[error("{tool} superó el tiempo límite de {secs} s")]
    Timeout { tool: &'static str, secs: u64 },
    #[error("El contenedor `{0}` no es compatible con este adaptador")]
    UnsupportedContainer(String),
    #[error("La salida no superó la verificación de integridad: {0}")]
    Integrity(String),
    #[error("La verificación indicó que la metadata no se eliminó correctamente")]
    Verification,
}

impl AdapterError {
    pub fn parse(message: impl Into<String>) -> Self {
        AdapterError::Parse(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No se pudo leer el archivo de reglas: {0}")]
    Io(#[from] io::Error),
    #[error("JSON inválido en el archivo de reglas: {0}")]
    Json(#[from] serde_json::Error),
    #[error("El archivo de reglas debe contener un objeto JSON")]
    NotAnObject,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("La carpeta no existe: {0}")]
    NotFound(PathBuf),
    #[error("La ruta proporcionada no es un directorio: {0}")]
    NotADirectory(PathBuf),
    #[error("No se pudo crear la carpeta de salida {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("No se pudo recorrer {path}: {reason}")]
    Enumeration { path: PathBuf, reason: String },
    #[error("No se pudo escribir el reporte CSV: {0}")]
    Report(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("No se pudo extraer la metadata para el respaldo: {0}")]
    Extraction(String),
    #[error("Error de E/S en el respaldo: {0}")]
    Io(#[from] io::Error),
    #[error("Respaldo con formato inválido: {0}")]
    Json(#[from] serde_json::Error),
}
