//! Respaldo `<archivo>.metadata.bak` con la metadata previa a la limpieza.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::BackupError;
use crate::metadata::MetadataMap;

pub const BACKUP_EXTENSION: &str = "metadata.bak";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackupArtifact {
    pub source: PathBuf,
    /// SHA-256 del archivo original en hexadecimal.
    pub source_sha256: String,
    pub created_at: DateTime<Utc>,
    pub fields: MetadataMap,
}

impl BackupArtifact {
    pub fn new(source: &Path, fields: MetadataMap) -> Result<Self, BackupError> {
        Ok(Self {
            source: source.to_path_buf(),
            source_sha256: sha256_file(source)?,
            created_at: Utc::now(),
            fields,
        })
    }
}

pub fn backup_path(file: &Path) -> PathBuf {
    let name = file.file_name().unwrap_or_default().to_string_lossy();
    file.with_file_name(format!("{name}.{BACKUP_EXTENSION}"))
}

/// Escribe el respaldo junto a `source` y devuelve su ruta.
pub fn write_backup(source: &Path, fields: &MetadataMap) -> Result<PathBuf, BackupError> {
    let artifact = BackupArtifact::new(source, fields.clone())?;
    let path = backup_path(source);
    let json = serde_json::to_string_pretty(&artifact)?;
    fs::write(&path, json)?;
    tracing::info!(respaldo = %path.display(), campos = fields.len(), "Respaldo de metadata escrito");
    Ok(path)
}

pub fn read_backup(path: &Path) -> Result<BackupArtifact, BackupError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
