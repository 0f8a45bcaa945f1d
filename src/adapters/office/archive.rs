use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::AdapterError;

fn zip_error(context: &str, error: impl std::fmt::Display) -> AdapterError {
    AdapterError::parse(format!("{context}: {error}"))
}

pub(crate) fn open_package(path: &Path) -> Result<ZipArchive<File>, AdapterError> {
    let file = File::open(path)?;
    ZipArchive::new(file).map_err(|e| zip_error("No es un documento Office válido", e))
}

/// Lee una parte del paquete; `None` si no existe.
pub(crate) fn read_part(
    archive: &mut ZipArchive<File>,
    name: &str,
) -> Result<Option<Vec<u8>>, AdapterError> {
    match archive.by_name(name) {
        Ok(mut entry) => {
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents)?;
            Ok(Some(contents))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(zip_error(&format!("No se pudo acceder a {name}"), e)),
    }
}

/// Copia el paquete entrada por entrada aplicando `transform` al contenido.
///
/// Conserva método de compresión, permisos y fecha de cada entrada.
/// Devuelve si alguna transformación modificó datos.
pub(crate) fn rewrite_package<F>(
    input: &Path,
    output: &Path,
    mut transform: F,
) -> Result<bool, AdapterError>
where
    F: FnMut(&str, Vec<u8>) -> Result<(Vec<u8>, bool), AdapterError>,
{
    let mut archive = open_package(input)?;
    let mut writer = ZipWriter::new(File::create(output)?);
    let mut modified_any = false;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| zip_error("Error leyendo entrada del ZIP", e))?;
        let name = entry.name().to_string();

        let mut options = FileOptions::<'_, ()>::default().compression_method(entry.compression());
        if let Some(mode) = entry.unix_mode() {
            options = options.unix_permissions(mode);
        }
        if let Some(time) = entry.last_modified() {
            options = options.last_modified_time(time);
        }

        if entry.is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|e| zip_error("Error creando directorio en ZIP", e))?;
            continue;
        }

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        let (contents, changed) = transform(&name, contents)?;
        modified_any |= changed;

        writer
            .start_file(name, options)
            .map_err(|e| zip_error("Error escribiendo entrada", e))?;
        writer.write_all(&contents)?;
    }

    writer
        .finish()
        .map_err(|e| zip_error("Error finalizando el paquete", e))?;
    Ok(modified_any)
}
