//! Nombres de salida sin colisiones y rutas temporales para las escrituras.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const CLEANED_SUFFIX: &str = "_cleaned";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn cleaned_name(input: &Path, attempt: usize) -> String {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let suffix = if attempt == 0 {
        CLEANED_SUFFIX.to_string()
    } else {
        format!("{CLEANED_SUFFIX}_{attempt}")
    };
    match input.extension() {
        Some(extension) => format!("{stem}{suffix}.{}", extension.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    }
}

/// `<stem>_cleaned.<ext>` dentro de `dir`, o `_1`, `_2`, … si ya existe.
pub fn unique_output_path(dir: &Path, input: &Path) -> PathBuf {
    next_free(dir, input, |candidate| candidate.exists())
}

fn next_free<F>(dir: &Path, input: &Path, mut taken: F) -> PathBuf
where
    F: FnMut(&Path) -> bool,
{
    let mut attempt = 0;
    loop {
        let candidate = dir.join(cleaned_name(input, attempt));
        if !taken(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

/// Reserva de nombres compartida entre los hilos de un mismo lote.
#[derive(Debug)]
pub struct OutputNamer {
    dir: PathBuf,
    reserved: Mutex<HashSet<PathBuf>>,
}

impl OutputNamer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            reserved: Mutex::new(HashSet::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Devuelve un nombre libre en disco y no reservado por otro hilo.
    pub fn reserve(&self, input: &Path) -> PathBuf {
        let mut reserved = self
            .reserved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let path = next_free(&self.dir, input, |candidate| {
            candidate.exists() || reserved.contains(candidate)
        });
        reserved.insert(path.clone());
        path
    }
}

/// Ruta temporal oculta junto a `output` para el intento de `adapter`.
pub fn temp_path_for(output: &Path, adapter: &str) -> PathBuf {
    let parent = output.parent().unwrap_or_else(|| Path::new("."));
    let stem = output.file_stem().unwrap_or_default().to_string_lossy();
    let extension = output.extension().unwrap_or_default().to_string_lossy();

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);

    parent.join(format!(
        ".{stem}_{adapter}_{}_{timestamp}_{sequence}.{extension}",
        std::process::id()
    ))
}
