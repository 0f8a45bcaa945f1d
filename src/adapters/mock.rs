//! Adaptador configurable para pruebas de la cadena y de los lotes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AdapterError;
use crate::metadata::MetadataMap;

use super::{BackendAdapter, Capability};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Behavior {
    /// Copia la entrada tal cual.
    Copy,
    Fail,
    /// Declara éxito pero escribe bytes que no son un archivo válido.
    Garbage,
}

#[derive(Clone)]
pub(crate) struct MockAdapter {
    name: &'static str,
    behavior: Behavior,
    available: bool,
    capability: Capability,
    preserves: bool,
    extracted: MetadataMap,
    delay: Duration,
    pub(crate) calls: Arc<AtomicUsize>,
    pub(crate) retained: Arc<Mutex<Vec<MetadataMap>>>,
}

impl MockAdapter {
    pub(crate) fn new(name: &'static str, behavior: Behavior) -> Self {
        Self {
            name,
            behavior,
            available: true,
            capability: Capability::ExtractAndRemove,
            preserves: false,
            extracted: MetadataMap::new(),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            retained: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub(crate) fn extract_only(mut self) -> Self {
        self.capability = Capability::ExtractOnly;
        self
    }

    pub(crate) fn preserving(mut self, extracted: MetadataMap) -> Self {
        self.preserves = true;
        self.extracted = extracted;
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_retained(&self) -> Option<MetadataMap> {
        self.retained.lock().ok()?.last().cloned()
    }
}

impl BackendAdapter for MockAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn capability(&self, _extension: &str) -> Capability {
        self.capability
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn preserves_fields(&self) -> bool {
        self.preserves
    }

    fn extract(&self, _path: &Path) -> Result<MetadataMap, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Fail => Err(AdapterError::parse("fallo simulado")),
            _ => Ok(self.extracted.clone()),
        }
    }

    fn remove(
        &self,
        input: &Path,
        output: &Path,
        retained: &MetadataMap,
    ) -> Result<PathBuf, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.retained.lock() {
            seen.push(retained.clone());
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match self.behavior {
            Behavior::Copy => {
                std::fs::copy(input, output)?;
            }
            Behavior::Fail => return Err(AdapterError::parse("fallo simulado")),
            Behavior::Garbage => std::fs::write(output, b"basura")?,
        }
        Ok(output.to_path_buf())
    }
}
