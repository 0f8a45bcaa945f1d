//! Contrato común de los adaptadores de metadata y registro por identificador.
//!
//! Cada adaptador declara qué puede hacer con una extensión y devuelve
//! errores como valores: el despachador decide si probar el siguiente.

pub mod audio_tags;
pub mod exif_tags;
pub mod exiftool;
pub mod ffmpeg;
pub mod office;
pub mod pdf;
pub mod pixel;
pub mod process;
pub mod tools;

#[cfg(test)]
pub(crate) mod mock;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::classifier::AdapterId;
use crate::config::Settings;
use crate::error::AdapterError;
use crate::metadata::MetadataMap;

pub use audio_tags::AudioTagsAdapter;
pub use exif_tags::ExifTagsAdapter;
pub use exiftool::ExifToolAdapter;
pub use ffmpeg::FfmpegAdapter;
pub use office::OfficePropsAdapter;
pub use pdf::PdfRewriteAdapter;
pub use pixel::PixelReencodeAdapter;
pub use tools::{ToolAvailability, tool_availability};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    ExtractOnly,
    ExtractAndRemove,
}

impl Capability {
    pub fn can_remove(self) -> bool {
        self == Capability::ExtractAndRemove
    }
}

pub trait BackendAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn capability(&self, extension: &str) -> Capability;

    /// `false` cuando falta la herramienta externa; el adaptador se omite.
    fn is_available(&self) -> bool {
        true
    }

    /// Si `remove` puede volver a escribir los campos de `retained`.
    fn preserves_fields(&self) -> bool {
        false
    }

    fn extract(&self, path: &Path) -> Result<MetadataMap, AdapterError>;

    /// Escribe en `output` una copia de `input` sin metadata salvo `retained`.
    fn remove(
        &self,
        input: &Path,
        output: &Path,
        retained: &MetadataMap,
    ) -> Result<PathBuf, AdapterError>;
}

/// Adaptadores disponibles indexados por [`AdapterId`].
#[derive(Default)]
pub struct Backends {
    adapters: HashMap<AdapterId, Box<dyn BackendAdapter>>,
}

impl Backends {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registro completo usando la detección de herramientas del proceso.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_tools(tool_availability(), settings)
    }

    pub fn with_tools(tools: &ToolAvailability, settings: &Settings) -> Self {
        let timeout = settings.tool_timeout;
        Self::empty()
            .with(AdapterId::ExifTool, ExifToolAdapter::new(tools, timeout))
            .with(AdapterId::ExifTags, ExifTagsAdapter)
            .with(AdapterId::PixelReencode, PixelReencodeAdapter)
            .with(AdapterId::PdfRewrite, PdfRewriteAdapter)
            .with(AdapterId::OfficeProps, OfficePropsAdapter)
            .with(AdapterId::Ffmpeg, FfmpegAdapter::new(tools, timeout))
            .with(AdapterId::AudioTags, AudioTagsAdapter)
    }

    pub fn register(&mut self, id: AdapterId, adapter: impl BackendAdapter + 'static) {
        self.adapters.insert(id, Box::new(adapter));
    }

    pub fn with(mut self, id: AdapterId, adapter: impl BackendAdapter + 'static) -> Self {
        self.register(id, adapter);
        self
    }

    pub fn get(&self, id: AdapterId) -> Option<&dyn BackendAdapter> {
        self.adapters.get(&id).map(|adapter| adapter.as_ref())
    }

    /// Resuelve una cadena de identificadores; los no registrados se omiten.
    pub fn chain(&self, ids: &[AdapterId]) -> Vec<&dyn BackendAdapter> {
        ids.iter().filter_map(|id| self.get(*id)).collect()
    }
}
