//! Detección única de herramientas externas en el `PATH`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

pub const EXIFTOOL: &str = "exiftool";
pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolAvailability {
    exiftool: Option<PathBuf>,
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
}

impl ToolAvailability {
    pub fn probe() -> Self {
        let found = Self {
            exiftool: locate(EXIFTOOL),
            ffmpeg: locate(FFMPEG),
            ffprobe: locate(FFPROBE),
        };
        debug!(
            exiftool = found.exiftool.is_some(),
            ffmpeg = found.ffmpeg.is_some(),
            ffprobe = found.ffprobe.is_some(),
            "Herramientas externas detectadas"
        );
        found
    }

    /// Disponibilidad fija, sin consultar el sistema.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn exiftool(&self) -> Option<&Path> {
        self.exiftool.as_deref()
    }

    pub fn ffmpeg(&self) -> Option<&Path> {
        self.ffmpeg.as_deref()
    }

    pub fn ffprobe(&self) -> Option<&Path> {
        self.ffprobe.as_deref()
    }
}

fn locate(binary: &str) -> Option<PathBuf> {
    which::which(binary).ok()
}

static TOOLS: OnceLock<ToolAvailability> = OnceLock::new();

/// Resultado de la detección, calculado una sola vez por proceso.
pub fn tool_availability() -> &'static ToolAvailability {
    TOOLS.get_or_init(ToolAvailability::probe)
}
