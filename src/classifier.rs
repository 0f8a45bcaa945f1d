//! Clasificación de archivos por extensión y cadena de adaptadores asociada.

use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FileCategory {
    Image,
    Document,
    Audio,
    Video,
}

impl FileCategory {
    pub fn label(self) -> &'static str {
        match self {
            FileCategory::Image => "Imagen",
            FileCategory::Document => "Documento",
            FileCategory::Audio => "Audio",
            FileCategory::Video => "Video",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identificador estable de cada adaptador registrado.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AdapterId {
    ExifTool,
    ExifTags,
    PixelReencode,
    PdfRewrite,
    OfficeProps,
    Ffmpeg,
    AudioTags,
}

const IMAGE_CHAIN: &[AdapterId] = &[
    AdapterId::ExifTool,
    AdapterId::ExifTags,
    AdapterId::PixelReencode,
];
const PDF_CHAIN: &[AdapterId] = &[AdapterId::ExifTool, AdapterId::PdfRewrite];
const OFFICE_CHAIN: &[AdapterId] = &[AdapterId::OfficeProps, AdapterId::ExifTool];
const TAGGED_AUDIO_CHAIN: &[AdapterId] = &[
    AdapterId::ExifTool,
    AdapterId::Ffmpeg,
    AdapterId::AudioTags,
];
const AUDIO_CHAIN: &[AdapterId] = &[AdapterId::ExifTool, AdapterId::Ffmpeg];
const VIDEO_CHAIN: &[AdapterId] = &[AdapterId::Ffmpeg, AdapterId::ExifTool];

const EXTENSION_TABLE: &[(&str, FileCategory, &[AdapterId])] = &[
    ("jpg", FileCategory::Image, IMAGE_CHAIN),
    ("jpeg", FileCategory::Image, IMAGE_CHAIN),
    ("png", FileCategory::Image, IMAGE_CHAIN),
    ("tif", FileCategory::Image, IMAGE_CHAIN),
    ("tiff", FileCategory::Image, IMAGE_CHAIN),
    ("webp", FileCategory::Image, IMAGE_CHAIN),
    ("heic", FileCategory::Image, IMAGE_CHAIN),
    ("pdf", FileCategory::Document, PDF_CHAIN),
    ("docx", FileCategory::Document, OFFICE_CHAIN),
    ("xlsx", FileCategory::Document, OFFICE_CHAIN),
    ("pptx", FileCategory::Document, OFFICE_CHAIN),
    ("mp3", FileCategory::Audio, TAGGED_AUDIO_CHAIN),
    ("flac", FileCategory::Audio, TAGGED_AUDIO_CHAIN),
    ("wav", FileCategory::Audio, TAGGED_AUDIO_CHAIN),
    ("ogg", FileCategory::Audio, AUDIO_CHAIN),
    ("m4a", FileCategory::Audio, AUDIO_CHAIN),
    ("mp4", FileCategory::Video, VIDEO_CHAIN),
    ("mov", FileCategory::Video, VIDEO_CHAIN),
    ("m4v", FileCategory::Video, VIDEO_CHAIN),
    ("mkv", FileCategory::Video, VIDEO_CHAIN),
    ("avi", FileCategory::Video, VIDEO_CHAIN),
    ("webm", FileCategory::Video, VIDEO_CHAIN),
];

/// Resultado de clasificar una ruta.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Supported {
        category: FileCategory,
        extension: String,
        adapters: &'static [AdapterId],
    },
    Unsupported {
        extension: String,
    },
}

impl Classification {
    pub fn category(&self) -> Option<FileCategory> {
        match self {
            Classification::Supported { category, .. } => Some(*category),
            Classification::Unsupported { .. } => None,
        }
    }

    pub fn extension(&self) -> &str {
        match self {
            Classification::Supported { extension, .. } => extension,
            Classification::Unsupported { extension } => extension,
        }
    }

    pub fn adapters(&self) -> &'static [AdapterId] {
        match self {
            Classification::Supported { adapters, .. } => adapters,
            Classification::Unsupported { .. } => &[],
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Classification::Supported { .. })
    }
}

/// Extensión en minúsculas, vacía si la ruta no tiene.
pub fn normalized_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

pub fn classify(path: &Path) -> Classification {
    classify_extension(&normalized_extension(path))
}

pub fn classify_extension(extension: &str) -> Classification {
    let extension = extension.to_ascii_lowercase();
    match EXTENSION_TABLE
        .iter()
        .find(|(known, _, _)| *known == extension)
    {
        Some((_, category, adapters)) => Classification::Supported {
            category: *category,
            extension,
            adapters,
        },
        None => Classification::Unsupported { extension },
    }
}

pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    EXTENSION_TABLE.iter().map(|(ext, _, _)| *ext)
}

pub fn is_supported(path: &Path) -> bool {
    classify(path).is_supported()
}
