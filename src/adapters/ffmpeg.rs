//! Contenedores de audio y video vía `ffprobe` y `ffmpeg`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::error::AdapterError;
use crate::metadata::{FieldKey, FieldValue, MetadataMap};

use super::process::{guarded_path, run_checked};
use super::tools::{FFMPEG, FFPROBE, ToolAvailability};
use super::{BackendAdapter, Capability};

pub struct FfmpegAdapter {
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeSection>,
    #[serde(default)]
    streams: Vec<ProbeSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeSection {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, serde_json::Value>,
}

impl FfmpegAdapter {
    pub fn new(tools: &ToolAvailability, timeout: Duration) -> Self {
        Self {
            ffmpeg: tools.ffmpeg().map(Path::to_path_buf),
            ffprobe: tools.ffprobe().map(Path::to_path_buf),
            timeout,
        }
    }

    fn command(binary: Option<&PathBuf>, tool: &'static str) -> Result<Command, AdapterError> {
        let binary = binary.ok_or_else(|| AdapterError::Spawn {
            tool,
            reason: "no se encontró en el PATH".to_string(),
        })?;
        Ok(Command::new(binary))
    }
}

impl BackendAdapter for FfmpegAdapter {
    fn name(&self) -> &'static str {
        FFMPEG
    }

    fn capability(&self, extension: &str) -> Capability {
        match extension {
            "mp3" | "flac" | "wav" | "ogg" | "m4a" | "mp4" | "mov" | "m4v" | "mkv" | "avi"
            | "webm" => Capability::ExtractAndRemove,
            _ => Capability::ExtractOnly,
        }
    }

    fn is_available(&self) -> bool {
        self.ffmpeg.is_some() && self.ffprobe.is_some()
    }

    fn extract(&self, path: &Path) -> Result<MetadataMap, AdapterError> {
        let mut command = Self::command(self.ffprobe.as_ref(), FFPROBE)?;
        command
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(guarded_path(path).as_ref());
        let output = run_checked(FFPROBE, &mut command, self.timeout)?;
        parse_probe_output(&output.stdout_text())
    }

    fn remove(
        &self,
        input: &Path,
        output: &Path,
        _retained: &MetadataMap,
    ) -> Result<PathBuf, AdapterError> {
        let mut command = Self::command(self.ffmpeg.as_ref(), FFMPEG)?;
        command
            .args(["-y", "-v", "error", "-i"])
            .arg(guarded_path(input).as_ref())
            .args(["-map", "0", "-map_metadata", "-1", "-map_chapters", "-1", "-c", "copy"])
            .arg(guarded_path(output).as_ref());
        run_checked(FFMPEG, &mut command, self.timeout)?;
        Ok(output.to_path_buf())
    }
}

/// Convierte las etiquetas de formato y de cada stream en campos
/// `Format:clave` y `Stream<n>:clave`.
pub fn parse_probe_output(stdout: &str) -> Result<MetadataMap, AdapterError> {
    let probe: ProbeOutput = serde_json::from_str(stdout)
        .map_err(|e| AdapterError::parse(format!("JSON de ffprobe inválido: {e}")))?;

    let mut map = MetadataMap::new();
    if let Some(format) = &probe.format {
        insert_tags(&mut map, "Format", format);
    }
    for (index, stream) in probe.streams.iter().enumerate() {
        insert_tags(&mut map, &format!("Stream{index}"), stream);
        if let Some(kind) = &stream.codec_type {
            tracing::trace!(stream = index, tipo = %kind, "stream detectado");
        }
    }
    Ok(map)
}

fn insert_tags(map: &mut MetadataMap, group: &str, section: &ProbeSection) {
    for (key, value) in &section.tags {
        let text = match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        map.insert(FieldKey::name(format!("{group}:{key}")), FieldValue::Text(text));
    }
}
