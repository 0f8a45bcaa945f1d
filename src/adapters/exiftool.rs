//! Adaptador sobre el binario `exiftool`.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::error::AdapterError;
use crate::metadata::{FieldKey, FieldValue, MetadataMap};

use super::process::{guarded_path, run_checked};
use super::tools::{EXIFTOOL, ToolAvailability};
use super::{BackendAdapter, Capability};

/// Grupos informativos que exiftool calcula y que no son metadata del archivo.
const SYNTHETIC_GROUPS: &[&str] = &["ExifTool", "System", "File", "Composite"];

const WRITABLE_GROUPS: &[&str] = &["IFD0", "ExifIFD", "GPS", "InteropIFD", "IPTC", "PDF"];

const GPS_COORDINATES: &[&str] = &[
    "GPSLatitude",
    "GPSLongitude",
    "GPSDestLatitude",
    "GPSDestLongitude",
];

pub struct ExifToolAdapter {
    binary: Option<PathBuf>,
    timeout: Duration,
}

impl ExifToolAdapter {
    pub fn new(tools: &ToolAvailability, timeout: Duration) -> Self {
        Self {
            binary: tools.exiftool().map(Path::to_path_buf),
            timeout,
        }
    }

    fn command(&self) -> Result<Command, AdapterError> {
        let binary = self.binary.as_ref().ok_or_else(|| AdapterError::Spawn {
            tool: EXIFTOOL,
            reason: "no se encontró en el PATH".to_string(),
        })?;
        Ok(Command::new(binary))
    }
}

impl BackendAdapter for ExifToolAdapter {
    fn name(&self) -> &'static str {
        EXIFTOOL
    }

    fn capability(&self, extension: &str) -> Capability {
        match extension {
            "jpg" | "jpeg" | "png" | "tif" | "tiff" | "webp" | "heic" | "pdf" | "mp4" | "mov"
            | "m4v" | "m4a" => Capability::ExtractAndRemove,
            _ => Capability::ExtractOnly,
        }
    }

    fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    fn preserves_fields(&self) -> bool {
        true
    }

    fn extract(&self, path: &Path) -> Result<MetadataMap, AdapterError> {
        let mut command = self.command()?;
        command
            .args(["-json", "-n", "-G1", "-a"])
            .arg(guarded_path(path).as_ref());
        let output = run_checked(EXIFTOOL, &mut command, self.timeout)?;
        parse_json_output(&output.stdout_text())
    }

    fn remove(
        &self,
        input: &Path,
        output: &Path,
        retained: &MetadataMap,
    ) -> Result<PathBuf, AdapterError> {
        let mut command = self.command()?;
        command
            .args(["-m", "-q", "-q", "-n", "-all="])
            .args(write_arguments(retained))
            .arg("-o")
            .arg(guarded_path(output).as_ref())
            .arg(guarded_path(input).as_ref());
        run_checked(EXIFTOOL, &mut command, self.timeout)?;
        Ok(output.to_path_buf())
    }
}

/// Convierte la salida `-json -G1` en un mapa con claves `Grupo:Etiqueta`.
pub fn parse_json_output(stdout: &str) -> Result<MetadataMap, AdapterError> {
    let parsed: Value = serde_json::from_str(stdout)
        .map_err(|e| AdapterError::parse(format!("JSON de exiftool inválido: {e}")))?;
    let object = parsed
        .as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_object)
        .ok_or_else(|| AdapterError::parse("exiftool no devolvió ningún objeto"))?;

    let mut map = MetadataMap::new();
    for (key, value) in object {
        let Some((group, _)) = key.split_once(':') else {
            continue;
        };
        if SYNTHETIC_GROUPS.contains(&group) {
            continue;
        }
        map.insert(FieldKey::name(key.clone()), json_to_value(value));
    }
    Ok(map)
}

fn json_to_value(value: &Value) -> FieldValue {
    match value {
        Value::String(text) => FieldValue::Text(text.clone()),
        Value::Number(number) => number_value(number),
        Value::Bool(flag) => FieldValue::text(flag.to_string()),
        Value::Array(items) => {
            let numbers: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
            match numbers {
                Some(numbers) => FieldValue::Float(numbers),
                None => FieldValue::Text(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::String(text) => text.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            }
        }
        Value::Null => FieldValue::text(""),
        Value::Object(_) => FieldValue::Text(value.to_string()),
    }
}

fn number_value(number: &serde_json::Number) -> FieldValue {
    if let Some(value) = number.as_u64().and_then(|v| u32::try_from(v).ok()) {
        return FieldValue::Long(vec![value]);
    }
    if let Some(value) = number.as_i64().and_then(|v| i32::try_from(v).ok()) {
        return FieldValue::SignedLong(vec![value]);
    }
    FieldValue::Float(vec![number.as_f64().unwrap_or_default()])
}

fn is_writable_group(group: &str) -> bool {
    WRITABLE_GROUPS.contains(&group) || group.starts_with("XMP-")
}

/// Asignaciones `-Grupo:Etiqueta=valor` para los campos conservados.
pub fn write_arguments(retained: &MetadataMap) -> Vec<String> {
    retained
        .iter()
        .filter_map(|(key, value)| {
            let group = key.group()?;
            if !is_writable_group(group) {
                return None;
            }
            let name = key.canonical_name();
            if name.starts_with("Tag0x") {
                return None;
            }
            let rendered = render_value(&name, value)?;
            Some(format!("-{group}:{name}={rendered}"))
        })
        .collect()
}

fn render_value(name: &str, value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(text) if text.starts_with("(Binary data") => None,
        FieldValue::Text(text) => Some(text.clone()),
        FieldValue::Undefined(_) | FieldValue::Byte(_) if name != "GPSAltitudeRef" => None,
        FieldValue::Rational(parts) if GPS_COORDINATES.contains(&name) && parts.len() == 3 => {
            let degrees = dms_to_decimal(value)?;
            Some(trim_float(degrees))
        }
        other => {
            let numbers = other.numbers()?;
            Some(
                numbers
                    .into_iter()
                    .map(trim_float)
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
    }
}

fn dms_to_decimal(value: &FieldValue) -> Option<f64> {
    let parts = value.numbers()?;
    let [degrees, minutes, seconds] = parts.as_slice() else {
        return None;
    };
    Some(degrees + minutes / 60.0 + seconds / 3600.0)
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", (value * 1e6).round() / 1e6)
    }
}
