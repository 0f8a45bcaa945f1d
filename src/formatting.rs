use chrono::{DateTime, Local, Utc};
use std::fs;
use std::path::Path;

use crate::metadata::FieldValue;

const MAX_VALUE_CHARS: usize = 80;

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["bytes", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit_index = 0;

    while value >= 1024.0 && unit_index < UNITS.len() - 1 {
        value /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{bytes} bytes")
    } else {
        format!("{value:.2} {}", UNITS[unit_index])
    }
}

/// Tamaño en disco, o "No disponible" si no se puede leer.
pub fn file_size_label(path: &Path) -> String {
    fs::metadata(path)
        .map(|metadata| format_size(metadata.len()))
        .unwrap_or_else(|_| "No disponible".to_string())
}

pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}

/// Valor de un campo recortado para una celda de tabla.
pub fn format_field_value(value: &FieldValue) -> String {
    let text = value.to_string();
    if text.chars().count() <= MAX_VALUE_CHARS {
        return text;
    }
    let truncated: String = text.chars().take(MAX_VALUE_CHARS).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MiB");
    }

    #[test]
    fn long_values_are_truncated() {
        let long = FieldValue::text("x".repeat(200));
        let formatted = format_field_value(&long);
        assert_eq!(formatted.chars().count(), MAX_VALUE_CHARS + 1);
        assert!(formatted.ends_with('…'));
        assert_eq!(format_field_value(&FieldValue::text("Canon")), "Canon");
    }
}
