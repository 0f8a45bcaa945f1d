//! Transformaciones por categoría sobre un mapa de metadata.

use thiserror::Error;
use tracing::{debug, warn};

use crate::metadata::{FieldKey, FieldValue, MetadataMap, Rational, SignedRational};

use super::fields::{
    CAMERA_FIELDS, DESCRIPTION_FIELDS, GPS_ALTITUDE_FIELDS, GPS_COORDINATE_FIELDS,
    ORIENTATION_FIELDS, SOFTWARE_FIELDS, TIMESTAMP_DETAIL_FIELDS, TIMESTAMP_FIELDS,
    is_thumbnail_field, name_in,
};
use super::rules::{CameraMode, CameraPolicy, GpsMode, GpsPolicy, RuleCategory, RuleSet, TimestampMode};

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("{field}: denominador cero")]
    ZeroDenominator { field: String },
    #[error("{field}: tipo {found} no admitido")]
    UnexpectedType { field: String, found: &'static str },
    #[error("{field}: valor fuera de rango")]
    OutOfRange { field: String },
}

/// Devuelve un mapa nuevo con las reglas aplicadas. Los campos que no
/// pertenecen a ninguna categoría pasan sin cambios.
pub fn apply(metadata: &MetadataMap, rules: &RuleSet) -> MetadataMap {
    let mut current = metadata.clone();

    for category in RuleCategory::ALL {
        let mut candidate = current.clone();
        match apply_category(&mut candidate, category, rules) {
            Ok(()) => current = candidate,
            Err(error) => warn!(
                categoria = %category,
                %error,
                "No se pudo aplicar la regla; la categoría queda sin cambios"
            ),
        }
    }

    debug!(
        antes = metadata.len(),
        despues = current.len(),
        "Reglas de filtrado aplicadas"
    );
    current
}

fn apply_category(
    map: &mut MetadataMap,
    category: RuleCategory,
    rules: &RuleSet,
) -> Result<(), TransformError> {
    match category {
        RuleCategory::Orientation => strip_unless(map, rules.orientation, |k| {
            name_in(k, ORIENTATION_FIELDS)
        }),
        RuleCategory::Gps => apply_gps(map, &rules.gps)?,
        RuleCategory::Timestamp => apply_timestamp(map, rules.timestamp)?,
        RuleCategory::CameraSettings => apply_camera(map, &rules.camera),
        RuleCategory::Descriptions => strip_unless(map, rules.descriptions, |k| {
            name_in(k, DESCRIPTION_FIELDS)
        }),
        RuleCategory::Thumbnail => strip_unless(map, rules.thumbnail, is_thumbnail_field),
        RuleCategory::Software => strip_unless(map, rules.software, |k| {
            name_in(k, SOFTWARE_FIELDS)
        }),
    }
    Ok(())
}

fn strip_unless(map: &mut MetadataMap, keep: bool, belongs: impl Fn(&FieldKey) -> bool) {
    if !keep {
        map.retain(|key, _| !belongs(key));
    }
}

fn apply_gps(map: &mut MetadataMap, policy: &GpsPolicy) -> Result<(), TransformError> {
    match policy.mode {
        GpsMode::Remove => {
            map.retain(|key, _| !key.is_gps());
            return Ok(());
        }
        GpsMode::Exact => {}
        GpsMode::WholeDegrees => {
            let coordinates: Vec<FieldKey> = map
                .keys()
                .filter(|key| name_in(key, GPS_COORDINATE_FIELDS))
                .cloned()
                .collect();
            for key in coordinates {
                if let Some(value) = map.get_mut(&key) {
                    *value = round_coordinate(&key, value, policy.precision)?;
                }
            }
        }
    }

    if policy.remove_altitude {
        map.retain(|key, _| !name_in(key, GPS_ALTITUDE_FIELDS));
    }
    Ok(())
}

/// Redondea cada componente a `precision` decimales: `round(v·10^p) / 10^p`.
pub fn round_coordinate(
    key: &FieldKey,
    value: &FieldValue,
    precision: u32,
) -> Result<FieldValue, TransformError> {
    let field = key.to_string();
    let scale = 10_u32
        .checked_pow(precision)
        .ok_or_else(|| TransformError::OutOfRange {
            field: field.clone(),
        })?;

    match value {
        FieldValue::Rational(parts) => parts
            .iter()
            .map(|part| round_rational(*part, scale, &field))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::Rational),
        FieldValue::SignedRational(parts) => parts
            .iter()
            .map(|part| round_signed_rational(*part, scale, &field))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::SignedRational),
        FieldValue::Float(values) => Ok(FieldValue::Float(
            values
                .iter()
                .map(|v| round_decimal(*v, scale))
                .collect(),
        )),
        FieldValue::Text(text) => match text.trim().parse::<f64>() {
            Ok(v) => Ok(FieldValue::Text(round_decimal(v, scale).to_string())),
            Err(_) => Err(TransformError::UnexpectedType {
                field,
                found: value.type_name(),
            }),
        },
        other => Err(TransformError::UnexpectedType {
            field,
            found: other.type_name(),
        }),
    }
}

fn round_decimal(value: f64, scale: u32) -> f64 {
    let scale = f64::from(scale);
    (value * scale).round() / scale
}

fn round_rational(part: Rational, scale: u32, field: &str) -> Result<Rational, TransformError> {
    let value = part.to_f64().ok_or_else(|| TransformError::ZeroDenominator {
        field: field.to_string(),
    })?;
    let scaled = (value * f64::from(scale)).round();
    if !(0.0..=f64::from(u32::MAX)).contains(&scaled) {
        return Err(TransformError::OutOfRange {
            field: field.to_string(),
        });
    }
    Ok(Rational::new(scaled as u32, scale))
}

fn round_signed_rational(
    part: SignedRational,
    scale: u32,
    field: &str,
) -> Result<SignedRational, TransformError> {
    let value = part.to_f64().ok_or_else(|| TransformError::ZeroDenominator {
        field: field.to_string(),
    })?;
    let scaled = (value * f64::from(scale)).round();
    let denom = i32::try_from(scale).map_err(|_| TransformError::OutOfRange {
        field: field.to_string(),
    })?;
    if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&scaled) {
        return Err(TransformError::OutOfRange {
            field: field.to_string(),
        });
    }
    Ok(SignedRational {
        num: scaled as i32,
        denom,
    })
}

fn apply_timestamp(map: &mut MetadataMap, mode: TimestampMode) -> Result<(), TransformError> {
    match mode {
        TimestampMode::Exact => Ok(()),
        TimestampMode::Remove => {
            map.retain(|key, _| {
                !name_in(key, TIMESTAMP_FIELDS) && !name_in(key, TIMESTAMP_DETAIL_FIELDS)
            });
            Ok(())
        }
        TimestampMode::DateOnly => {
            let stamps: Vec<FieldKey> = map
                .keys()
                .filter(|key| name_in(key, TIMESTAMP_FIELDS))
                .cloned()
                .collect();
            for key in stamps {
                if let Some(value) = map.get_mut(&key) {
                    let Some(text) = value.as_text() else {
                        return Err(TransformError::UnexpectedType {
                            field: key.to_string(),
                            found: value.type_name(),
                        });
                    };
                    *value = FieldValue::Text(date_part(text).to_string());
                }
            }
            map.retain(|key, _| !name_in(key, TIMESTAMP_DETAIL_FIELDS));
            Ok(())
        }
    }
}

/// Parte de fecha de una marca temporal: todo lo anterior al primer espacio o `T`.
pub fn date_part(timestamp: &str) -> &str {
    let trimmed = timestamp.trim_end_matches('\0').trim();
    trimmed.split([' ', 'T']).next().unwrap_or(trimmed)
}

fn apply_camera(map: &mut MetadataMap, policy: &CameraPolicy) {
    match policy.mode {
        CameraMode::All => {}
        CameraMode::Remove => map.retain(|key, _| !name_in(key, CAMERA_FIELDS)),
        CameraMode::AllExceptMakeModel => {
            let preserve: Vec<&str> = policy.preserve.iter().map(String::as_str).collect();
            map.retain(|key, _| !name_in(key, CAMERA_FIELDS) || name_in(key, &preserve));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::rules::rules_from_str;
    use crate::metadata::TagContext;

    fn gps(number: u16) -> FieldKey {
        FieldKey::tag(0, TagContext::Gps, number)
    }

    fn sample_exif() -> MetadataMap {
        let mut map = MetadataMap::new();
        map.insert(
            gps(2),
            FieldValue::Rational(vec![
                Rational::new(40, 1),
                Rational::new(26, 1),
                Rational::new(0, 1),
            ]),
        );
        map.insert(gps(1), FieldValue::text("N"));
        map.insert(gps(6), FieldValue::Rational(vec![Rational::new(1234, 10)]));
        map.insert(gps(5), FieldValue::Byte(vec![0]));
        map.insert(
            FieldKey::tag(0, TagContext::Exif, 0x9003),
            FieldValue::text("2025:02:23 10:00:00"),
        );
        map.insert(
            FieldKey::tag(0, TagContext::Exif, 0x9291),
            FieldValue::text("123"),
        );
        map.insert(FieldKey::tag(0, TagContext::Tiff, 0x010F), FieldValue::text("Canon"));
        map.insert(FieldKey::tag(0, TagContext::Tiff, 0x0110), FieldValue::text("EOS R5"));
        map.insert(
            FieldKey::tag(0, TagContext::Exif, 0x829D),
            FieldValue::Rational(vec![Rational::new(28, 10)]),
        );
        map.insert(FieldKey::tag(0, TagContext::Tiff, 0x0112), FieldValue::Short(vec![6]));
        map.insert(
            FieldKey::tag(0, TagContext::Tiff, 0x010E),
            FieldValue::text("Casa de la playa"),
        );
        map.insert(FieldKey::tag(0, TagContext::Tiff, 0x0131), FieldValue::text("Lightroom"));
        map.insert(FieldKey::tag(1, TagContext::Tiff, 0x0103), FieldValue::Short(vec![6]));
        map.insert(
            FieldKey::tag(0, TagContext::Exif, 0xA001),
            FieldValue::Short(vec![1]),
        );
        map
    }

    #[test]
    fn default_rules_round_gps_to_whole_units_and_drop_altitude() {
        let filtered = apply(&sample_exif(), &RuleSet::default());

        assert_eq!(
            filtered.get(&gps(2)),
            Some(&FieldValue::Rational(vec![
                Rational::new(40, 1),
                Rational::new(26, 1),
                Rational::new(0, 1),
            ]))
        );
        assert!(filtered.get(&gps(6)).is_none());
        assert!(filtered.get(&gps(5)).is_none());
        assert_eq!(filtered.get(&gps(1)), Some(&FieldValue::text("N")));
    }

    #[test]
    fn default_rules_shape_the_rest_of_the_map() {
        let filtered = apply(&sample_exif(), &RuleSet::default());

        assert_eq!(
            filtered.find_by_name("DateTimeOriginal").map(|(_, v)| v),
            Some(&FieldValue::text("2025:02:23"))
        );
        assert!(!filtered.contains_name("SubSecTimeOriginal"));
        assert!(filtered.contains_name("Make"));
        assert!(filtered.contains_name("Model"));
        assert!(!filtered.contains_name("FNumber"));
        assert!(filtered.contains_name("Orientation"));
        assert!(!filtered.contains_name("ImageDescription"));
        assert!(!filtered.contains_name("Software"));
        assert!(!filtered.keys().any(FieldKey::is_thumbnail_ifd));
        assert!(filtered.contains_name("ColorSpace"));
    }

    #[test]
    fn rounding_keeps_requested_decimals() {
        let key = gps(4);
        let value = FieldValue::Rational(vec![
            Rational::new(3, 1),
            Rational::new(4, 1),
            Rational::new(4650, 100),
        ]);
        assert_eq!(
            round_coordinate(&key, &value, 0),
            Ok(FieldValue::Rational(vec![
                Rational::new(3, 1),
                Rational::new(4, 1),
                Rational::new(47, 1),
            ]))
        );
        assert_eq!(
            round_coordinate(&key, &FieldValue::Float(vec![40.43718]), 2),
            Ok(FieldValue::Float(vec![40.44]))
        );
    }

    #[test]
    fn zero_denominator_leaves_gps_untouched() {
        let mut map = MetadataMap::new();
        let broken = FieldValue::Rational(vec![Rational::new(40, 0)]);
        map.insert(gps(2), broken.clone());
        map.insert(gps(6), FieldValue::Rational(vec![Rational::new(10, 1)]));
        map.insert(
            FieldKey::name("ExifIFD:DateTimeOriginal"),
            FieldValue::text("2025:02:23 10:00:00"),
        );

        let filtered = apply(&map, &RuleSet::default());
        assert_eq!(filtered.get(&gps(2)), Some(&broken));
        assert!(filtered.get(&gps(6)).is_some());
        assert_eq!(
            filtered.find_by_name("DateTimeOriginal").map(|(_, v)| v),
            Some(&FieldValue::text("2025:02:23"))
        );
    }

    #[test]
    fn remove_modes_delete_whole_categories() {
        let rules = rules_from_str(r#"{"GPS": "remove", "Timestamp": "remove", "CameraSettings": "remove", "Orientation": false}"#);
        let filtered = apply(&sample_exif(), &rules);
        assert!(!filtered.keys().any(FieldKey::is_gps));
        assert!(!filtered.contains_name("DateTimeOriginal"));
        assert!(!filtered.contains_name("Make"));
        assert!(!filtered.contains_name("Orientation"));
        assert!(filtered.contains_name("ColorSpace"));
    }

    #[test]
    fn altitude_flag_is_independent_of_mode() {
        let rules = rules_from_str(r#"{"GPS": {"mode": "exact", "remove_altitude": true}}"#);
        let filtered = apply(&sample_exif(), &rules);
        assert!(filtered.get(&gps(6)).is_none());

        let rules = rules_from_str(r#"{"GPS": {"mode": "whole_degrees", "remove_altitude": false}}"#);
        let filtered = apply(&sample_exif(), &rules);
        assert!(filtered.get(&gps(6)).is_some());
    }

    #[test]
    fn date_part_handles_both_separators() {
        assert_eq!(date_part("2025:02:23 10:00:00"), "2025:02:23");
        assert_eq!(date_part("2025-02-23T10:00:00Z"), "2025-02-23");
        assert_eq!(date_part("2025:02:23\0"), "2025:02:23");
    }

    #[test]
    fn exiftool_style_names_are_filtered_too() {
        let mut map = MetadataMap::new();
        map.insert(FieldKey::name("GPS:GPSLatitude"), FieldValue::Float(vec![40.4372]));
        map.insert(FieldKey::name("GPS:GPSAltitude"), FieldValue::Float(vec![12.5]));
        map.insert(FieldKey::name("ExifIFD:ISO"), FieldValue::Long(vec![100]));
        map.insert(FieldKey::name("IFD0:Make"), FieldValue::text("Apple"));
        map.insert(FieldKey::name("IFD1:ThumbnailImage"), FieldValue::Undefined(vec![1, 2]));

        let filtered = apply(&map, &RuleSet::default());
        assert_eq!(
            filtered.get(&FieldKey::name("GPS:GPSLatitude")),
            Some(&FieldValue::Float(vec![40.0]))
        );
        assert!(!filtered.contains_name("GPSAltitude"));
        assert!(!filtered.contains_name("ISO"));
        assert!(filtered.contains_name("Make"));
        assert!(!filtered.contains_name("ThumbnailImage"));
    }

    #[test]
    fn xmp_and_iptc_fields_follow_their_categories() {
        let mut map = MetadataMap::new();
        map.insert(FieldKey::name("IPTC:Caption-Abstract"), FieldValue::text("leyenda privada"));
        map.insert(FieldKey::name("XMP-dc:Description"), FieldValue::text("descripción"));
        map.insert(FieldKey::name("XMP-dc:Creator"), FieldValue::text("Ana Pérez"));
        map.insert(FieldKey::name("IPTC:By-line"), FieldValue::text("Ana Pérez"));
        map.insert(FieldKey::name("IPTC:Keywords"), FieldValue::text("familia, playa"));
        map.insert(FieldKey::name("XMP-photoshop:City"), FieldValue::text("Valencia"));
        map.insert(FieldKey::name("XMP-xmp:CreatorTool"), FieldValue::text("Lightroom"));
        map.insert(FieldKey::name("IPTC:TimeCreated"), FieldValue::text("10:00:00+02:00"));
        map.insert(FieldKey::name("IPTC:DateCreated"), FieldValue::text("2025:02:23"));
        map.insert(
            FieldKey::name("XMP-photoshop:DateCreated"),
            FieldValue::text("2025:02:23 10:00:00+02:00"),
        );
        map.insert(FieldKey::name("IFD0:Orientation"), FieldValue::Long(vec![1]));

        let filtered = apply(&map, &RuleSet::default());
        for stripped in [
            "Caption-Abstract",
            "Description",
            "Creator",
            "By-line",
            "Keywords",
            "City",
            "CreatorTool",
            "TimeCreated",
        ] {
            assert!(!filtered.contains_name(stripped), "{stripped} debería eliminarse");
        }
        assert_eq!(
            filtered.get(&FieldKey::name("XMP-photoshop:DateCreated")),
            Some(&FieldValue::text("2025:02:23"))
        );
        assert_eq!(
            filtered.get(&FieldKey::name("IPTC:DateCreated")),
            Some(&FieldValue::text("2025:02:23"))
        );
        assert!(filtered.contains_name("Orientation"));

        let keep_descriptions = rules_from_str(r#"{"Descriptions": true}"#);
        let filtered = apply(&map, &keep_descriptions);
        assert!(filtered.contains_name("Caption-Abstract"));
        assert!(filtered.contains_name("Creator"));
    }

    #[test]
    fn custom_preserve_list_replaces_make_and_model() {
        let mut map = MetadataMap::new();
        map.insert(FieldKey::name("IFD0:Make"), FieldValue::text("Canon"));
        map.insert(FieldKey::name("IFD0:Model"), FieldValue::text("EOS R5"));
        map.insert(FieldKey::name("ExifIFD:LensModel"), FieldValue::text("RF 24-70mm"));
        map.insert(FieldKey::name("ExifIFD:FNumber"), FieldValue::Float(vec![2.8]));
        map.insert(FieldKey::name("ExifIFD:ColorSpace"), FieldValue::Long(vec![1]));

        let rules = rules_from_str(
            r#"{"CameraSettings": {"mode": "all_except_make_model", "preserve": ["Make", "LensModel"]}}"#,
        );
        assert_eq!(rules.camera.preserve, vec!["Make".to_string(), "LensModel".to_string()]);

        let filtered = apply(&map, &rules);
        assert!(filtered.contains_name("Make"));
        assert!(filtered.contains_name("LensModel"));
        assert!(!filtered.contains_name("Model"));
        assert!(!filtered.contains_name("FNumber"));
        assert!(filtered.contains_name("ColorSpace"));
    }
}
