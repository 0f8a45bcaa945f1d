//! Adaptador nativo basado en `kamadak-exif`.
//!
//! Lee EXIF de cualquier contenedor que la biblioteca reconoce y reescribe
//! JPEG y PNG directamente, reinsertando los campos conservados.

mod jpeg;
mod png;

use std::fs::{self, File};
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::classifier::normalized_extension;
use crate::error::AdapterError;
use crate::metadata::{
    FieldKey, FieldValue, MetadataMap, Rational, SignedRational, TagContext, is_structural_tag,
    tag_by_name,
};

use super::{BackendAdapter, Capability};

pub(crate) use jpeg::rewrite_jpeg;
pub(crate) use png::rewrite_png;

/// Solo reconstruye el IFD primario y sus sub-IFD: la miniatura (IFD1)
/// nunca se vuelve a escribir, aunque las reglas la conserven.
pub struct ExifTagsAdapter;

impl BackendAdapter for ExifTagsAdapter {
    fn name(&self) -> &'static str {
        "exif-tags"
    }

    fn capability(&self, extension: &str) -> Capability {
        match extension {
            "jpg" | "jpeg" | "png" => Capability::ExtractAndRemove,
            _ => Capability::ExtractOnly,
        }
    }

    fn preserves_fields(&self) -> bool {
        true
    }

    fn extract(&self, path: &Path) -> Result<MetadataMap, AdapterError> {
        let mut map = read_exif(path)?;
        if normalized_extension(path) == "png" {
            let data = fs::read(path)?;
            for (key, value) in png::text_fields(&data)?.iter() {
                map.insert(key.clone(), value.clone());
            }
        }
        Ok(map)
    }

    fn remove(
        &self,
        input: &Path,
        output: &Path,
        retained: &MetadataMap,
    ) -> Result<PathBuf, AdapterError> {
        let extension = normalized_extension(input);
        let data = fs::read(input)?;

        let fields = exif_fields(retained);
        let thumbnail = retained.keys().filter(|key| key.is_thumbnail_ifd()).count();
        if thumbnail > 0 {
            debug!(descartados = thumbnail, "Se omite la miniatura IFD1 al reconstruir EXIF");
        }
        let tiff = if fields.is_empty() {
            None
        } else {
            Some(encode_tiff(&fields)?)
        };
        debug!(
            conservados = fields.len(),
            "Reescribiendo contenedor con EXIF reconstruido"
        );

        let cleaned = match extension.as_str() {
            "jpg" | "jpeg" => rewrite_jpeg(&data, tiff.as_deref())?,
            "png" => rewrite_png(&data, tiff.as_deref())?,
            other => return Err(AdapterError::UnsupportedContainer(other.to_string())),
        };

        fs::write(output, cleaned)?;
        Ok(output.to_path_buf())
    }
}

/// Lee los campos EXIF. Un archivo sin EXIF produce un mapa vacío.
pub fn read_exif(path: &Path) -> Result<MetadataMap, AdapterError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(exif
            .fields()
            .map(|field| (key_for(field), from_exif_value(&field.value)))
            .collect()),
        Err(exif::Error::NotFound(_)) | Err(exif::Error::BlankValue(_)) => Ok(MetadataMap::new()),
        Err(exif::Error::Io(err)) => Err(AdapterError::Io(err)),
        Err(other) => Err(AdapterError::parse(format!("EXIF ilegible: {other}"))),
    }
}

fn key_for(field: &exif::Field) -> FieldKey {
    let context = match field.tag.context() {
        exif::Context::Tiff => TagContext::Tiff,
        exif::Context::Exif => TagContext::Exif,
        exif::Context::Gps => TagContext::Gps,
        exif::Context::Interop => TagContext::Interop,
        // `exif::Context` es #[non_exhaustive]; kamadak-exif 0.5 solo define las cuatro variantes anteriores.
        other => unreachable!("contexto EXIF desconocido: {other:?}"),
    };
    FieldKey::tag(field.ifd_num.index(), context, field.tag.number())
}

fn exif_context(context: TagContext) -> exif::Context {
    match context {
        TagContext::Tiff => exif::Context::Tiff,
        TagContext::Exif => exif::Context::Exif,
        TagContext::Gps => exif::Context::Gps,
        TagContext::Interop => exif::Context::Interop,
    }
}

#[allow(unreachable_patterns)]
fn from_exif_value(value: &exif::Value) -> FieldValue {
    use exif::Value;
    match value {
        Value::Byte(v) => FieldValue::Byte(v.clone()),
        Value::Ascii(parts) => FieldValue::Text(
            parts
                .iter()
                .map(|part| String::from_utf8_lossy(part).into_owned())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Value::Short(v) => FieldValue::Short(v.clone()),
        Value::Long(v) => FieldValue::Long(v.clone()),
        Value::Rational(v) => {
            FieldValue::Rational(v.iter().map(|r| Rational::new(r.num, r.denom)).collect())
        }
        Value::SByte(v) => FieldValue::SignedLong(v.iter().map(|x| i32::from(*x)).collect()),
        Value::Undefined(v, _) => FieldValue::Undefined(v.clone()),
        Value::SShort(v) => FieldValue::SignedLong(v.iter().map(|x| i32::from(*x)).collect()),
        Value::SLong(v) => FieldValue::SignedLong(v.clone()),
        Value::SRational(v) => FieldValue::SignedRational(
            v.iter()
                .map(|r| SignedRational {
                    num: r.num,
                    denom: r.denom,
                })
                .collect(),
        ),
        Value::Float(v) => FieldValue::Float(v.iter().map(|x| f64::from(*x)).collect()),
        Value::Double(v) => FieldValue::Float(v.clone()),
        _ => FieldValue::Undefined(Vec::new()),
    }
}

fn to_exif_value(value: &FieldValue) -> exif::Value {
    use exif::Value;
    match value {
        FieldValue::Text(text) => Value::Ascii(vec![text.as_bytes().to_vec()]),
        FieldValue::Byte(v) => Value::Byte(v.clone()),
        FieldValue::Undefined(v) => Value::Undefined(v.clone(), 0),
        FieldValue::Short(v) => Value::Short(v.clone()),
        FieldValue::Long(v) => Value::Long(v.clone()),
        FieldValue::SignedLong(v) => Value::SLong(v.clone()),
        FieldValue::Rational(v) => Value::Rational(
            v.iter()
                .map(|r| exif::Rational {
                    num: r.num,
                    denom: r.denom,
                })
                .collect(),
        ),
        FieldValue::SignedRational(v) => Value::SRational(
            v.iter()
                .map(|r| exif::SRational {
                    num: r.num,
                    denom: r.denom,
                })
                .collect(),
        ),
        FieldValue::Float(v) => Value::Double(v.clone()),
    }
}

/// Convierte el mapa conservado en campos EXIF del IFD primario.
///
/// Se omiten punteros, la miniatura y los nombres sin etiqueta conocida;
/// los campos con nombre solo se admiten si su valor es texto.
pub(crate) fn exif_fields(retained: &MetadataMap) -> Vec<exif::Field> {
    retained
        .iter()
        .filter_map(|(key, value)| {
            let (ifd, context, number) = match key {
                FieldKey::Tag {
                    ifd,
                    context,
                    number,
                } => (*ifd, *context, *number),
                FieldKey::Name(_) => {
                    if value.as_text().is_none() || key.is_thumbnail_ifd() {
                        return None;
                    }
                    let (context, number) = tag_by_name(&key.canonical_name())?;
                    (0, context, number)
                }
            };
            if ifd != 0 || is_structural_tag(context, number) {
                return None;
            }
            Some(exif::Field {
                tag: exif::Tag(exif_context(context), number),
                ifd_num: exif::In(ifd),
                value: to_exif_value(value),
            })
        })
        .collect()
}

/// Serializa los campos como bloque TIFF big-endian.
pub(crate) fn encode_tiff(fields: &[exif::Field]) -> Result<Vec<u8>, AdapterError> {
    let mut writer = exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut buffer = Cursor::new(Vec::new());
    writer
        .write(&mut buffer, false)
        .map_err(|e| AdapterError::parse(format!("No se pudo escribir EXIF: {e}")))?;
    Ok(buffer.into_inner())
}
