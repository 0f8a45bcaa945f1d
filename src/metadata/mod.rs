//! Modelo común de metadata que producen y consumen los adaptadores.

mod tags;
mod value;

pub use tags::{TagContext, is_structural_tag, tag_by_name, tag_name};
pub use value::{FieldValue, Rational, SignedRational};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identificador de un campo.
///
/// Las herramientas externas reportan nombres con prefijo de grupo opcional
/// (`GPS:GPSLatitude`); las bibliotecas EXIF reportan etiquetas numéricas.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    Name(String),
    Tag {
        ifd: u16,
        context: TagContext,
        number: u16,
    },
}

impl FieldKey {
    pub fn name(value: impl Into<String>) -> Self {
        FieldKey::Name(value.into())
    }

    pub fn tag(ifd: u16, context: TagContext, number: u16) -> Self {
        FieldKey::Tag {
            ifd,
            context,
            number,
        }
    }

    /// Nombre sin grupo, usado por las reglas de filtrado.
    pub fn canonical_name(&self) -> String {
        match self {
            FieldKey::Name(name) => match name.rsplit_once(':') {
                Some((_, bare)) => bare.to_string(),
                None => name.clone(),
            },
            FieldKey::Tag {
                context, number, ..
            } => tag_name(*context, *number)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Tag0x{number:04X}")),
        }
    }

    pub fn group(&self) -> Option<&str> {
        match self {
            FieldKey::Name(name) => name.rsplit_once(':').map(|(group, _)| group),
            FieldKey::Tag { ifd, context, .. } => Some(context.group_name(*ifd)),
        }
    }

    pub fn is_gps(&self) -> bool {
        match self {
            FieldKey::Tag { context, .. } => *context == TagContext::Gps,
            FieldKey::Name(_) => {
                self.group().is_some_and(|g| g.eq_ignore_ascii_case("GPS"))
                    || self.canonical_name().starts_with("GPS")
            }
        }
    }

    /// Campo del directorio de miniatura (IFD1).
    pub fn is_thumbnail_ifd(&self) -> bool {
        match self {
            FieldKey::Tag { ifd, .. } => *ifd == 1,
            FieldKey::Name(_) => self.group() == Some("IFD1"),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Name(name) => f.write_str(name),
            FieldKey::Tag { ifd, context, .. } => {
                write!(f, "{}:{}", context.group_name(*ifd), self.canonical_name())
            }
        }
    }
}

/// Forma serializada de un campo dentro del respaldo JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: FieldKey,
    pub value: FieldValue,
}

/// Mapa ordenado de campos producido por un único adaptador.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<MetadataEntry>", from = "Vec<MetadataEntry>")]
pub struct MetadataMap {
    fields: BTreeMap<FieldKey, FieldValue>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: FieldKey, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(key, value)
    }

    pub fn get(&self, key: &FieldKey) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &FieldKey) -> Option<&mut FieldValue> {
        self.fields.get_mut(key)
    }

    pub fn remove(&mut self, key: &FieldKey) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    /// Primer campo cuyo nombre canónico coincide, sin distinguir mayúsculas.
    pub fn find_by_name(&self, name: &str) -> Option<(&FieldKey, &FieldValue)> {
        self.fields
            .iter()
            .find(|(key, _)| key.canonical_name().eq_ignore_ascii_case(name))
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&FieldKey, &FieldValue) -> bool,
    {
        self.fields.retain(|key, value| keep(key, value));
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(FieldKey, FieldValue)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (FieldKey, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl From<MetadataMap> for Vec<MetadataEntry> {
    fn from(map: MetadataMap) -> Self {
        map.fields
            .into_iter()
            .map(|(key, value)| MetadataEntry { key, value })
            .collect()
    }
}

impl From<Vec<MetadataEntry>> for MetadataMap {
    fn from(entries: Vec<MetadataEntry>) -> Self {
        entries
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect()
    }
}
