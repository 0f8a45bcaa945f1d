//! Valores tipados de un campo de metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fracción sin signo tal como la almacena EXIF.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub num: u32,
    pub denom: u32,
}

impl Rational {
    pub const fn new(num: u32, denom: u32) -> Self {
        Self { num, denom }
    }

    /// Valor decimal, o `None` si el denominador es cero.
    pub fn to_f64(self) -> Option<f64> {
        if self.denom == 0 {
            None
        } else {
            Some(f64::from(self.num) / f64::from(self.denom))
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRational {
    pub num: i32,
    pub denom: i32,
}

impl SignedRational {
    pub fn to_f64(self) -> Option<f64> {
        if self.denom == 0 {
            None
        } else {
            Some(f64::from(self.num) / f64::from(self.denom))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Byte(Vec<u8>),
    Undefined(Vec<u8>),
    Short(Vec<u16>),
    Long(Vec<u32>),
    SignedLong(Vec<i32>),
    Rational(Vec<Rational>),
    SignedRational(Vec<SignedRational>),
    Float(Vec<f64>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "texto",
            FieldValue::Byte(_) => "byte",
            FieldValue::Undefined(_) => "indefinido",
            FieldValue::Short(_) => "short",
            FieldValue::Long(_) => "long",
            FieldValue::SignedLong(_) => "slong",
            FieldValue::Rational(_) => "racional",
            FieldValue::SignedRational(_) => "racional con signo",
            FieldValue::Float(_) => "decimal",
        }
    }

    /// Representación numérica plana, usada al reescribir con herramientas externas.
    pub fn numbers(&self) -> Option<Vec<f64>> {
        match self {
            FieldValue::Text(_) | FieldValue::Undefined(_) => None,
            FieldValue::Byte(values) => Some(values.iter().map(|v| f64::from(*v)).collect()),
            FieldValue::Short(values) => Some(values.iter().map(|v| f64::from(*v)).collect()),
            FieldValue::Long(values) => Some(values.iter().map(|v| f64::from(*v)).collect()),
            FieldValue::SignedLong(values) => Some(values.iter().map(|v| f64::from(*v)).collect()),
            FieldValue::Rational(values) => values.iter().map(|r| r.to_f64()).collect(),
            FieldValue::SignedRational(values) => values.iter().map(|r| r.to_f64()).collect(),
            FieldValue::Float(values) => Some(values.clone()),
        }
    }
}

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.denom)
    }
}

impl fmt::Display for SignedRational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.denom)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Byte(bytes) | FieldValue::Undefined(bytes) => {
                write!(f, "({} bytes)", bytes.len())
            }
            FieldValue::Short(values) => join(f, values),
            FieldValue::Long(values) => join(f, values),
            FieldValue::SignedLong(values) => join(f, values),
            FieldValue::Rational(values) => join(f, values),
            FieldValue::SignedRational(values) => join(f, values),
            FieldValue::Float(values) => join(f, values),
        }
    }
}
