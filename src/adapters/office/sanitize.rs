//! Normalización y verificación de las partes `docProps`.

use std::io::Cursor;
use std::path::Path;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::AdapterError;

use super::archive::{open_package, read_part};
use super::props::{
    APP_FIELDS, APP_PART, CORE_FIELDS, CORE_PART, CUSTOM_PART, CUSTOM_PROPERTIES_EMPTY,
    PropertyField, find_child, set_field, text_of,
};

pub(crate) fn parse_xml(contents: &[u8], part: &str) -> Result<Element, AdapterError> {
    Element::parse(Cursor::new(contents))
        .map_err(|e| AdapterError::parse(format!("{part}: XML inválido: {e}")))
}

/// Deja cada campo de `fields` en su valor limpio.
pub(crate) fn sanitize_part(
    contents: Vec<u8>,
    part: &str,
    fields: &[PropertyField],
) -> Result<(Vec<u8>, bool), AdapterError> {
    let mut root = parse_xml(&contents, part)?;

    let mut modified = false;
    for field in fields {
        modified |= set_field(&mut root, field, field.cleared);
    }
    if !modified {
        return Ok((contents, false));
    }

    let mut output = Vec::new();
    let mut config = EmitterConfig::new();
    config.perform_indent = false;
    config.write_document_declaration = true;
    root.write_with_config(&mut output, config)
        .map_err(|e| AdapterError::parse(format!("{part}: no se pudo escribir el XML: {e}")))?;
    Ok((output, true))
}

pub(crate) fn empty_custom_part(contents: Vec<u8>) -> (Vec<u8>, bool) {
    let sanitized = CUSTOM_PROPERTIES_EMPTY.as_bytes().to_vec();
    let modified = contents != sanitized;
    (sanitized, modified)
}

/// Transformación aplicada a cada entrada del paquete.
pub(crate) fn sanitize_entry(name: &str, contents: Vec<u8>) -> Result<(Vec<u8>, bool), AdapterError> {
    match name {
        CORE_PART => sanitize_part(contents, CORE_PART, CORE_FIELDS),
        APP_PART => sanitize_part(contents, APP_PART, APP_FIELDS),
        CUSTOM_PART => Ok(empty_custom_part(contents)),
        _ => Ok((contents, false)),
    }
}

fn part_is_clean(contents: &[u8], part: &str, fields: &[PropertyField]) -> Result<bool, AdapterError> {
    let root = parse_xml(contents, part)?;
    Ok(fields.iter().all(|field| match find_child(&root, field) {
        Some(child) => text_of(child) == field.cleared,
        None => field.cleared.is_empty(),
    }))
}

fn custom_is_clean(contents: &[u8]) -> Result<bool, AdapterError> {
    if contents == CUSTOM_PROPERTIES_EMPTY.as_bytes() {
        return Ok(true);
    }
    let root = parse_xml(contents, CUSTOM_PART)?;
    let has_properties = root
        .children
        .iter()
        .any(|node| matches!(node, XMLNode::Element(_)));
    Ok(!has_properties && text_of(&root).is_empty())
}

/// Comprueba que un paquete ya limpio no conserva propiedades sensibles.
pub fn verify_package_clean(path: &Path) -> Result<bool, AdapterError> {
    let mut archive = open_package(path)?;

    let core_clean = match read_part(&mut archive, CORE_PART)? {
        Some(contents) => part_is_clean(&contents, CORE_PART, CORE_FIELDS)?,
        None => true,
    };
    let app_clean = match read_part(&mut archive, APP_PART)? {
        Some(contents) => part_is_clean(&contents, APP_PART, APP_FIELDS)?,
        None => true,
    };
    let custom_clean = match read_part(&mut archive, CUSTOM_PART)? {
        Some(contents) => custom_is_clean(&contents)?,
        None => true,
    };

    Ok(core_clean && app_clean && custom_clean)
}
