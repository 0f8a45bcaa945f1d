//! Propiedades de documentos OOXML (`docx`, `xlsx`, `pptx`).
//!
//! La extracción lee las tres partes `docProps`. La eliminación reescribe el
//! paquete dejando esas partes en su forma vacía y verifica el resultado
//! antes de darlo por bueno.

mod archive;
mod props;
mod sanitize;

use std::path::{Path, PathBuf};
use xmltree::XMLNode;

use crate::error::AdapterError;
use crate::metadata::{FieldKey, FieldValue, MetadataMap};

use super::{BackendAdapter, Capability};
use archive::{open_package, read_part, rewrite_package};
use props::{APP_PART, CORE_PART, CUSTOM_PART, qualified_name, text_of};
use sanitize::{parse_xml, sanitize_entry};

pub use sanitize::verify_package_clean;

pub struct OfficePropsAdapter;

impl BackendAdapter for OfficePropsAdapter {
    fn name(&self) -> &'static str {
        "office-props"
    }

    fn capability(&self, extension: &str) -> Capability {
        match extension {
            "docx" | "xlsx" | "pptx" => Capability::ExtractAndRemove,
            _ => Capability::ExtractOnly,
        }
    }

    fn extract(&self, path: &Path) -> Result<MetadataMap, AdapterError> {
        let mut archive = open_package(path)?;
        let mut map = MetadataMap::new();

        for (part, group) in [(CORE_PART, "Core"), (APP_PART, "App")] {
            let Some(contents) = read_part(&mut archive, part)? else {
                continue;
            };
            let root = parse_xml(&contents, part)?;
            for node in &root.children {
                let XMLNode::Element(child) = node else { continue };
                let value = text_of(child);
                if value.is_empty() {
                    continue;
                }
                tracing::trace!(campo = %qualified_name(child), "propiedad office");
                map.insert(
                    FieldKey::name(format!("{group}:{}", child.name)),
                    FieldValue::Text(value),
                );
            }
        }

        if let Some(contents) = read_part(&mut archive, CUSTOM_PART)? {
            let root = parse_xml(&contents, CUSTOM_PART)?;
            for node in &root.children {
                let XMLNode::Element(property) = node else { continue };
                let Some(name) = property.attributes.get("name") else {
                    continue;
                };
                let value = property
                    .children
                    .iter()
                    .find_map(|node| match node {
                        XMLNode::Element(inner) => Some(text_of(inner)),
                        _ => None,
                    })
                    .unwrap_or_default();
                map.insert(FieldKey::name(format!("Custom:{name}")), FieldValue::Text(value));
            }
        }

        Ok(map)
    }

    fn remove(
        &self,
        input: &Path,
        output: &Path,
        _retained: &MetadataMap,
    ) -> Result<PathBuf, AdapterError> {
        let modified = rewrite_package(input, output, sanitize_entry)?;
        tracing::debug!(modificado = modified, "paquete office reescrito");

        if !verify_package_clean(output)? {
            return Err(AdapterError::Verification);
        }
        Ok(output.to_path_buf())
    }
}
