//! Reescritura de PDFs con `lopdf`: diccionario `Info`, XMP del catálogo e `ID`.

use lopdf::{Dictionary, Document, Object};
use std::path::{Path, PathBuf};

use crate::error::AdapterError;
use crate::metadata::{FieldKey, FieldValue, MetadataMap};

use super::{BackendAdapter, Capability};

pub struct PdfRewriteAdapter;

fn load(path: &Path) -> Result<Document, AdapterError> {
    Document::load(path).map_err(|e| AdapterError::parse(format!("PDF ilegible: {e}")))
}

fn deref_dictionary<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(reference) => doc.get_dictionary(*reference).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn object_to_string(doc: &Document, obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).trim().to_string()),
        Object::Integer(value) => Some(value.to_string()),
        Object::Real(value) => Some(value.to_string()),
        Object::Boolean(value) => Some(value.to_string()),
        Object::Reference(reference) => doc
            .get_object(*reference)
            .ok()
            .and_then(|inner| object_to_string(doc, inner)),
        _ => None,
    }
}

/// Cadenas de texto PDF: UTF-16BE con BOM o bytes tal cual.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units).trim().to_string();
    }
    String::from_utf8_lossy(bytes).trim().to_string()
}

fn catalog_dictionary(doc: &Document) -> Option<&Dictionary> {
    let root = doc.trailer.get(b"Root").ok()?;
    deref_dictionary(doc, root)
}

fn strip_document(doc: &mut Document) -> Result<(), AdapterError> {
    if let Some(Object::Reference(info_id)) = doc.trailer.remove(b"Info") {
        doc.objects.remove(&info_id);
    }
    doc.trailer.remove(b"ID");

    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| AdapterError::parse(format!("PDF sin catálogo: {e}")))?;
    let catalog = doc
        .get_object_mut(root_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| AdapterError::parse(format!("Catálogo PDF inválido: {e}")))?;
    catalog.remove(b"Metadata");

    let pruned = doc.prune_objects();
    tracing::debug!(objetos = pruned.len(), "objetos PDF sin referencias eliminados");
    Ok(())
}

impl BackendAdapter for PdfRewriteAdapter {
    fn name(&self) -> &'static str {
        "pdf-rewrite"
    }

    fn capability(&self, extension: &str) -> Capability {
        match extension {
            "pdf" => Capability::ExtractAndRemove,
            _ => Capability::ExtractOnly,
        }
    }

    fn extract(&self, path: &Path) -> Result<MetadataMap, AdapterError> {
        let doc = load(path)?;
        let mut map = MetadataMap::new();

        if let Some(info) = doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| deref_dictionary(&doc, info))
        {
            for (key, value) in info.iter() {
                let Some(text) = object_to_string(&doc, value) else {
                    continue;
                };
                let key = String::from_utf8_lossy(key);
                map.insert(FieldKey::name(format!("PDF:{key}")), FieldValue::Text(text));
            }
        }

        if catalog_dictionary(&doc).is_some_and(|catalog| catalog.has(b"Metadata")) {
            map.insert(FieldKey::name("XMP:XMPMetadata"), FieldValue::text("present"));
        }
        Ok(map)
    }

    fn remove(
        &self,
        input: &Path,
        output: &Path,
        _retained: &MetadataMap,
    ) -> Result<PathBuf, AdapterError> {
        let mut doc = load(input)?;
        strip_document(&mut doc)?;
        doc.save(output)
            .map_err(|e| AdapterError::parse(format!("No se pudo guardar el PDF: {e}")))?;
        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};
    use tempfile::tempdir;

    /// PDF de una página con `Info`, XMP e `ID`.
    pub(crate) fn write_sample_pdf(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0i64.into(), 0i64.into(), 200i64.into(), 200i64.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1i64,
            }),
        );
        let info_id = doc.add_object(dictionary! {
            "Author" => Object::string_literal("Ana Pérez"),
            "Producer" => Object::string_literal("Writer 7.1"),
            "Title" => Object::string_literal("Contrato"),
        });
        let xmp_id = doc.add_object(Stream::new(
            dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
            b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"/>".to_vec(),
        ));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "Metadata" => xmp_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.trailer.set(
            "ID",
            vec![Object::string_literal("a1b2"), Object::string_literal("a1b2")],
        );
        doc.save(path)?;
        Ok(())
    }

    #[test]
    fn extract_reads_info_and_flags_xmp() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("contrato.pdf");
        write_sample_pdf(&source)?;

        let map = PdfRewriteAdapter.extract(&source)?;
        assert_eq!(
            map.get(&FieldKey::name("PDF:Author")),
            Some(&FieldValue::text("Ana Pérez"))
        );
        assert!(map.contains_name("XMPMetadata"));
        assert_eq!(map.len(), 4);
        Ok(())
    }

    #[test]
    fn remove_drops_info_xmp_and_id() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("contrato.pdf");
        let output = dir.path().join("contrato_cleaned.pdf");
        write_sample_pdf(&source)?;

        PdfRewriteAdapter.remove(&source, &output, &MetadataMap::new())?;

        let cleaned = Document::load(&output)?;
        assert!(cleaned.trailer.get(b"Info").is_err());
        assert!(cleaned.trailer.get(b"ID").is_err());
        assert_eq!(cleaned.get_pages().len(), 1);
        assert!(PdfRewriteAdapter.extract(&output)?.is_empty());
        Ok(())
    }

    #[test]
    fn utf16_strings_are_decoded() {
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0xF1];
        assert_eq!(decode_pdf_string(&bytes), "Añ");
    }

    #[test]
    fn garbage_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("roto.pdf");
        std::fs::write(&source, b"%PDF-1.4\nbasura")?;
        assert!(matches!(
            PdfRewriteAdapter.extract(&source),
            Err(AdapterError::Parse(_))
        ));
        Ok(())
    }
}
