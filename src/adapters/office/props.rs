//! Tablas de propiedades OOXML y utilidades sobre `xmltree`.

use xmltree::{Element, XMLNode};

pub(crate) const CORE_PART: &str = "docProps/core.xml";
pub(crate) const APP_PART: &str = "docProps/app.xml";
pub(crate) const CUSTOM_PART: &str = "docProps/custom.xml";

const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const CP_NS: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const DCTERMS_NS: &str = "http://purl.org/dc/terms/";
const APP_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";

pub(crate) const CUSTOM_PROPERTIES_EMPTY: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/custom-properties\" xmlns:vt=\"http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes\"/>\n";

/// Un nodo de propiedades y el valor que debe tener tras la limpieza.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PropertyField {
    pub(crate) prefix: Option<&'static str>,
    pub(crate) local_name: &'static str,
    pub(crate) namespace: &'static str,
    pub(crate) cleared: &'static str,
}

const fn core(prefix: &'static str, local_name: &'static str, namespace: &'static str, cleared: &'static str) -> PropertyField {
    PropertyField {
        prefix: Some(prefix),
        local_name,
        namespace,
        cleared,
    }
}

const fn app(local_name: &'static str, cleared: &'static str) -> PropertyField {
    PropertyField {
        prefix: None,
        local_name,
        namespace: APP_NS,
        cleared,
    }
}

pub(crate) const CORE_FIELDS: &[PropertyField] = &[
    core("dc", "creator", DC_NS, ""),
    core("cp", "lastModifiedBy", CP_NS, ""),
    core("dcterms", "created", DCTERMS_NS, ""),
    core("dcterms", "modified", DCTERMS_NS, ""),
    core("dc", "title", DC_NS, ""),
    core("dc", "subject", DC_NS, ""),
    core("dc", "description", DC_NS, ""),
    core("cp", "keywords", CP_NS, ""),
    core("cp", "category", CP_NS, ""),
    core("cp", "contentStatus", CP_NS, ""),
    core("cp", "lastPrinted", CP_NS, ""),
    core("cp", "revision", CP_NS, "1"),
];

pub(crate) const APP_FIELDS: &[PropertyField] = &[
    app("Application", ""),
    app("AppVersion", ""),
    app("Company", ""),
    app("Manager", ""),
    app("Template", ""),
    app("HyperlinkBase", ""),
    app("TotalTime", "0"),
    app("Pages", "0"),
    app("Words", "0"),
    app("Lines", "0"),
    app("Characters", "0"),
];

fn matches(element: &Element, field: &PropertyField) -> bool {
    element.name == field.local_name
        && element.namespace.as_deref().is_none_or(|ns| ns == field.namespace)
}

pub(crate) fn find_child<'a>(root: &'a Element, field: &PropertyField) -> Option<&'a Element> {
    root.children.iter().find_map(|node| match node {
        XMLNode::Element(child) if matches(child, field) => Some(child),
        _ => None,
    })
}

pub(crate) fn text_of(element: &Element) -> String {
    element
        .children
        .iter()
        .filter_map(|node| match node {
            XMLNode::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Fija el texto del campo, creando el nodo si falta. Devuelve si hubo cambio.
pub(crate) fn set_field(root: &mut Element, field: &PropertyField, value: &str) -> bool {
    let existing = root.children.iter_mut().find_map(|node| match node {
        XMLNode::Element(child) if matches(child, field) => Some(child),
        _ => None,
    });

    match existing {
        Some(child) => {
            if text_of(child) == value {
                return false;
            }
            child.children.retain(|node| !matches!(node, XMLNode::Text(_)));
            if !value.is_empty() {
                child.children.push(XMLNode::Text(value.to_string()));
            }
            true
        }
        None if value.is_empty() => false,
        None => {
            let mut child = Element::new(field.local_name);
            child.prefix = field.prefix.map(str::to_string);
            child.namespace = Some(field.namespace.to_string());
            child.children.push(XMLNode::Text(value.to_string()));
            root.children.push(XMLNode::Element(child));
            true
        }
    }
}

/// Nombre con prefijo tal como aparece en el XML (`dc:creator`).
pub(crate) fn qualified_name(element: &Element) -> String {
    match &element.prefix {
        Some(prefix) => format!("{prefix}:{}", element.name),
        None => element.name.clone(),
    }
}
