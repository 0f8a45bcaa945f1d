//! Recorrido y reescritura de bloques PNG.

use flate2::Crc;
use flate2::read::ZlibDecoder;
use std::io::Read;

use crate::error::AdapterError;
use crate::metadata::{FieldKey, FieldValue, MetadataMap};

pub(crate) const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const METADATA_CHUNKS: [&[u8; 4]; 5] = [b"tEXt", b"zTXt", b"iTXt", b"eXIf", b"tIME"];

struct Chunk<'a> {
    kind: &'a [u8],
    data: &'a [u8],
    raw: &'a [u8],
}

fn chunks(data: &[u8]) -> Result<Vec<Chunk<'_>>, AdapterError> {
    if data.len() < PNG_SIGNATURE.len() || data[..8] != PNG_SIGNATURE {
        return Err(AdapterError::parse("no es un PNG válido"));
    }

    let mut found = Vec::new();
    let mut pos = PNG_SIGNATURE.len();
    while pos + 12 <= data.len() {
        let length = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let end = pos
            .checked_add(12)
            .and_then(|v| v.checked_add(length))
            .filter(|end| *end <= data.len())
            .ok_or_else(|| AdapterError::parse("bloque PNG truncado"))?;
        let kind = &data[pos + 4..pos + 8];
        found.push(Chunk {
            kind,
            data: &data[pos + 8..pos + 8 + length],
            raw: &data[pos..end],
        });
        pos = end;
        if kind == b"IEND" {
            break;
        }
    }
    Ok(found)
}

/// Copia el PNG sin bloques de texto, fecha ni EXIF. Con `exif_tiff` se
/// añade un `eXIf` nuevo justo después de `IHDR`.
pub(crate) fn rewrite_png(data: &[u8], exif_tiff: Option<&[u8]>) -> Result<Vec<u8>, AdapterError> {
    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&PNG_SIGNATURE);

    for chunk in chunks(data)? {
        if METADATA_CHUNKS.iter().any(|kind| chunk.kind == kind.as_slice()) {
            continue;
        }
        out.extend_from_slice(chunk.raw);
        if chunk.kind == b"IHDR"
            && let Some(tiff) = exif_tiff
        {
            push_chunk(&mut out, b"eXIf", tiff);
        }
    }
    Ok(out)
}

pub(crate) fn push_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
}

/// Palabras clave de los bloques textuales (`tEXt`, `zTXt`, `iTXt`).
pub(crate) fn text_fields(data: &[u8]) -> Result<MetadataMap, AdapterError> {
    let mut map = MetadataMap::new();
    for chunk in chunks(data)? {
        let entry = match chunk.kind {
            b"tEXt" => parse_text(chunk.data),
            b"zTXt" => parse_compressed_text(chunk.data),
            b"iTXt" => parse_international_text(chunk.data),
            b"tIME" => Some(("ModifyDate".to_string(), format_time(chunk.data))),
            _ => None,
        };
        if let Some((keyword, value)) = entry {
            map.insert(FieldKey::name(format!("PNG:{keyword}")), FieldValue::Text(value));
        }
    }
    Ok(map)
}

fn split_keyword(data: &[u8]) -> Option<(String, &[u8])> {
    let nul = data.iter().position(|b| *b == 0)?;
    Some((String::from_utf8_lossy(&data[..nul]).into_owned(), &data[nul + 1..]))
}

fn parse_text(data: &[u8]) -> Option<(String, String)> {
    let (keyword, rest) = split_keyword(data)?;
    Some((keyword, String::from_utf8_lossy(rest).into_owned()))
}

fn parse_compressed_text(data: &[u8]) -> Option<(String, String)> {
    let (keyword, rest) = split_keyword(data)?;
    let compressed = rest.get(1..)?;
    Some((keyword, inflate(compressed)?))
}

fn parse_international_text(data: &[u8]) -> Option<(String, String)> {
    let (keyword, rest) = split_keyword(data)?;
    let compressed = *rest.first()? == 1;
    let rest = rest.get(2..)?;
    let (_, rest) = split_keyword(rest)?;
    let (_, text) = split_keyword(rest)?;
    let value = if compressed {
        inflate(text)?
    } else {
        String::from_utf8_lossy(text).into_owned()
    };
    Some((keyword, value))
}

fn inflate(data: &[u8]) -> Option<String> {
    let mut text = String::new();
    ZlibDecoder::new(data).read_to_string(&mut text).ok()?;
    Some(text)
}

fn format_time(data: &[u8]) -> String {
    if data.len() < 7 {
        return String::new();
    }
    let year = u16::from_be_bytes([data[0], data[1]]);
    format!(
        "{year:04}:{:02}:{:02} {:02}:{:02}:{:02}",
        data[2], data[3], data[4], data[5], data[6]
    )
}
