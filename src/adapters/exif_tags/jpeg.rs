//! Reescritura de segmentos JPEG.

use crate::error::AdapterError;

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const APP12: u8 = 0xEC;
const APP13: u8 = 0xED;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;
const COM: u8 = 0xFE;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Segmentos que solo transportan metadata: EXIF/XMP, IPTC, Ducky y comentarios.
fn is_metadata_segment(marker: u8) -> bool {
    matches!(marker, APP1 | APP12 | APP13 | COM)
}

/// Copia el JPEG sin segmentos de metadata. Si `exif_tiff` está presente se
/// inserta un APP1 nuevo tras el APP0 (o tras SOI si no hay APP0).
pub(crate) fn rewrite_jpeg(data: &[u8], exif_tiff: Option<&[u8]>) -> Result<Vec<u8>, AdapterError> {
    if data.len() < 4 || data[..2] != SOI {
        return Err(AdapterError::parse("no es un JPEG válido"));
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&SOI);
    let mut pending_exif = exif_tiff;
    let mut pos = 2;

    loop {
        if pos + 1 >= data.len() || data[pos] != 0xFF {
            return Err(AdapterError::parse("estructura de segmentos JPEG inválida"));
        }

        let mut marker_pos = pos;
        while marker_pos + 1 < data.len() && data[marker_pos + 1] == 0xFF {
            marker_pos += 1;
        }
        if marker_pos + 1 >= data.len() {
            return Err(AdapterError::parse("JPEG truncado"));
        }
        let marker = data[marker_pos + 1];

        match marker {
            0x01 | 0xD0..=0xD7 => {
                out.extend_from_slice(&[0xFF, marker]);
                pos = marker_pos + 2;
                continue;
            }
            EOI => {
                if let Some(tiff) = pending_exif.take() {
                    push_exif_segment(&mut out, tiff)?;
                }
                out.extend_from_slice(&[0xFF, EOI]);
                break;
            }
            _ => {}
        }

        if marker_pos + 4 > data.len() {
            return Err(AdapterError::parse("JPEG truncado"));
        }
        let length = usize::from(u16::from_be_bytes([data[marker_pos + 2], data[marker_pos + 3]]));
        let end = marker_pos + 2 + length;
        if length < 2 || end > data.len() {
            return Err(AdapterError::parse("longitud de segmento JPEG inválida"));
        }

        if marker != APP0
            && let Some(tiff) = pending_exif.take()
        {
            push_exif_segment(&mut out, tiff)?;
        }

        if marker == SOS {
            out.extend_from_slice(&data[marker_pos..]);
            break;
        }

        if !is_metadata_segment(marker) {
            out.extend_from_slice(&data[marker_pos..end]);
        }
        pos = end;
    }

    Ok(out)
}

fn push_exif_segment(out: &mut Vec<u8>, tiff: &[u8]) -> Result<(), AdapterError> {
    let length = EXIF_HEADER.len() + tiff.len() + 2;
    let length = u16::try_from(length)
        .map_err(|_| AdapterError::parse("la metadata conservada no cabe en un segmento APP1"))?;
    out.extend_from_slice(&[0xFF, APP1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(tiff);
    Ok(())
}
