//! Etiquetas de audio sin herramientas externas: ID3/APE en MP3, bloques de
//! metadata FLAC y chunks RIFF de WAV.
//!
//! La eliminación copia los datos de audio sin tocarlos y solo reconstruye
//! las cabeceras del contenedor.

use std::path::{Path, PathBuf};

use crate::classifier::normalized_extension;
use crate::error::AdapterError;
use crate::metadata::{FieldKey, FieldValue, MetadataMap};

use super::{BackendAdapter, Capability};

const ID3V1_LEN: usize = 128;
const APE_FOOTER_LEN: usize = 32;
const APE_HAS_HEADER: u32 = 0x8000_0000;

const FLAC_STREAMINFO: u8 = 0;
const FLAC_APPLICATION: u8 = 2;
const FLAC_SEEKTABLE: u8 = 3;
const FLAC_VORBIS_COMMENT: u8 = 4;
const FLAC_CUESHEET: u8 = 5;
const FLAC_PICTURE: u8 = 6;

const RIFF_DROPPED: &[&[u8; 4]] = &[b"LIST", b"id3 ", b"ID3 ", b"bext", b"iXML", b"_PMX"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AudioContainer {
    Mp3,
    Flac,
    Wav,
}

fn detect_container(path: &Path, data: &[u8]) -> Option<AudioContainer> {
    if data.starts_with(b"fLaC") {
        return Some(AudioContainer::Flac);
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WAVE" {
        return Some(AudioContainer::Wav);
    }
    if data.starts_with(b"ID3") || normalized_extension(path) == "mp3" {
        return Some(AudioContainer::Mp3);
    }
    None
}

pub struct AudioTagsAdapter;

impl BackendAdapter for AudioTagsAdapter {
    fn name(&self) -> &'static str {
        "audio-tags"
    }

    fn capability(&self, extension: &str) -> Capability {
        match extension {
            "mp3" | "flac" | "wav" => Capability::ExtractAndRemove,
            _ => Capability::ExtractOnly,
        }
    }

    fn extract(&self, path: &Path) -> Result<MetadataMap, AdapterError> {
        let data = std::fs::read(path)?;
        let mut map = MetadataMap::new();
        match detect_container(path, &data) {
            Some(AudioContainer::Mp3) => mp3_fields(&data, &mut map),
            Some(AudioContainer::Flac) => flac_fields(&data, &mut map)?,
            Some(AudioContainer::Wav) => wav_fields(&data, &mut map)?,
            None => return Err(unsupported(path)),
        }
        Ok(map)
    }

    fn remove(
        &self,
        input: &Path,
        output: &Path,
        _retained: &MetadataMap,
    ) -> Result<PathBuf, AdapterError> {
        let data = std::fs::read(input)?;
        let cleaned = match detect_container(input, &data) {
            Some(AudioContainer::Mp3) => strip_mp3(&data)?,
            Some(AudioContainer::Flac) => strip_flac(&data)?,
            Some(AudioContainer::Wav) => strip_wav(&data)?,
            None => return Err(unsupported(input)),
        };
        std::fs::write(output, cleaned)?;
        Ok(output.to_path_buf())
    }
}

fn unsupported(path: &Path) -> AdapterError {
    AdapterError::UnsupportedContainer(normalized_extension(path))
}

fn insert_text(map: &mut MetadataMap, key: String, value: String) {
    if !value.is_empty() {
        map.insert(FieldKey::name(key), FieldValue::Text(value));
    }
}

fn binary_summary(len: usize) -> FieldValue {
    FieldValue::text(format!("(Binary data {len} bytes)"))
}

// Lectura acotada sobre un slice.

fn take<'a>(cursor: &mut &'a [u8], len: usize) -> Option<&'a [u8]> {
    if cursor.len() < len {
        return None;
    }
    let (head, tail) = cursor.split_at(len);
    *cursor = tail;
    Some(head)
}

fn take_u32_le(cursor: &mut &[u8]) -> Option<u32> {
    take(cursor, 4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn u32_le_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

// MP3

struct Id3Header {
    major: u8,
    flags: u8,
    size: usize,
}

impl Id3Header {
    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 10 || &data[0..3] != b"ID3" {
            return None;
        }
        Some(Self {
            major: data[3],
            flags: data[5],
            size: synchsafe_to_u32(&data[6..10]) as usize,
        })
    }

    fn total_len(&self) -> usize {
        let footer = if self.flags & 0x10 != 0 { 10 } else { 0 };
        10 + self.size + footer
    }
}

fn synchsafe_to_u32(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0_u32, |value, &b| (value << 7) | (b as u32 & 0x7F))
}

fn has_id3v1(data: &[u8]) -> bool {
    data.len() >= ID3V1_LEN && &data[data.len() - ID3V1_LEN..data.len() - ID3V1_LEN + 3] == b"TAG"
}

fn ape_tag_len(data: &[u8]) -> Option<usize> {
    if data.len() < APE_FOOTER_LEN {
        return None;
    }
    let footer_start = data.len() - APE_FOOTER_LEN;
    if &data[footer_start..footer_start + 8] != b"APETAGEX" {
        return None;
    }
    let size = u32_le_at(data, footer_start + 12)? as usize;
    let flags = u32_le_at(data, footer_start + 20)?;
    let total = size + if flags & APE_HAS_HEADER != 0 { APE_FOOTER_LEN } else { 0 };
    (total <= data.len()).then_some(total)
}

/// Rango de los datos de audio una vez descartadas las etiquetas.
fn mp3_audio_range(data: &[u8]) -> Result<(usize, usize), AdapterError> {
    let mut start = 0;
    while let Some(header) = Id3Header::parse(&data[start..]) {
        let end = start + header.total_len();
        if end > data.len() {
            return Err(AdapterError::parse("Etiqueta ID3v2 truncada"));
        }
        start = end;
    }

    let mut end = data.len();
    if has_id3v1(&data[start..end]) {
        end -= ID3V1_LEN;
    }
    if let Some(len) = ape_tag_len(&data[start..end]) {
        end -= len;
    }

    if start >= end {
        return Err(AdapterError::parse("El MP3 no contiene datos de audio"));
    }
    Ok((start, end))
}

fn strip_mp3(data: &[u8]) -> Result<Vec<u8>, AdapterError> {
    let (start, end) = mp3_audio_range(data)?;
    Ok(data[start..end].to_vec())
}

fn decode_utf16(data: &[u8], little_endian: bool) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

fn decode_id3_string(encoding: u8, data: &[u8]) -> Option<String> {
    let raw: String = match encoding {
        0 => data.iter().map(|&b| b as char).collect(),
        1 => match data {
            [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, true),
            [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, false),
            _ => decode_utf16(data, false),
        },
        2 => decode_utf16(data, false),
        3 => String::from_utf8_lossy(data).into_owned(),
        _ => return None,
    };
    Some(raw.replace('\u{feff}', ""))
}

/// Los valores múltiples de un frame de texto van separados por NUL.
fn decode_id3_text(frame: &[u8]) -> Option<String> {
    let (&encoding, data) = frame.split_first()?;
    let text = decode_id3_string(encoding, data)?;
    let values: Vec<&str> = text
        .split('\0')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect();
    Some(values.join("; "))
}

/// `COMM`/`USLT`: codificación, idioma, descripción y texto.
fn decode_id3_comment(frame: &[u8]) -> Option<String> {
    if frame.len() < 4 {
        return None;
    }
    let text = decode_id3_string(frame[0], &frame[4..])?;
    text.split('\0')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .last()
        .map(str::to_string)
}

fn id3v2_fields(data: &[u8], map: &mut MetadataMap) {
    let Some(header) = Id3Header::parse(data) else {
        return;
    };
    if header.major < 3 {
        tracing::debug!(version = header.major, "ID3v2 anterior a 2.3, frames no leídos");
        map.insert(
            FieldKey::name("ID3:Version"),
            FieldValue::text(format!("2.{}", header.major)),
        );
        return;
    }

    let end = (10 + header.size).min(data.len());
    let mut offset = 10;
    if header.flags & 0x40 != 0 && offset + 4 <= end {
        let size_bytes = &data[offset..offset + 4];
        offset += if header.major == 4 {
            synchsafe_to_u32(size_bytes) as usize
        } else {
            u32::from_be_bytes([size_bytes[0], size_bytes[1], size_bytes[2], size_bytes[3]]) as usize + 4
        };
    }

    while offset + 10 <= end {
        let id = &data[offset..offset + 4];
        if id[0] == 0 {
            break;
        }
        let size_bytes = &data[offset + 4..offset + 8];
        let size = if header.major == 4 {
            synchsafe_to_u32(size_bytes)
        } else {
            u32::from_be_bytes([size_bytes[0], size_bytes[1], size_bytes[2], size_bytes[3]])
        } as usize;
        let frame_start = offset + 10;
        let frame_end = frame_start + size;
        if frame_end > end {
            break;
        }
        let frame = &data[frame_start..frame_end];
        let key = format!("ID3:{}", String::from_utf8_lossy(id));
        match id {
            b"APIC" | b"GEOB" | b"PRIV" => {
                map.insert(FieldKey::name(key), binary_summary(frame.len()));
            }
            b"COMM" | b"USLT" => {
                if let Some(text) = decode_id3_comment(frame) {
                    insert_text(map, key, text);
                }
            }
            [b'T', ..] => {
                if let Some(text) = decode_id3_text(frame) {
                    insert_text(map, key, text);
                }
            }
            _ => {}
        }
        offset = frame_end;
    }
}

fn latin1_field(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect::<String>()
        .trim()
        .to_string()
}

fn id3v1_fields(tag: &[u8], map: &mut MetadataMap) {
    let fields = [
        ("Title", 3..33),
        ("Artist", 33..63),
        ("Album", 63..93),
        ("Year", 93..97),
        ("Comment", 97..127),
    ];
    for (name, range) in fields {
        insert_text(map, format!("ID3v1:{name}"), latin1_field(&tag[range]));
    }
}

fn mp3_fields(data: &[u8], map: &mut MetadataMap) {
    id3v2_fields(data, map);

    let mut end = data.len();
    if has_id3v1(data) {
        id3v1_fields(&data[end - ID3V1_LEN..], map);
        end -= ID3V1_LEN;
    }
    if let Some(len) = ape_tag_len(&data[..end]) {
        map.insert(FieldKey::name("APE:Tag"), binary_summary(len));
    }
}

// FLAC

struct FlacBlock<'a> {
    kind: u8,
    body: &'a [u8],
}

/// Bloques de metadata y posición donde empiezan los frames de audio.
fn flac_blocks(data: &[u8]) -> Result<(Vec<FlacBlock<'_>>, usize), AdapterError> {
    if !data.starts_with(b"fLaC") {
        return Err(AdapterError::UnsupportedContainer("flac".to_string()));
    }
    let mut offset = 4;
    let mut blocks = Vec::new();
    loop {
        let header = data
            .get(offset..offset + 4)
            .ok_or_else(|| AdapterError::parse("Cabecera de bloque FLAC truncada"))?;
        let last = header[0] & 0x80 != 0;
        let kind = header[0] & 0x7F;
        let len = u32::from_be_bytes([0, header[1], header[2], header[3]]) as usize;
        let start = offset + 4;
        let body = data
            .get(start..start + len)
            .ok_or_else(|| AdapterError::parse("Bloque de metadata FLAC truncado"))?;
        blocks.push(FlacBlock { kind, body });
        offset = start + len;
        if last {
            break;
        }
    }
    Ok((blocks, offset))
}

fn strip_flac(data: &[u8]) -> Result<Vec<u8>, AdapterError> {
    let (blocks, audio_start) = flac_blocks(data)?;
    let kept: Vec<&FlacBlock<'_>> = blocks
        .iter()
        .filter(|block| matches!(block.kind, FLAC_STREAMINFO | FLAC_SEEKTABLE | FLAC_CUESHEET))
        .collect();
    if kept.first().is_none_or(|block| block.kind != FLAC_STREAMINFO) {
        return Err(AdapterError::parse("FLAC sin bloque STREAMINFO inicial"));
    }

    let mut output = Vec::with_capacity(data.len());
    output.extend_from_slice(b"fLaC");
    for (index, block) in kept.iter().enumerate() {
        let last = if index + 1 == kept.len() { 0x80 } else { 0 };
        let len = (block.body.len() as u32).to_be_bytes();
        output.push(block.kind | last);
        output.extend_from_slice(&len[1..]);
        output.extend_from_slice(block.body);
    }
    output.extend_from_slice(&data[audio_start..]);
    Ok(output)
}

fn vorbis_comments(body: &[u8], map: &mut MetadataMap) -> Option<()> {
    let mut cursor = body;
    let vendor_len = take_u32_le(&mut cursor)? as usize;
    let vendor = take(&mut cursor, vendor_len)?;
    insert_text(
        map,
        "Vorbis:Vendor".to_string(),
        String::from_utf8_lossy(vendor).trim().to_string(),
    );

    let count = take_u32_le(&mut cursor)?;
    for _ in 0..count {
        let len = take_u32_le(&mut cursor)? as usize;
        let entry = String::from_utf8_lossy(take(&mut cursor, len)?).into_owned();
        if let Some((key, value)) = entry.split_once('=') {
            insert_text(
                map,
                format!("Vorbis:{}", key.to_ascii_uppercase()),
                value.trim().to_string(),
            );
        }
    }
    Some(())
}

fn flac_fields(data: &[u8], map: &mut MetadataMap) -> Result<(), AdapterError> {
    let (blocks, _) = flac_blocks(data)?;
    for block in blocks {
        match block.kind {
            FLAC_VORBIS_COMMENT => {
                if vorbis_comments(block.body, map).is_none() {
                    tracing::warn!("Comentario Vorbis truncado");
                }
            }
            FLAC_PICTURE => {
                map.insert(FieldKey::name("FLAC:Picture"), binary_summary(block.body.len()));
            }
            FLAC_APPLICATION => {
                map.insert(FieldKey::name("FLAC:Application"), binary_summary(block.body.len()));
            }
            _ => {}
        }
    }
    Ok(())
}

// WAV

struct RiffChunk<'a> {
    id: [u8; 4],
    body: &'a [u8],
    raw: &'a [u8],
}

fn riff_chunks(data: &[u8]) -> Result<Vec<RiffChunk<'_>>, AdapterError> {
    if data.len() < 12 || !data.starts_with(b"RIFF") || &data[8..12] != b"WAVE" {
        return Err(AdapterError::UnsupportedContainer("wav".to_string()));
    }
    let mut offset = 12;
    let mut chunks = Vec::new();
    while offset + 8 <= data.len() {
        let id = [data[offset], data[offset + 1], data[offset + 2], data[offset + 3]];
        let size = u32_le_at(data, offset + 4).unwrap_or_default() as usize;
        let start = offset + 8;
        let body = data
            .get(start..start + size)
            .ok_or_else(|| AdapterError::parse("Chunk RIFF truncado"))?;
        let padded = (start + size + (size & 1)).min(data.len());
        chunks.push(RiffChunk {
            id,
            body,
            raw: &data[offset..padded],
        });
        offset = padded;
    }
    Ok(chunks)
}

fn strip_wav(data: &[u8]) -> Result<Vec<u8>, AdapterError> {
    let chunks = riff_chunks(data)?;
    let has = |id: &[u8; 4]| chunks.iter().any(|chunk| &chunk.id == id);
    if !has(b"fmt ") || !has(b"data") {
        return Err(AdapterError::parse("WAV sin chunks fmt/data"));
    }

    let mut output = Vec::with_capacity(data.len());
    output.extend_from_slice(b"RIFF");
    output.extend_from_slice(&[0; 4]);
    output.extend_from_slice(b"WAVE");
    for chunk in chunks.iter().filter(|chunk| !RIFF_DROPPED.contains(&&chunk.id)) {
        output.extend_from_slice(chunk.raw);
        if chunk.raw.len() % 2 == 1 {
            output.push(0);
        }
    }

    let riff_size = u32::try_from(output.len() - 8)
        .map_err(|_| AdapterError::parse("WAV demasiado grande para RIFF"))?;
    output[4..8].copy_from_slice(&riff_size.to_le_bytes());
    Ok(output)
}

fn wav_fields(data: &[u8], map: &mut MetadataMap) -> Result<(), AdapterError> {
    for chunk in riff_chunks(data)? {
        match &chunk.id {
            b"LIST" if chunk.body.starts_with(b"INFO") => info_entries(&chunk.body[4..], map),
            b"LIST" => {
                map.insert(FieldKey::name("RIFF:LIST"), binary_summary(chunk.body.len()));
            }
            b"id3 " | b"ID3 " => id3v2_fields(chunk.body, map),
            b"bext" | b"iXML" | b"_PMX" => {
                let key = format!("RIFF:{}", String::from_utf8_lossy(&chunk.id).trim());
                map.insert(FieldKey::name(key), binary_summary(chunk.body.len()));
            }
            _ => {}
        }
    }
    Ok(())
}

fn info_entries(mut body: &[u8], map: &mut MetadataMap) {
    while let Some(id) = take(&mut body, 4) {
        let Some(size) = take_u32_le(&mut body) else {
            break;
        };
        let Some(value) = take(&mut body, size as usize) else {
            break;
        };
        if size % 2 == 1 {
            let _ = take(&mut body, 1);
        }
        insert_text(
            map,
            format!("RIFF:{}", String::from_utf8_lossy(id)),
            latin1_field(value),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MP3_FRAMES: &[u8] = &[0xFF, 0xFB, 0x90, 0x64, 0x00, 0x00, 0x00, 0x00, 0x11, 0x22];

    fn id3_text_frame(id: &[u8; 4], text: &str) -> Vec<u8> {
        let mut body = vec![3];
        body.extend_from_slice(text.as_bytes());
        let mut frame = id.to_vec();
        frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
        frame.extend_from_slice(&[0, 0]);
        frame.extend(body);
        frame
    }

    fn sample_mp3() -> Vec<u8> {
        let mut frames = id3_text_frame(b"TIT2", "Canción");
        frames.extend(id3_text_frame(b"TPE1", "Grupo"));
        let size = frames.len() as u32;
        let synchsafe = [
            ((size >> 21) & 0x7F) as u8,
            ((size >> 14) & 0x7F) as u8,
            ((size >> 7) & 0x7F) as u8,
            (size & 0x7F) as u8,
        ];

        let mut data = b"ID3\x03\x00\x00".to_vec();
        data.extend_from_slice(&synchsafe);
        data.extend(frames);
        data.extend_from_slice(MP3_FRAMES);

        let mut v1 = vec![0_u8; ID3V1_LEN];
        v1[..3].copy_from_slice(b"TAG");
        v1[3..8].copy_from_slice(b"Viejo");
        data.extend(v1);
        data
    }

    fn flac_block(kind: u8, last: bool, body: &[u8]) -> Vec<u8> {
        let len = (body.len() as u32).to_be_bytes();
        let mut block = vec![kind | if last { 0x80 } else { 0 }];
        block.extend_from_slice(&len[1..]);
        block.extend_from_slice(body);
        block
    }

    fn sample_flac() -> Vec<u8> {
        let mut comment = Vec::new();
        comment.extend_from_slice(&4_u32.to_le_bytes());
        comment.extend_from_slice(b"test");
        comment.extend_from_slice(&1_u32.to_le_bytes());
        let entry = b"artist=Grupo";
        comment.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        comment.extend_from_slice(entry);

        let mut data = b"fLaC".to_vec();
        data.extend(flac_block(FLAC_STREAMINFO, false, &[7; 34]));
        data.extend(flac_block(FLAC_VORBIS_COMMENT, false, &comment));
        data.extend(flac_block(FLAC_PICTURE, false, &[1, 2, 3]));
        data.extend(flac_block(1, true, &[0; 8]));
        data.extend_from_slice(&[0xFF, 0xF8, 0xAA, 0xBB]);
        data
    }

    fn riff_chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut chunk = id.to_vec();
        chunk.extend_from_slice(&(body.len() as u32).to_le_bytes());
        chunk.extend_from_slice(body);
        if body.len() % 2 == 1 {
            chunk.push(0);
        }
        chunk
    }

    fn sample_wav() -> Vec<u8> {
        let mut info = b"INFO".to_vec();
        info.extend(riff_chunk(b"IART", b"Grupo\0"));
        info.extend(riff_chunk(b"ICRD", b"2025\0"));

        let mut body = b"WAVE".to_vec();
        body.extend(riff_chunk(b"fmt ", &[1, 0, 1, 0, 0x44, 0xAC, 0, 0, 0x88, 0x58, 1, 0, 2, 0, 16, 0]));
        body.extend(riff_chunk(b"LIST", &info));
        body.extend(riff_chunk(b"data", &[0, 1, 2, 3, 4]));

        let mut data = b"RIFF".to_vec();
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.extend(body);
        data
    }

    #[test]
    fn mp3_tags_are_read_and_stripped() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("tema.mp3");
        let output = dir.path().join("tema_cleaned.mp3");
        std::fs::write(&source, sample_mp3())?;

        let map = AudioTagsAdapter.extract(&source)?;
        assert_eq!(
            map.get(&FieldKey::name("ID3:TIT2")),
            Some(&FieldValue::text("Canción"))
        );
        assert_eq!(
            map.get(&FieldKey::name("ID3v1:Title")),
            Some(&FieldValue::text("Viejo"))
        );

        AudioTagsAdapter.remove(&source, &output, &MetadataMap::new())?;
        assert_eq!(std::fs::read(&output)?, MP3_FRAMES);
        assert!(AudioTagsAdapter.extract(&output)?.is_empty());
        Ok(())
    }

    #[test]
    fn ape_trailer_is_removed() -> Result<(), AdapterError> {
        let mut data = MP3_FRAMES.to_vec();
        let mut footer = b"APETAGEX".to_vec();
        footer.extend_from_slice(&2000_u32.to_le_bytes());
        footer.extend_from_slice(&(APE_FOOTER_LEN as u32).to_le_bytes());
        footer.extend_from_slice(&0_u32.to_le_bytes());
        footer.extend_from_slice(&0_u32.to_le_bytes());
        footer.extend_from_slice(&[0; 8]);
        data.extend(footer);

        assert_eq!(strip_mp3(&data)?, MP3_FRAMES);
        Ok(())
    }

    #[test]
    fn flac_keeps_streaminfo_and_audio() -> Result<(), AdapterError> {
        let data = sample_flac();
        let mut map = MetadataMap::new();
        flac_fields(&data, &mut map)?;
        assert_eq!(
            map.get(&FieldKey::name("Vorbis:ARTIST")),
            Some(&FieldValue::text("Grupo"))
        );
        assert!(map.contains_name("Picture"));

        let cleaned = strip_flac(&data)?;
        let (blocks, audio_start) = flac_blocks(&cleaned)?;
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, FLAC_STREAMINFO);
        assert_eq!(&cleaned[audio_start..], &[0xFF, 0xF8, 0xAA, 0xBB]);
        assert_eq!(cleaned[4], 0x80);
        Ok(())
    }

    #[test]
    fn wav_info_chunk_is_dropped_and_size_fixed() -> Result<(), AdapterError> {
        let data = sample_wav();
        let mut map = MetadataMap::new();
        wav_fields(&data, &mut map)?;
        assert_eq!(
            map.get(&FieldKey::name("RIFF:IART")),
            Some(&FieldValue::text("Grupo"))
        );

        let cleaned = strip_wav(&data)?;
        let riff_size = u32_le_at(&cleaned, 4).unwrap_or_default() as usize;
        assert_eq!(riff_size, cleaned.len() - 8);
        let ids: Vec<[u8; 4]> = riff_chunks(&cleaned)?.iter().map(|chunk| chunk.id).collect();
        assert_eq!(ids, vec![*b"fmt ", *b"data"]);
        Ok(())
    }

    #[test]
    fn stripping_is_idempotent() -> Result<(), AdapterError> {
        let once = strip_flac(&sample_flac())?;
        assert_eq!(strip_flac(&once)?, once);
        let once = strip_wav(&sample_wav())?;
        assert_eq!(strip_wav(&once)?, once);
        Ok(())
    }

    #[test]
    fn truncated_id3_is_a_parse_error() {
        let data = b"ID3\x03\x00\x00\x00\x00\x7F\x7F".to_vec();
        assert!(matches!(strip_mp3(&data), Err(AdapterError::Parse(_))));
    }
}
