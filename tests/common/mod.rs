#![allow(dead_code)]

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use metaclean::adapters::{Backends, ToolAvailability};
use metaclean::{Cleaner, FallbackDispatcher, Settings};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Registro real sin herramientas externas.
pub fn library_backends() -> Backends {
    Backends::with_tools(&ToolAvailability::none(), &Settings::default())
}

pub fn library_cleaner() -> Cleaner {
    Cleaner::new(FallbackDispatcher::new(library_backends()))
}

fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

fn rationals(tag: Tag, values: &[(u32, u32)]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(values.iter().map(|&(num, denom)| exif::Rational { num, denom }).collect()),
    }
}

fn exif_block() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let fields = [
        ascii(Tag::Make, "Canon"),
        ascii(Tag::Model, "EOS R5"),
        ascii(Tag::Artist, "Ana Pérez"),
        ascii(Tag::DateTimeOriginal, "2025:02:23 10:00:00"),
        ascii(Tag::GPSLatitudeRef, "N"),
        rationals(Tag::GPSLatitude, &[(40, 1), (26, 1), (4650, 100)]),
        rationals(Tag::GPSAltitude, &[(6500, 100)]),
    ];
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false)?;
    Ok(tiff.into_inner())
}

/// JPEG de 8x8 con un segmento APP1 de EXIF justo después de SOI.
pub fn write_tagged_jpeg(dir: &Path, name: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 90, 30])));
    let mut pixels = Cursor::new(Vec::new());
    image.write_to(&mut pixels, ImageFormat::Jpeg)?;
    let pixels = pixels.into_inner();

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend(exif_block()?);
    let length = u16::try_from(payload.len() + 2)?;

    let mut data = pixels[..2].to_vec();
    data.extend_from_slice(&[0xFF, 0xE1]);
    data.extend_from_slice(&length.to_be_bytes());
    data.extend(payload);
    data.extend_from_slice(&pixels[2..]);

    let path = dir.join(name);
    fs::write(&path, data)?;
    Ok(path)
}

pub fn write_png(dir: &Path, name: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.join(name);
    RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])).save(&path)?;
    Ok(path)
}

pub fn write_docx(dir: &Path, name: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    use zip::write::FileOptions;
    use zip::{CompressionMethod, ZipWriter};

    let path = dir.join(name);
    let mut writer = ZipWriter::new(File::create(&path)?);
    let options = FileOptions::<'_, ()>::default().compression_method(CompressionMethod::Deflated);
    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#,
        ),
        (
            "word/document.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p/></w:body></w:document>"#,
        ),
        (
            "docProps/core.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:creator>Jefa de Proyecto</dc:creator><dc:title>Presupuesto</dc:title></cp:coreProperties>"#,
        ),
    ];
    for (part, contents) in parts {
        writer.start_file(part, options)?;
        writer.write_all(contents.as_bytes())?;
    }
    writer.finish()?;
    Ok(path)
}

/// MP3 con una etiqueta ID3v2.3 (TPE1) y un fragmento de trama.
pub fn write_tagged_mp3(dir: &Path, name: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut body = vec![3];
    body.extend_from_slice(b"Grupo Local");
    let mut frame = b"TPE1".to_vec();
    frame.extend_from_slice(&u32::try_from(body.len())?.to_be_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.extend(body);

    let size = u32::try_from(frame.len())?;
    let mut data = b"ID3\x03\x00\x00".to_vec();
    data.extend_from_slice(&[
        ((size >> 21) & 0x7F) as u8,
        ((size >> 14) & 0x7F) as u8,
        ((size >> 7) & 0x7F) as u8,
        (size & 0x7F) as u8,
    ]);
    data.extend(frame);
    data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64, 0x00, 0x00, 0x00, 0x00, 0x11, 0x22]);

    let path = dir.join(name);
    fs::write(&path, data)?;
    Ok(path)
}
