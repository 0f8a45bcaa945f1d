//! Recodificación de píxeles con el crate `image`.
//!
//! Último recurso para imágenes: la salida no conserva ningún campo y los
//! formatos con pérdida se vuelven a comprimir. La orientación EXIF se aplica
//! a los píxeles antes de guardar, ya que la etiqueta desaparece.

use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::path::{Path, PathBuf};

use crate::error::AdapterError;
use crate::metadata::{FieldKey, FieldValue, MetadataMap};

use super::{BackendAdapter, Capability};

pub struct PixelReencodeAdapter;

fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, AdapterError> {
    ImageReader::open(path)?
        .with_guessed_format()
        .map_err(AdapterError::Io)
}

impl BackendAdapter for PixelReencodeAdapter {
    fn name(&self) -> &'static str {
        "pixel-reencode"
    }

    fn capability(&self, extension: &str) -> Capability {
        match extension {
            "jpg" | "jpeg" | "png" | "tif" | "tiff" | "webp" => Capability::ExtractAndRemove,
            _ => Capability::ExtractOnly,
        }
    }

    fn extract(&self, path: &Path) -> Result<MetadataMap, AdapterError> {
        let reader = open_reader(path)?;
        let format = reader.format();
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| AdapterError::parse(format!("No se pudo leer la imagen: {e}")))?;

        let mut map = MetadataMap::new();
        map.insert(FieldKey::name("Image:ImageWidth"), FieldValue::Long(vec![width]));
        map.insert(FieldKey::name("Image:ImageHeight"), FieldValue::Long(vec![height]));
        if let Some(format) = format {
            map.insert(
                FieldKey::name("Image:Format"),
                FieldValue::text(format!("{format:?}")),
            );
        }
        Ok(map)
    }

    fn remove(
        &self,
        input: &Path,
        output: &Path,
        _retained: &MetadataMap,
    ) -> Result<PathBuf, AdapterError> {
        let reader = open_reader(input)?;
        let format = reader
            .format()
            .ok_or_else(|| AdapterError::UnsupportedContainer("formato de imagen desconocido".to_string()))?;
        let decode_error =
            |e: image::ImageError| AdapterError::parse(format!("No se pudo decodificar la imagen: {e}"));
        let mut decoder = reader.into_decoder().map_err(decode_error)?;
        let orientation = decoder.orientation().map_err(decode_error)?;
        let mut image = DynamicImage::from_decoder(decoder).map_err(decode_error)?;
        image.apply_orientation(orientation);

        let image = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
            _ => image,
        };

        image
            .save_with_format(output, format)
            .map_err(|e| AdapterError::parse(format!("No se pudo guardar la imagen limpia: {e}")))?;
        Ok(output.to_path_buf())
    }
}
