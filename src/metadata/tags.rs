//! Tabla de etiquetas EXIF conocidas y su nombre canónico.

use serde::{Deserialize, Serialize};

/// Directorio lógico al que pertenece una etiqueta numérica.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TagContext {
    Tiff,
    Exif,
    Gps,
    Interop,
}

impl TagContext {
    pub fn group_name(self, ifd: u16) -> &'static str {
        match (self, ifd) {
            (TagContext::Tiff, 0) => "IFD0",
            (TagContext::Tiff, _) => "IFD1",
            (TagContext::Exif, _) => "ExifIFD",
            (TagContext::Gps, _) => "GPS",
            (TagContext::Interop, _) => "InteropIFD",
        }
    }
}

const KNOWN_TAGS: &[(TagContext, u16, &str)] = &[
    (TagContext::Tiff, 0x000B, "ProcessingSoftware"),
    (TagContext::Tiff, 0x0100, "ImageWidth"),
    (TagContext::Tiff, 0x0101, "ImageLength"),
    (TagContext::Tiff, 0x0103, "Compression"),
    (TagContext::Tiff, 0x010D, "DocumentName"),
    (TagContext::Tiff, 0x010E, "ImageDescription"),
    (TagContext::Tiff, 0x010F, "Make"),
    (TagContext::Tiff, 0x0110, "Model"),
    (TagContext::Tiff, 0x0112, "Orientation"),
    (TagContext::Tiff, 0x011A, "XResolution"),
    (TagContext::Tiff, 0x011B, "YResolution"),
    (TagContext::Tiff, 0x0128, "ResolutionUnit"),
    (TagContext::Tiff, 0x0131, "Software"),
    (TagContext::Tiff, 0x0132, "DateTime"),
    (TagContext::Tiff, 0x013B, "Artist"),
    (TagContext::Tiff, 0x013C, "HostComputer"),
    (TagContext::Tiff, 0x0201, "JPEGInterchangeFormat"),
    (TagContext::Tiff, 0x0202, "JPEGInterchangeFormatLength"),
    (TagContext::Tiff, 0x0213, "YCbCrPositioning"),
    (TagContext::Tiff, 0x8298, "Copyright"),
    (TagContext::Tiff, 0x8769, "ExifIFDPointer"),
    (TagContext::Tiff, 0x8825, "GPSInfoIFDPointer"),
    (TagContext::Tiff, 0x9C9B, "XPTitle"),
    (TagContext::Tiff, 0x9C9C, "XPComment"),
    (TagContext::Tiff, 0x9C9D, "XPAuthor"),
    (TagContext::Tiff, 0x9C9E, "XPKeywords"),
    (TagContext::Tiff, 0x9C9F, "XPSubject"),
    (TagContext::Exif, 0x829A, "ExposureTime"),
    (TagContext::Exif, 0x829D, "FNumber"),
    (TagContext::Exif, 0x8822, "ExposureProgram"),
    (TagContext::Exif, 0x8827, "PhotographicSensitivity"),
    (TagContext::Exif, 0x9000, "ExifVersion"),
    (TagContext::Exif, 0x9003, "DateTimeOriginal"),
    (TagContext::Exif, 0x9004, "DateTimeDigitized"),
    (TagContext::Exif, 0x9010, "OffsetTime"),
    (TagContext::Exif, 0x9011, "OffsetTimeOriginal"),
    (TagContext::Exif, 0x9012, "OffsetTimeDigitized"),
    (TagContext::Exif, 0x9101, "ComponentsConfiguration"),
    (TagContext::Exif, 0x9201, "ShutterSpeedValue"),
    (TagContext::Exif, 0x9202, "ApertureValue"),
    (TagContext::Exif, 0x9204, "ExposureBiasValue"),
    (TagContext::Exif, 0x9205, "MaxApertureValue"),
    (TagContext::Exif, 0x9207, "MeteringMode"),
    (TagContext::Exif, 0x9209, "Flash"),
    (TagContext::Exif, 0x920A, "FocalLength"),
    (TagContext::Exif, 0x927C, "MakerNote"),
    (TagContext::Exif, 0x9286, "UserComment"),
    (TagContext::Exif, 0x9290, "SubSecTime"),
    (TagContext::Exif, 0x9291, "SubSecTimeOriginal"),
    (TagContext::Exif, 0x9292, "SubSecTimeDigitized"),
    (TagContext::Exif, 0xA000, "FlashpixVersion"),
    (TagContext::Exif, 0xA001, "ColorSpace"),
    (TagContext::Exif, 0xA002, "PixelXDimension"),
    (TagContext::Exif, 0xA003, "PixelYDimension"),
    (TagContext::Exif, 0xA005, "InteropIFDPointer"),
    (TagContext::Exif, 0xA402, "ExposureMode"),
    (TagContext::Exif, 0xA403, "WhiteBalance"),
    (TagContext::Exif, 0xA405, "FocalLengthIn35mmFilm"),
    (TagContext::Exif, 0xA406, "SceneCaptureType"),
    (TagContext::Exif, 0xA420, "ImageUniqueID"),
    (TagContext::Exif, 0xA430, "CameraOwnerName"),
    (TagContext::Exif, 0xA431, "BodySerialNumber"),
    (TagContext::Exif, 0xA432, "LensSpecification"),
    (TagContext::Exif, 0xA433, "LensMake"),
    (TagContext::Exif, 0xA434, "LensModel"),
    (TagContext::Exif, 0xA435, "LensSerialNumber"),
    (TagContext::Gps, 0x0000, "GPSVersionID"),
    (TagContext::Gps, 0x0001, "GPSLatitudeRef"),
    (TagContext::Gps, 0x0002, "GPSLatitude"),
    (TagContext::Gps, 0x0003, "GPSLongitudeRef"),
    (TagContext::Gps, 0x0004, "GPSLongitude"),
    (TagContext::Gps, 0x0005, "GPSAltitudeRef"),
    (TagContext::Gps, 0x0006, "GPSAltitude"),
    (TagContext::Gps, 0x0007, "GPSTimeStamp"),
    (TagContext::Gps, 0x000C, "GPSSpeedRef"),
    (TagContext::Gps, 0x000D, "GPSSpeed"),
    (TagContext::Gps, 0x0010, "GPSImgDirectionRef"),
    (TagContext::Gps, 0x0011, "GPSImgDirection"),
    (TagContext::Gps, 0x0012, "GPSMapDatum"),
    (TagContext::Gps, 0x0013, "GPSDestLatitudeRef"),
    (TagContext::Gps, 0x0014, "GPSDestLatitude"),
    (TagContext::Gps, 0x0015, "GPSDestLongitudeRef"),
    (TagContext::Gps, 0x0016, "GPSDestLongitude"),
    (TagContext::Gps, 0x001D, "GPSDateStamp"),
    (TagContext::Interop, 0x0001, "InteroperabilityIndex"),
];

/// Nombre canónico de una etiqueta numérica, si está en la tabla.
pub fn tag_name(context: TagContext, number: u16) -> Option<&'static str> {
    KNOWN_TAGS
        .iter()
        .find(|(ctx, num, _)| *ctx == context && *num == number)
        .map(|(_, _, name)| *name)
}

/// Búsqueda inversa: nombre canónico a contexto y número.
pub fn tag_by_name(name: &str) -> Option<(TagContext, u16)> {
    KNOWN_TAGS
        .iter()
        .find(|(_, _, known)| known.eq_ignore_ascii_case(name))
        .map(|(ctx, num, _)| (*ctx, *num))
}

/// Punteros y desplazamientos que el escritor EXIF recalcula por su cuenta.
pub fn is_structural_tag(context: TagContext, number: u16) -> bool {
    matches!(
        (context, number),
        (TagContext::Tiff, 0x8769)
            | (TagContext::Tiff, 0x8825)
            | (TagContext::Exif, 0xA005)
            | (TagContext::Tiff, 0x0201)
            | (TagContext::Tiff, 0x0202)
            | (TagContext::Tiff, 0x0111)
            | (TagContext::Tiff, 0x0117)
            | (TagContext::Tiff, 0x0144)
            | (TagContext::Tiff, 0x0145)
    )
}
