//! Campos que pertenecen a cada categoría de filtrado.

use crate::metadata::FieldKey;

pub const ORIENTATION_FIELDS: &[&str] = &["Orientation"];

pub const GPS_COORDINATE_FIELDS: &[&str] = &[
    "GPSLatitude",
    "GPSLongitude",
    "GPSDestLatitude",
    "GPSDestLongitude",
];

pub const GPS_ALTITUDE_FIELDS: &[&str] = &["GPSAltitude", "GPSAltitudeRef"];

pub const TIMESTAMP_FIELDS: &[&str] = &[
    "DateTime",
    "DateTimeOriginal",
    "DateTimeDigitized",
    "CreateDate",
    "ModifyDate",
    "DateCreated",
    "MetadataDate",
    "DateTimeCreated",
    "DigitalCreationDate",
    "DigitalCreationDateTime",
];

/// Precisión sub-segundo, zona horaria y horas sin fecha; se descartan con `date_only`.
pub const TIMESTAMP_DETAIL_FIELDS: &[&str] = &[
    "SubSecTime",
    "SubSecTimeOriginal",
    "SubSecTimeDigitized",
    "OffsetTime",
    "OffsetTimeOriginal",
    "OffsetTimeDigitized",
    "TimeCreated",
    "DigitalCreationTime",
];

pub const CAMERA_FIELDS: &[&str] = &[
    "Make",
    "Model",
    "Software",
    "ExposureTime",
    "FNumber",
    "ExposureProgram",
    "ExposureMode",
    "ISO",
    "PhotographicSensitivity",
    "Flash",
    "FocalLength",
    "FocalLengthIn35mmFilm",
    "FocalLengthIn35mmFormat",
    "ApertureValue",
    "ShutterSpeedValue",
    "MaxApertureValue",
    "ExposureBiasValue",
    "ExposureCompensation",
    "MeteringMode",
    "WhiteBalance",
    "SceneCaptureType",
    "LensMake",
    "LensModel",
    "LensSpecification",
    "LensInfo",
    "BodySerialNumber",
    "SerialNumber",
    "LensSerialNumber",
    "CameraOwnerName",
    "OwnerName",
    "MakerNote",
    "GPSDateStamp",
    "GPSTimeStamp",
];

pub const DESCRIPTION_FIELDS: &[&str] = &[
    "ImageDescription",
    "UserComment",
    "XPTitle",
    "XPComment",
    "XPSubject",
    "XPKeywords",
    "XPAuthor",
    "DocumentName",
    "Artist",
    "Description",
    "Caption-Abstract",
    "Title",
    "ObjectName",
    "Headline",
    "Creator",
    "By-line",
    "By-lineTitle",
    "Writer-Editor",
    "Keywords",
    "Subject",
    "City",
    "Sub-location",
    "Province-State",
    "Country-PrimaryLocationName",
    "Country-PrimaryLocationCode",
    "Location",
    "State",
    "Country",
    "CountryCode",
];

pub const THUMBNAIL_FIELDS: &[&str] = &[
    "ThumbnailImage",
    "ThumbnailOffset",
    "ThumbnailLength",
    "PreviewImage",
    "JPEGInterchangeFormat",
    "JPEGInterchangeFormatLength",
];

pub const SOFTWARE_FIELDS: &[&str] = &[
    "Software",
    "ProcessingSoftware",
    "HostComputer",
    "CreatorTool",
    "HistorySoftwareAgent",
    "OriginatingProgram",
    "ProgramVersion",
];

pub fn name_in(key: &FieldKey, names: &[&str]) -> bool {
    let canonical = key.canonical_name();
    names
        .iter()
        .any(|name| name.eq_ignore_ascii_case(&canonical))
}

pub fn is_thumbnail_field(key: &FieldKey) -> bool {
    key.is_thumbnail_ifd() || name_in(key, THUMBNAIL_FIELDS)
}
