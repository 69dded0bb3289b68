//! Mimetype and SIP type classification
//!
//! Two static lookup tables:
//!
//! - file extension to mimetype, matched case-insensitively
//! - mimetype to the archival content category used as the METS `TYPE`
//!
//! Neither lookup ever fails. Unknown extensions have no mimetype, and
//! unknown (or absent) mimetypes fall into [`SIP_TYPE_OTHER`].

use std::path::Path;

/// Category for content without a more specific classification
pub const SIP_TYPE_OTHER: &str = "OTHER";

const PHOTOGRAPHS: &str = "Photographs - Digital";
const AUDIO: &str = "Audio - Media-independent (digital)";
const VIDEO: &str = "Video - File-based and Physical Media";

/// Extension (lowercase, without dot) to mimetype
pub const EXTENSION_MIMETYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("pdf", "application/pdf"),
    ("tiff", "image/tiff"),
    ("tif", "image/tiff"),
    ("mxf", "application/mxf"),
    ("mov", "video/quicktime"),
    ("mp4", "video/mp4"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/x-wav"),
    ("jp2", "image/jp2"),
    ("jpeg", "image/jpeg"),
    ("mp2", "audio/mpeg"),
    ("mpg", "video/mpeg"),
    ("ogg", "audio/ogg"),
    ("zip", "application/zip"),
    ("ts", "video/MP2T"),
    ("m4v", "video/mp4"),
    ("xml", "application/xml"),
    ("psb", "image/vnd.adobe.photoshop"),
    ("mpeg", "video/mpeg"),
    ("mts", "video/MP2T"),
    ("srt", "text/plain"),
    ("mkv", "video/x-matroska"),
    ("avi", "video/x-msvideo"),
    ("dng", "image/x-adobe-dng"),
    ("flv", "video/x-flv"),
    ("wmv", "video/x-ms-wmv"),
    ("dv", "video/x-dv"),
    ("f4v", "video/mp4"),
    ("png", "image/png"),
    ("m4a", "audio/mp4"),
    ("vob", "video/dvd"),
    ("m2v", "video/mpeg"),
    ("aif", "audio/aiff"),
    ("wma", "audio/x-ms-wma"),
    ("ac3", "audio/ac3"),
    ("psd", "image/vnd.adobe.photoshop"),
];

/// Mimetype to SIP content category
pub const MIMETYPE_SIP_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", PHOTOGRAPHS),
    ("image/tiff", PHOTOGRAPHS),
    ("image/jp2", PHOTOGRAPHS),
    ("image/vnd.adobe.photoshop", PHOTOGRAPHS),
    ("image/x-adobe-dng", PHOTOGRAPHS),
    ("image/png", "Other Graphic Images - Digital"),
    ("audio/mpeg", AUDIO),
    ("audio/x-wav", AUDIO),
    ("audio/ogg", AUDIO),
    ("audio/mp4", AUDIO),
    ("audio/aiff", AUDIO),
    ("audio/x-ms-wma", AUDIO),
    ("audio/ac3", AUDIO),
    ("application/pdf", "Textual works - Digital"),
    ("application/zip", "Collection"),
    ("video/quicktime", VIDEO),
    ("video/mp4", VIDEO),
    ("video/MP2T", VIDEO),
    ("video/mpeg", VIDEO),
    ("application/mxf", VIDEO),
    ("video/x-matroska", VIDEO),
    ("video/x-msvideo", VIDEO),
    ("video/x-flv", VIDEO),
    ("video/x-ms-wmv", VIDEO),
    ("video/x-dv", VIDEO),
    ("video/dvd", VIDEO),
];

/// Look up the mimetype for a file extension.
///
/// The extension may be given with or without its leading dot and in any
/// case (`".MXF"`, `"mxf"`).
pub fn classify_mimetype(extension: &str) -> Option<&'static str> {
    let extension = extension.strip_prefix('.').unwrap_or(extension);
    EXTENSION_MIMETYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, mimetype)| *mimetype)
}

/// Look up the mimetype for a path based on its extension
pub fn mimetype_for_path(path: impl AsRef<Path>) -> Option<&'static str> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(classify_mimetype)
}

/// Map a mimetype onto its SIP content category.
///
/// Mimetypes are matched exactly (`video/MP2T` is registered with that
/// casing). Anything unmapped, including no mimetype at all, is `OTHER`.
pub fn classify_sip_type(mimetype: Option<&str>) -> &'static str {
    mimetype
        .and_then(|mimetype| {
            MIMETYPE_SIP_TYPES
                .iter()
                .find(|(known, _)| *known == mimetype)
                .map(|(_, sip_type)| *sip_type)
        })
        .unwrap_or(SIP_TYPE_OTHER)
}
