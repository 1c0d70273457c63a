//! Mime type inference for downloaded payloads.
//!
//! The blob collaborator returns raw bytes with no content type, so the
//! mime type handed to the engine is derived from the storage path's
//! extension, defaulting by media kind.

use core_state::MediaKind;

/// Mime type for a storage path, by extension.
pub fn mime_for_url(url: &str, kind: MediaKind) -> &'static str {
    let extension = url
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        _ => match kind {
            MediaKind::Audio => "audio/mpeg",
            MediaKind::Video => "video/mp4",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        assert_eq!(mime_for_url("uploads/a.mp3", MediaKind::Audio), "audio/mpeg");
        assert_eq!(mime_for_url("uploads/a.flac", MediaKind::Audio), "audio/flac");
        assert_eq!(mime_for_url("uploads/a.m4a", MediaKind::Audio), "audio/mp4");
        assert_eq!(mime_for_url("uploads/v.mp4", MediaKind::Video), "video/mp4");
        assert_eq!(mime_for_url("uploads/v.mkv", MediaKind::Video), "video/x-matroska");
        assert_eq!(mime_for_url("uploads/v.mov", MediaKind::Video), "video/quicktime");
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(mime_for_url("uploads/A.MP3", MediaKind::Audio), "audio/mpeg");
        assert_eq!(mime_for_url("uploads/V.WebM", MediaKind::Video), "video/webm");
    }

    #[test]
    fn unknown_extension_defaults_by_kind() {
        assert_eq!(mime_for_url("uploads/a.xyz", MediaKind::Audio), "audio/mpeg");
        assert_eq!(mime_for_url("uploads/v.xyz", MediaKind::Video), "video/mp4");
        assert_eq!(mime_for_url("no-extension", MediaKind::Video), "video/mp4");
    }
}
