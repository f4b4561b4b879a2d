use base64::{engine::general_purpose, Engine as _};
use rand::Rng;

use crate::services::probe::Orientation;

/// File extension implied by a declared media type.
pub fn media_ext(media_type: &str) -> &'static str {
    match media_type {
        "video/mp4" => "mp4",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        _ => "bin",
    }
}

/// Random, URL-safe base name for a stored object.
pub fn random_base_name() -> String {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill(&mut random_bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Keys are prefixed with the orientation tag so related variants stay
/// discoverable by convention: `landscape/<base>.mp4`.
pub fn video_object_key(orientation: Orientation, base: &str, media_type: &str) -> String {
    format!("{}/{}.{}", orientation.as_str(), base, media_ext(media_type))
}

pub fn thumbnail_object_key(base: &str, media_type: &str) -> String {
    format!("thumbnails/{}.{}", base, media_ext(media_type))
}

/// Best-effort extraction of the object key from a stored public URL,
/// handling both path-style (`<endpoint>/<bucket>/<key>`) and
/// virtual-hosted (`https://<bucket>.s3.<region>.amazonaws.com/<key>`)
/// addressing.
pub fn key_from_object_url(url_str: &str, bucket: &str) -> Option<String> {
    if let Some(idx) = url_str.find(&format!("/{}/", bucket)) {
        return Some(url_str[idx + bucket.len() + 2..].to_string());
    }

    let url = url::Url::parse(url_str).ok()?;
    let key = url.path().trim_start_matches('/');
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_keys_are_deterministic() {
        let a = video_object_key(Orientation::Landscape, "abc123", "video/mp4");
        let b = video_object_key(Orientation::Landscape, "abc123", "video/mp4");
        assert_eq!(a, b);
        assert_eq!(a, "landscape/abc123.mp4");
    }

    #[test]
    fn orientation_tag_prefixes_the_key() {
        assert_eq!(
            video_object_key(Orientation::Portrait, "x", "video/mp4"),
            "portrait/x.mp4"
        );
        assert_eq!(
            video_object_key(Orientation::Other, "x", "video/mp4"),
            "other/x.mp4"
        );
    }

    #[test]
    fn thumbnail_keys_carry_the_image_extension() {
        assert_eq!(thumbnail_object_key("x", "image/jpeg"), "thumbnails/x.jpg");
        assert_eq!(thumbnail_object_key("x", "image/png"), "thumbnails/x.png");
    }

    #[test]
    fn base_names_are_distinct() {
        assert_ne!(random_base_name(), random_base_name());
    }

    #[test]
    fn key_extraction_handles_both_url_styles() {
        assert_eq!(
            key_from_object_url("http://localhost:9000/clips/landscape/a.mp4", "clips"),
            Some("landscape/a.mp4".to_string())
        );
        assert_eq!(
            key_from_object_url(
                "https://clips.s3.us-east-1.amazonaws.com/portrait/b.mp4",
                "clips"
            ),
            Some("portrait/b.mp4".to_string())
        );
        assert_eq!(key_from_object_url("not a url", "clips"), None);
    }
}
