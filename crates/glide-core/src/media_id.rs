//! Provider video id extraction from arbitrary source URLs

use crate::MediaId;
use url::Url;

/// Extract the YouTube video id from a source URL.
///
/// Recognised shapes:
/// - `https://youtu.be/<id>`
/// - `https://www.youtube.com/embed/<id>`
/// - `https://www.youtube.com/v/<id>`
/// - `https://www.youtube.com/watch?v=<id>`
/// - `https://www.youtube.com/watch?feature=share&v=<id>`
///
/// The scheme may be omitted. Returns `None` when nothing matches.
pub fn extract_media_id(source: &str) -> Option<MediaId> {
    let source = source.trim();
    if source.is_empty() {
        return None;
    }

    let url = Url::parse(source)
        .ok()
        .filter(|u| u.has_host())
        .or_else(|| Url::parse(&format!("https://{}", source)).ok())?;

    let host = url.host_str()?.to_ascii_lowercase();
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let candidate = if host == "youtu.be" || host.ends_with(".youtu.be") {
        segments.next().map(str::to_string)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        match segments.next() {
            Some("embed") | Some("v") => segments.next().map(str::to_string),
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            _ => None,
        }
    } else {
        None
    };

    candidate.and_then(|id| MediaId::new(id).ok())
}

/// Canonical watch URL for a media id
pub fn watch_url(id: &MediaId) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}
