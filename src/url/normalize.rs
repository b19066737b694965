use crate::url::Route;
use crate::{UrlError, UrlResult};
use url::Url;

/// Extensions that identify static resources rather than app routes
const RESOURCE_EXTENSIONS: &[&str] = &[
    "js", "mjs", "css", "map", "json", "xml", "txt", "csv", "pdf", "zip", "gz", "tar", "png",
    "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "bmp", "woff", "woff2", "ttf", "otf",
    "eot", "mp3", "mp4", "webm", "ogg", "wav", "wasm", "webmanifest",
];

/// Normalizes a discovered link into a crawlable route on `origin`
///
/// # Normalization Steps
///
/// 1. Resolve the link against the origin (relative links are allowed)
/// 2. Reject non-HTTP(S) schemes
/// 3. Reject links whose scheme, host or port differ from the origin
/// 4. Remove fragment and query string
/// 5. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes inside the path (a leading `//` is a
///      scheme-relative link and is resolved in step 1)
///    - Remove trailing slash (except for root /)
/// 6. Reject paths that end in a static resource extension
///
/// # Arguments
///
/// * `link` - The link as found on the page (absolute or relative)
/// * `origin` - The origin of the site being crawled
///
/// # Returns
///
/// * `Ok(Route)` - Normalized route, usable as a dedup key
/// * `Err(UrlError)` - The link must not be crawled
///
/// # Examples
///
/// ```
/// use ssr_prerender::url::normalize_route;
/// use url::Url;
///
/// let origin = Url::parse("http://127.0.0.1:1337").unwrap();
/// let route = normalize_route("http://127.0.0.1:1337/about/?tab=1#team", &origin).unwrap();
/// assert_eq!(route.as_str(), "/about");
/// ```
pub fn normalize_route(link: &str, origin: &Url) -> UrlResult<Route> {
    let url = origin
        .join(link.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", link, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.origin() != origin.origin() {
        return Err(UrlError::CrossOrigin(url.to_string()));
    }

    let path = normalize_path(url.path());

    if has_resource_extension(&path) {
        return Err(UrlError::Resource(path));
    }

    Ok(Route::from_normalized(path))
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Checks whether the last path segment carries a static resource extension
fn has_resource_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            RESOURCE_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}
