use std::path::Path;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Infers the MIME type of an object from its file extension alone.
///
/// Unrecognised or missing extensions fall back to [`DEFAULT_CONTENT_TYPE`].
pub fn content_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|extension| extension.to_str())
        .and_then(|extension| {
            mime_guess::from_ext(&extension.to_ascii_lowercase()).first_raw()
        })
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
