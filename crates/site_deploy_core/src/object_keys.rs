use std::path::{Component, Path};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectKeyError {
    #[error("{path} is not below the site root")]
    OutsideRoot { path: String },

    #[error("{path} has a name that is not valid UTF-8")]
    NonUtf8 { path: String },
}

/// Derives the object key for `path` as its location relative to `root`,
/// with components joined by forward slashes regardless of platform.
///
/// Names that are not valid UTF-8 are rejected rather than converted, so two
/// distinct files can never share a key.
pub fn object_key_for(root: &Path, path: &Path) -> Result<String, ObjectKeyError> {
    let outside = || ObjectKeyError::OutsideRoot {
        path: path.display().to_string(),
    };
    let relative = path.strip_prefix(root).map_err(|_| outside())?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                let segment = segment.to_str().ok_or_else(|| ObjectKeyError::NonUtf8 {
                    path: path.display().to_string(),
                })?;
                segments.push(segment);
            }
            Component::CurDir => {}
            _ => return Err(outside()),
        }
    }

    if segments.is_empty() {
        return Err(outside());
    }
    Ok(segments.join("/"))
}
