//! `file://` URI construction for document and workspace paths.

use std::path::{Path, PathBuf};

/// Converts a filesystem path into the `file://` URI form sent to servers.
///
/// Backslashes become forward slashes, a leading drive letter is upper-cased
/// and rendered as `file:///C:/...`, and only spaces are percent-encoded.
/// Inputs that already carry a `file://` scheme are not prefixed again.
#[must_use]
pub fn path_to_file_uri(path: &str) -> String {
    let normalised = path.replace('\\', "/");
    let mut chars = normalised.chars();
    let prefixed = match (chars.next(), chars.next()) {
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic() => {
            format!("file:///{}{}", drive.to_ascii_uppercase(), &normalised[1..])
        }
        _ if normalised.starts_with("file://") => normalised,
        _ => format!("file://{normalised}"),
    };
    prefixed.replace(' ', "%20")
}

/// Same as [`path_to_file_uri`] for a [`Path`].
#[must_use]
pub fn file_uri(path: &Path) -> String {
    path_to_file_uri(&path.to_string_lossy())
}

/// Derives a workspace root from a document path: its containing directory.
///
/// A bare file name lives in the current directory, so it yields `.`.
#[must_use]
pub fn workspace_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
