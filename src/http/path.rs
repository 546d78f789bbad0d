//! Request path translation
//!
//! Maps a URL path onto the serving root without ever leaving it.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Translate a request path into a filesystem path under `root`.
///
/// Query string and fragment are dropped, the path is percent-decoded, and
/// empty, `.` and `..` segments as well as segments the platform would read
/// as a separator or drive prefix are discarded before joining onto the root.
pub fn translate_path(root: &Path, request_path: &str) -> PathBuf {
    let path = request_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    decoded
        .split('/')
        .filter(|segment| is_plain_segment(segment))
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !has_path_syntax(segment)
}

/// Backslashes and drive prefixes only mean something to Windows paths
#[cfg(windows)]
fn has_path_syntax(segment: &str) -> bool {
    segment.contains(['/', '\\', ':'])
}

#[cfg(not(windows))]
fn has_path_syntax(segment: &str) -> bool {
    segment.contains('/')
}

/// Percent-decoded form of a request path, for display
pub fn decode_for_display(request_path: &str) -> String {
    percent_decode_str(request_path)
        .decode_utf8_lossy()
        .into_owned()
}
