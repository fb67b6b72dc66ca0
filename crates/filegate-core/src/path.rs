//! Remote path helpers.

/// Canonicalise a raw folder path.
///
/// Backslashes become `/`, empty and whitespace-only segments are dropped,
/// the remaining segments are trimmed and re-joined with a single `/`. The
/// result is rooted at `/` unless it already starts with `./` or `../`.
///
/// ```
/// use filegate_core::path::normalize;
///
/// assert_eq!(normalize(""), "/");
/// assert_eq!(normalize("a\\b/./c"), "/a/b/./c");
/// assert_eq!(normalize("../x"), "../x");
/// ```
pub fn normalize(raw: &str) -> String {
    let joined = raw
        .replace('\\', "/")
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if joined.starts_with('/') || joined.starts_with("./") || joined.starts_with("../") {
        joined
    } else {
        format!("/{}", joined)
    }
}

/// Append `name` to `parent` with exactly one separator between them.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Every intermediate path of `path`, root to leaf (`/a/b` → `/a`, `/a/b`).
///
/// `.` and `..` segments are carried into the following prefixes but never
/// yielded on their own.
pub fn segment_prefixes(path: &str) -> Vec<String> {
    let mut current = if path.starts_with('/') {
        String::from("/")
    } else {
        String::new()
    };
    let mut prefixes = Vec::new();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !current.is_empty() && !current.ends_with('/') {
            current.push('/');
        }
        current.push_str(segment);
        if segment != "." && segment != ".." {
            prefixes.push(current.clone());
        }
    }

    prefixes
}

/// Last segment of a remote path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
