//! Helpers for the `/`-separated paths used to simulate folders over a flat
//! key namespace.

/// Join a listing path and a relative key into a fully-qualified key.
///
/// `compose_key("", "a.txt") == "a.txt"`, `compose_key("dir1", "a.txt") == "dir1/a.txt"`.
pub fn compose_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", path, key)
    }
}

/// The path one level above `path`, or `""` at the root.
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// One element of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    /// Display name of this segment.
    pub name: String,
    /// Path to list when navigating to this segment.
    pub path: String,
}

/// Cumulative prefixes of `path`, one per segment, root first.
///
/// The root itself is not included; an empty path yields no crumbs.
pub fn breadcrumbs(path: &str) -> Vec<Crumb> {
    if path.is_empty() {
        return Vec::new();
    }

    let mut current = String::new();
    path.split('/')
        .map(|part| {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);
            Crumb {
                name: part.to_string(),
                path: current.clone(),
            }
        })
        .collect()
}

/// Normalize a user-supplied listing path: surrounding slashes are dropped.
pub fn normalize_path(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}
