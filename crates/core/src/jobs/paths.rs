//! Path normalization for comparing job source and destination
//!
//! Separators are unified to `/`, relative paths resolve against the current
//! directory, `.` and `..` collapse, trailing separators are dropped (except
//! on a bare root such as `/` or `c:/`) and the result is lowercased.
//! Drive-letter paths (`C:\Data`) count as absolute.

use std::path::Path;

pub fn normalize_for_comparison(raw: &str) -> String {
    normalize_with_base(raw, &std::env::current_dir().unwrap_or_default())
}

pub fn normalize_with_base(raw: &str, base: &Path) -> String {
    let unified = raw.trim().replace('\\', "/");

    let absolute = if is_absolute(&unified) {
        unified
    } else {
        let base = base.to_string_lossy().replace('\\', "/");
        format!("{}/{}", base.trim_end_matches('/'), unified)
    };

    let (prefix, rest) = split_root(&absolute);
    let mut parts: Vec<&str> = Vec::new();
    for part in rest.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }

    format!("{prefix}/{}", parts.join("/")).to_lowercase()
}

/// Same location after normalization.
pub fn are_equivalent(source: &str, destination: &str) -> bool {
    normalize_for_comparison(source) == normalize_for_comparison(destination)
}

/// Destination strictly inside source.
pub fn is_nested_within(source: &str, destination: &str) -> bool {
    let source = normalize_for_comparison(source);
    let destination = normalize_for_comparison(destination);
    if source == destination {
        return false;
    }
    // A root source already ends with the separator
    if source.ends_with('/') {
        destination.starts_with(&source)
    } else {
        destination.starts_with(&format!("{source}/"))
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || has_drive_letter(path)
}

fn has_drive_letter(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn split_root(path: &str) -> (&str, &str) {
    if has_drive_letter(path) {
        path.split_at(2)
    } else {
        ("", path)
    }
}
