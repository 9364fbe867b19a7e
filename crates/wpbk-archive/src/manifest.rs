//! # Manifests and Entry Names
//!
//! Every archive ends with `manifest.txt` (the files that made it in) and,
//! when anything was left out, `manifest-skip.txt`. Both hold the paths
//! as double-quoted strings joined by commas: `"a.txt","b/c.txt"`.
//! Quotes and backslashes inside a path are escaped JSON-style so the list
//! can always be split back unambiguously.

/// Entry listing the paths that were added.
pub const MANIFEST_ENTRY: &str = "manifest.txt";

/// Entry listing the paths that were skipped.
pub const MANIFEST_SKIP_ENTRY: &str = "manifest-skip.txt";

/// True when `entry` would collide with a manifest entry.
pub fn is_reserved_entry(entry: &str) -> bool {
    entry == MANIFEST_ENTRY || entry == MANIFEST_SKIP_ENTRY
}

/// Render a path list in manifest format.
pub fn render_manifest(paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| serde_json::Value::from(p.as_str()).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Strip leading `/` and `\` so the path joins under the root instead of
/// replacing it. `..` segments are left alone.
pub fn strip_leading_separators(path: &str) -> &str {
    path.trim_start_matches(['/', '\\'])
}

/// Archive entry name for a relative path: leading separators stripped,
/// backslashes normalized to `/`.
pub fn entry_name(relative: &str) -> String {
    strip_leading_separators(relative).replace('\\', "/")
}
