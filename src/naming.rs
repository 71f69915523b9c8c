//! Slug rules shared by the catalog and the reconciler.
//!
//! A campaign slug is used verbatim twice: as the public URL path segment
//! (`/<slug>/`) and as the output directory name (`<root>/<slug>/`). Both
//! uses require a single, plain path segment:
//!
//! - `"ruido"`, `"parques-2024"`, `"zona_norte"`, `"encuesta.2024"` → safe
//! - `""`, `"."`, `".."`, `".git"`, `"~ruido"` → unsafe (empty, or leading `.`/`~`)
//! - `"a..b"`, `"fin."` → unsafe (contains `..` or ends with `.`)
//! - `"a/b"`, `"a\\b"` → unsafe (more than one segment)
//! - `"ruido "`, `"piñón"` → unsafe (not URL-safe without escaping)

/// Whether `slug` can name both a URL segment and an output directory.
pub fn is_safe_slug(slug: &str) -> bool {
    let mut chars = slug.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    is_plain(first)
        && chars.all(|c| is_plain(c) || c == '.' || c == '~')
        && !slug.contains("..")
        && !slug.ends_with('.')
}

fn is_plain(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Whether a top-level directory name is hidden (dot-prefixed).
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
