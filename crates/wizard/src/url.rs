/// Prefix of `path` in front of `slug`, so a sibling step URL is `base + other_slug`.
///
/// One trailing `/` on `path` is ignored: `/wizard/address/` and `/wizard/address`
/// both give `/wizard/`. Callers must make sure `slug` occurs in `path`; otherwise the
/// path comes back unchanged.
pub fn url_base(path: &str, slug: &str) -> String {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    match trimmed.rfind(slug) {
        Some(index) if !slug.is_empty() => trimmed[..index].to_string(),
        _ => path.to_string(),
    }
}

pub(crate) fn with_trailing_separator(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

#[cfg(test)]
#[path = "tests/url_tests.rs"]
mod tests;
