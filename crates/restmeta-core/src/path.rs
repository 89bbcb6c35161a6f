//! Route fragment normalization.

/// Canonical form of a route fragment: no leading, trailing or repeated
/// slashes, and `:name` segments rewritten to `{name}`.
///
/// ```
/// use restmeta_core::path::normalize_path;
///
/// assert_eq!(normalize_path("//people/:id/"), "people/{id}");
/// assert_eq!(normalize_path(&normalize_path("/a//b")), "a/b");
/// ```
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{}}}", name),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Absolute path of a method: controller path joined with the method's
/// fragment, always starting with a single `/`.
pub fn compose_path(controller_path: &str, method_path: &str) -> String {
    format!(
        "/{}",
        normalize_path(&format!("{}/{}", controller_path, method_path))
    )
}

/// Names of the `{name}` placeholders of a path, in order.
pub fn path_placeholders(path: &str) -> Vec<&str> {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(.+?)\}").unwrap());

    PLACEHOLDER
        .captures_iter(path)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}
