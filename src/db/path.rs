use std::sync::OnceLock;

use crate::config;

static PATH_CATALOG: OnceLock<Vec<String>> = OnceLock::new();

/// Get the built-in RTSP stream path catalog, in probe order.
pub fn path_catalog() -> &'static [String] {
    PATH_CATALOG.get_or_init(|| {
        serde_json::from_str(config::db::RTSP_PATHS_JSON).expect("Invalid rtsp-paths.json format")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_complete() {
        let paths = path_catalog();
        assert_eq!(paths.len(), 46);
        assert_eq!(paths[0], "/Streaming/Channels/101");
        assert!(paths.iter().any(|p| p.is_empty()));
        assert!(paths.iter().any(|p| p == "/"));
    }

    #[test]
    fn paths_are_absolute_or_empty() {
        for p in path_catalog() {
            assert!(p.is_empty() || p.starts_with('/'), "bad path: {p}");
        }
    }
}
