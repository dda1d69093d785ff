/// Known RTSP stream paths used by camera vendors
pub const RTSP_PATHS_JSON: &str = include_str!("../../resources/rtsp-paths.json");
