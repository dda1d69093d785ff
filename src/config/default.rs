/// Default target address specification
pub const DEFAULT_ADDRESS: &str = "192.168.2.0/24";
/// Default RTSP ports to discover
pub const DEFAULT_PORTS: &str = "554,8554";
/// Default per-attempt capture timeout in seconds
pub const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 10;
/// Default number of capture attempts per candidate (first attempt included)
pub const DEFAULT_RETRIES: u32 = 2;
/// Default substitute for '.' in displayed camera IP addresses
pub const DEFAULT_WHITESPACE: char = '-';
/// Default credential list. "none" embeds no credential.
pub const DEFAULT_CREDS: &str = "none";
/// Credential sentinel meaning "no credential in the URL"
pub const NO_CREDENTIAL: &str = "none";
/// Default frame-capture executable
pub const DEFAULT_FFMPEG_BIN: &str = "ffmpeg";
/// Default number of capture processes running at once
pub const DEFAULT_PROBE_CONCURRENCY: usize = 16;
/// Default number of capture processes per host at once
pub const DEFAULT_HOST_CONCURRENCY: usize = 2;
/// Default concurrency for port discovery
pub const DEFAULT_PORTS_CONCURRENCY: usize = 100;
/// Default TCP connect timeout for port discovery in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1000;
/// Thumbnail height in pixels
pub const THUMBNAIL_HEIGHT: u32 = 180;
/// Thumbnail aspect ratio (width / height)
pub const THUMBNAIL_RATIO: f64 = 1.777777778;
/// Log file name in the per-user directory
pub const DEFAULT_LOG_FILE_NAME: &str = "rtspscan.log";
