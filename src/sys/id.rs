use uuid::Uuid;

/// Get a random identifier for one probe attempt
pub fn get_probe_id() -> String {
    let id = Uuid::new_v4();
    id.simple().to_string()
}
