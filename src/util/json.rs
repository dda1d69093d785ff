use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// JSON output style
pub enum JsonStyle {
    /// Compact one-line JSON
    Compact,
    /// Pretty printed (indented) JSON
    Pretty,
}

/// Save a serializable report to `out_path`, creating missing parent directories.
pub fn save_json_output<T: Serialize>(data: &T, out_path: &Path, style: JsonStyle) -> Result<()> {
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let file =
        File::create(out_path).with_context(|| format!("create {}", out_path.display()))?;
    let mut writer = BufWriter::new(file);
    match style {
        JsonStyle::Compact => serde_json::to_writer(&mut writer, data)?,
        JsonStyle::Pretty => serde_json::to_writer_pretty(&mut writer, data)?,
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
