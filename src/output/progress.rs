use indicatif::{ProgressState, ProgressStyle};
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

const BAR_TEMPLATE: &str =
    "{spinner:.green} {msg:<12} [{elapsed_hms_ms}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Progress bar style shared by the port scan and the probe stage.
pub fn get_progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("elapsed_hms_ms", elapsed_hms_ms)
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
        .progress_chars("#>-")
}

/// Attach a progress bar of `len` steps to `span` and start it.
pub fn start_progress(span: &Span, message: &'static str, len: usize) {
    span.pb_set_style(&get_progress_style());
    span.pb_set_message(message);
    span.pb_set_length(len as u64);
    span.pb_set_position(0);
    span.pb_start();
}

fn elapsed_hms_ms(state: &ProgressState, writer: &mut dyn std::fmt::Write) {
    let elapsed = state.elapsed();
    let secs = elapsed.as_secs();
    let _ = write!(
        writer,
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        elapsed.subsec_millis()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses() {
        assert!(ProgressStyle::default_bar().template(BAR_TEMPLATE).is_ok());
    }
}
