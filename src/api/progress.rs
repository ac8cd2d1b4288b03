use indicatif::{ProgressBar, ProgressStyle};

/// Byte progress for a download: a bar when the length is known, a spinner
/// otherwise. Hidden unless `visible`.
pub(crate) fn download_bar(total: Option<u64>, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    match total {
        Some(len) => {
            let bar = ProgressBar::new(len);
            if let Ok(style) = ProgressStyle::with_template(
                "[{elapsed_precise}] {wide_bar} {bytes}/{total_bytes} ({bytes_per_sec})",
            ) {
                bar.set_style(style);
            }
            bar
        }
        None => {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {bytes} received") {
                spinner.set_style(style);
            }
            spinner
        }
    }
}
