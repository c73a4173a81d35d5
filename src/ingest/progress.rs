use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::*;

/// A progress bar in the house style: `Headers (XOVER): [####....]  50% (2/4)`
///
/// Progress goes to stdout; diagnostics go to the log sink on stderr, so the
/// two never interleave on the same stream.
pub(crate) fn bar(label: &str, total: u64, width: u16) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stdout());
    let template = format!(
        "{}: [{{bar:{}}}] {{percent:>3}}% ({{pos}}/{{len}})",
        label, width
    );
    match ProgressStyle::with_template(&template) {
        Ok(style) => pb.set_style(style.progress_chars("#.")),
        Err(e) => warn!("progress template rejected, using default style: {}", e),
    }
    pb
}
