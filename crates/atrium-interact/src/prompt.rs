//! On-screen interaction prompt seam

/// Where the interaction prompt is displayed.
///
/// The targeting component edge-triggers these: `show` fires once per
/// selection change, `hide` once when selection is lost.
pub trait PromptSink {
    fn show(&mut self, text: &str);
    fn hide(&mut self);
}

/// Prompt sink that writes to the log, for hosts without a UI overlay
pub struct LogPrompt;

impl PromptSink for LogPrompt {
    fn show(&mut self, text: &str) {
        log::info!("prompt: {text}");
    }

    fn hide(&mut self) {
        log::info!("prompt hidden");
    }
}
