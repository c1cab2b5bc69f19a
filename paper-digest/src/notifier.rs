use crate::config::NotificationSection;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Desktop notifications. Uses Notification Center on macOS and the log
/// everywhere else. Never fails the caller.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    enabled: bool,
    sound: String,
    title: String,
}

impl DesktopNotifier {
    pub fn new(enabled: bool, sound: impl Into<String>) -> Self {
        Self {
            enabled,
            sound: sound.into(),
            title: "Paper Digest".to_string(),
        }
    }

    pub fn from_config(section: &NotificationSection) -> Self {
        Self::new(section.enabled, section.sound.clone())
    }

    pub fn disabled() -> Self {
        Self::new(false, "")
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns whether a notification was shown.
    pub async fn notify(&self, message: &str, subtitle: Option<&str>) -> bool {
        if !self.enabled {
            return false;
        }

        if !cfg!(target_os = "macos") {
            match subtitle {
                Some(subtitle) => info!("[NOTIFICATION] {}: {} ({})", self.title, message, subtitle),
                None => info!("[NOTIFICATION] {}: {}", self.title, message),
            }
            return true;
        }

        let script = self.apple_script(message, subtitle);
        let mut cmd = Command::new("osascript");
        cmd.arg("-e").arg(&script).kill_on_drop(true);

        match tokio::time::timeout(NOTIFY_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => true,
            Ok(Ok(output)) => {
                debug!(
                    "osascript exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                false
            }
            Ok(Err(e)) => {
                warn!("Failed to run osascript: {}", e);
                false
            }
            Err(_) => {
                warn!("Notification timed out after {:?}", NOTIFY_TIMEOUT);
                false
            }
        }
    }

    pub fn apple_script(&self, message: &str, subtitle: Option<&str>) -> String {
        let mut script = format!(
            "display notification \"{}\" with title \"{}\"",
            escape_apple_script(message),
            escape_apple_script(&self.title)
        );
        if let Some(subtitle) = subtitle.filter(|s| !s.is_empty()) {
            script.push_str(&format!(" subtitle \"{}\"", escape_apple_script(subtitle)));
        }
        if !self.sound.is_empty() {
            script.push_str(&format!(" sound name \"{}\"", escape_apple_script(&self.sound)));
        }
        script
    }

    pub async fn notify_digest_ready(&self, num_papers: usize, report_path: &Path) -> bool {
        let message = format!("{} papers summarized", num_papers);
        let subtitle = format!("Saved to: {}", report_path.display());
        self.notify(&message, Some(&subtitle)).await
    }

    pub async fn notify_no_papers(&self) -> bool {
        self.notify("No new papers matching your interests today", None)
            .await
    }

    pub async fn notify_error(&self, error_message: &str) -> bool {
        self.notify(&format!("Error: {}", error_message), None).await
    }
}

fn escape_apple_script(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_backslashes() {
        let notifier = DesktopNotifier::new(true, "Glass");
        let script = notifier.apple_script("say \"hi\" \\o/", Some("sub"));
        assert_eq!(
            script,
            "display notification \"say \\\"hi\\\" \\\\o/\" with title \"Paper Digest\" \
             subtitle \"sub\" sound name \"Glass\""
        );
    }

    #[tokio::test]
    async fn disabled_notifier_shows_nothing() {
        assert!(!DesktopNotifier::disabled().notify("hello", None).await);
    }
}
