use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, warn};

use crate::controller::{Notification, APP_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Critical,
}

impl Urgency {
    fn as_arg(self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

/// Shows a desktop notification through `notify-send` without blocking the
/// caller. Delivery failures are only logged.
pub fn send(notification: &Notification, urgency: Urgency) {
    let args = notify_args(notification, urgency);

    thread::spawn(move || {
        let result = Command::new("notify-send")
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match result {
            Ok(status) if status.success() => debug!("notification delivered"),
            Ok(status) => warn!("notify-send exited with {}", status),
            Err(e) => warn!("failed to run notify-send: {}", e),
        }
    });
}

fn notify_args(notification: &Notification, urgency: Urgency) -> Vec<String> {
    vec![
        "--app-name".to_string(),
        APP_NAME.to_string(),
        "--urgency".to_string(),
        urgency.as_arg().to_string(),
        notification.title.clone(),
        notification.body.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_body_are_last() {
        let args = notify_args(
            &Notification {
                title: "Recording Stopped".to_string(),
                body: "File saved: a.mp4".to_string(),
            },
            Urgency::Critical,
        );
        assert_eq!(args[3], "critical");
        assert_eq!(args[4], "Recording Stopped");
        assert_eq!(args[5], "File saved: a.mp4");
    }
}
