//! Line-oriented rendering.
//!
//! A terminal scrolls, so rendering is incremental: [`Transcript`] remembers
//! what it already printed and [`Transcript::update`] returns only the new
//! lines for the current App state.

use parlor_app::{App, ChatView, ViewId, ViewStatus};
use parlor_proto::ChatMessage;

/// What has been printed so far.
#[derive(Debug, Default)]
pub struct Transcript {
    view: Option<ViewId>,
    label: String,
    status: Option<ViewStatus>,
    printed: usize,
    placeholder_shown: bool,
    typing: Option<String>,
    notice: Option<String>,
    online: Vec<String>,
    app_status: Option<String>,
}

impl Transcript {
    /// Nothing printed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print to bring the terminal up to date with `app`.
    pub fn update(&mut self, app: &App) -> Vec<String> {
        let mut lines = Vec::new();

        let app_status = app.status_message().map(str::to_string);
        if app_status != self.app_status {
            if let Some(status) = &app_status {
                lines.push(format!("* {status}"));
            }
            self.app_status = app_status;
        }

        let Some(view) = app.view() else {
            if self.view.take().is_some() {
                lines.push("* chat closed".to_string());
            }
            return lines;
        };

        if self.view != Some(view.id) {
            self.start(view);
            lines.push(format!("=== To: {} ===", view.partner_label));
        } else if self.label != view.partner_label {
            self.label.clone_from(&view.partner_label);
            lines.push(format!("=== To: {} ===", view.partner_label));
        }

        if self.status.as_ref() != Some(&view.status) {
            self.status = Some(view.status.clone());
            lines.push(status_line(&view.status));
        }

        if view.placeholder_count() > 0 && !self.placeholder_shown {
            self.placeholder_shown = true;
            lines.push("  (no messages yet)".to_string());
        }

        for message in view.messages().iter().skip(self.printed) {
            lines.push(message_line(message));
        }
        self.printed = view.messages().len();

        let online: Vec<String> = view.active_users.iter().map(|u| u.nickname.clone()).collect();
        if online != self.online {
            lines.push(format!("* online: {}", online.join(", ")));
            self.online = online;
        }

        if view.typing != self.typing {
            if let Some(name) = &view.typing {
                lines.push(format!("* {name} is typing..."));
            }
            self.typing.clone_from(&view.typing);
        }

        if view.notice != self.notice {
            if let Some(notice) = &view.notice {
                lines.push(format!("! {notice}"));
            }
            self.notice.clone_from(&view.notice);
        }

        lines
    }

    fn start(&mut self, view: &ChatView) {
        *self = Self {
            view: Some(view.id),
            label: view.partner_label.clone(),
            app_status: self.app_status.take(),
            ..Self::default()
        };
    }
}

fn status_line(status: &ViewStatus) -> String {
    match status {
        ViewStatus::Resolving => "* finding chat...".to_string(),
        ViewStatus::LoadingHistory => "* loading history...".to_string(),
        ViewStatus::Connecting => "* connecting...".to_string(),
        ViewStatus::Live => "* connected".to_string(),
        ViewStatus::Offline { reason } => format!("* disconnected: {reason}"),
        ViewStatus::Failed { error } => format!("! {error}"),
    }
}

fn message_line(message: &ChatMessage) -> String {
    format!(
        "[{}] {}: {}",
        message.created_at.format("%Y-%m-%d %H:%M"),
        message.sender.nickname,
        message.content
    )
}
