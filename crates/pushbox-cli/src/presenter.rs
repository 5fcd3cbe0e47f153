use pushbox_application::{InboxPresenter, StatusMessage};
use pushbox_core::InboxSnapshot;
use std::io::Write;

/// Prints the inbox as a two-column table on stdout and status lines on stderr.
pub struct TextPresenter;

impl TextPresenter {
    pub fn format_table(snapshot: &InboxSnapshot) -> String {
        let mut out = String::new();
        out.push_str(&format!("{:<48} {}\n", "Notifications", "Remove"));
        if snapshot.is_empty() {
            out.push_str("(empty)\n");
        }
        for record in snapshot.iter() {
            let summary = format!("{}: {}", record.title, record.body);
            out.push_str(&format!("{:<48} [x {}]\n", summary, record.seqno));
        }
        out
    }
}

impl InboxPresenter for TextPresenter {
    fn render(&self, snapshot: &InboxSnapshot) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout only loses the view, not the inbox.
        let _ = writeln!(stdout, "{}", Self::format_table(snapshot));
    }

    fn report(&self, status: &StatusMessage) {
        match status {
            StatusMessage::Info(message) => eprintln!("{message}"),
            StatusMessage::Error(message) => eprintln!("error: {message}"),
        }
    }
}
