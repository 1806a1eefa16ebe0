use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use shiftsync_core::MessageQuery;

const TICKS: &[&str] = &["◐", "◓", "◑", "◒", "●"];

/// Spinner on stderr while the mailbox and calendar are being read.
///
/// Draws nothing when stderr is not a terminal, so piped output stays clean.
pub struct LookupSpinner {
    bar: ProgressBar,
}

impl LookupSpinner {
    pub fn start(query: &MessageQuery, calendar_id: &str) -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_message(lookup_message(query, calendar_id));
        bar.enable_steady_tick(Duration::from_millis(120));
        LookupSpinner { bar }
    }

    /// Spins until `work` completes, then clears the line.
    pub async fn around<F: Future>(self, work: F) -> F::Output {
        let output = work.await;
        self.bar.finish_and_clear();
        output
    }
}

fn lookup_message(query: &MessageQuery, calendar_id: &str) -> String {
    format!("Reading {query} and checking calendar '{calendar_id}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_mailbox_query_and_calendar() {
        let query = MessageQuery {
            sender: Some("schedules@example.com".into()),
            subject: None,
            lookback_days: 7,
        };

        assert_eq!(
            lookup_message(&query, "primary"),
            "Reading messages from 'schedules@example.com' in the last 7 days and checking calendar 'primary'"
        );
    }

    #[tokio::test]
    async fn returns_the_wrapped_result() {
        let query = MessageQuery {
            sender: None,
            subject: None,
            lookback_days: 7,
        };

        let value = LookupSpinner::start(&query, "primary").around(async { 42 }).await;

        assert_eq!(value, 42);
    }
}
