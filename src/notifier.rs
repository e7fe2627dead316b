use lettre::message::header::ContentType;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, warn};

use crate::config::NotifyConfig;
use crate::pipeline::report::RunReport;

/// Delivers the end-of-run status message to the operator distribution
/// list. Implementations must never raise: a failed notification is logged
/// and swallowed, not escalated to a pipeline failure.
pub trait Notifier {
    fn notify(&self, report: &RunReport);
}

/// Sends the status mail through the configured relay, plain SMTP, the way
/// an internal mail host expects.
pub struct EmailNotifier {
    config: NotifyConfig,
}

impl EmailNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self { config }
    }

    fn build_body(report: &RunReport) -> String {
        let mut body = if report.is_clean() {
            String::from("Parcel update successful\r\nReady to copy to sde\r\n\r\n")
        } else {
            String::from("Parcel update finished with errors\r\nReview before copying to sde\r\n\r\n")
        };
        body.push_str(&report.to_string());
        body
    }

    fn send(&self, report: &RunReport) -> anyhow::Result<()> {
        let mut builder = Message::builder()
            .from(self.config.sender.parse()?)
            .subject("Parcel Update")
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.config.recipients {
            builder = builder.to(recipient.parse()?);
        }
        let message = builder.body(Self::build_body(report))?;

        let mailer = SmtpTransport::builder_dangerous(self.config.relay.as_str()).build();
        mailer.send(&message)?;
        Ok(())
    }
}

impl Notifier for EmailNotifier {
    fn notify(&self, report: &RunReport) {
        match self.send(report) {
            Ok(()) => info!(recipients = self.config.recipients.len(), "Status mail sent"),
            Err(e) => warn!(error = %e, "Status mail not sent"),
        }
    }
}

/// Notifier that only logs, for runs where no relay is reachable (tests,
/// dry runs).
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, report: &RunReport) {
        info!(clean = report.is_clean(), "Run complete\n{report}");
    }
}
