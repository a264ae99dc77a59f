//! Mail delivery through a local `sendmail`.

use std::{path::PathBuf, sync::Arc};

use bank_core::{CollaboratorError, Notifier};

use crate::slurm::CommandRunner;

/// Pipes an RFC 822 message to `sendmail -t -oi`.
pub struct SendmailNotifier {
    runner: Arc<dyn CommandRunner>,
    sendmail: PathBuf,
    sender: String,
}

impl SendmailNotifier {
    pub fn new(runner: Arc<dyn CommandRunner>, sendmail: PathBuf, sender: String) -> Self {
        Self {
            runner,
            sendmail,
            sender,
        }
    }

    fn message(&self, recipient: &str, subject: &str, body: &str) -> String {
        format!(
            "From: {}\nTo: {}\nSubject: {}\n\n{}",
            self.sender, recipient, subject, body
        )
    }
}

impl Notifier for SendmailNotifier {
    fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), CollaboratorError> {
        let args = vec!["-t".to_string(), "-oi".to_string()];
        let message = self.message(recipient, subject, body);
        self.runner
            .run_with_input(&self.sendmail, &args, &message)
            .map(|_| ())
            .map_err(|err| CollaboratorError::Delivery(format!("{recipient}: {err}")))
    }
}
