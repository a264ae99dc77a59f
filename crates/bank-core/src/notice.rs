//! Rendering of notices into deliverable messages.

use bank_domain::Notice;

/// Subject and body ready for a [`crate::Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotice {
    pub subject: String,
    pub body: String,
}

/// Site-specific wording for notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeTemplate {
    pub site_name: String,
    pub signature: String,
    pub default_grant: u64,
}

impl NoticeTemplate {
    pub fn render(&self, notice: &Notice) -> RenderedNotice {
        let message = match notice {
            Notice::LimitReached { period_start } => format!(
                "Your allocation on {} has run out of SUs. The one-year allocation started on {}.",
                self.site_name, period_start
            ),
            Notice::NearLimit {
                percent,
                period_start,
            } => format!(
                "Your allocation on {} is at {}% usage. The one-year allocation started on {}.",
                self.site_name, percent, period_start
            ),
            Notice::UpcomingRollover { end_date } => format!(
                "Your proposal on cluster {} will reset and {} SUs will be added to your account on {}.",
                self.site_name, self.default_grant, end_date
            ),
        };
        RenderedNotice {
            subject: format!("Your allocation on {}", self.site_name),
            body: format!(
                "To Whom it May Concern,\n\n{message}\n\nThanks,\n\n{}\n",
                self.signature
            ),
        }
    }
}
