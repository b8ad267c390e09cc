//! Anti-automation guards for the public forms.
//!
//! Two cheap checks run before a submission is validated or stored:
//!
//! 1. A honeypot field hidden from humans. Any value in it means a bot
//!    filled the form, and the request is dropped without feedback.
//! 2. A per-visitor cooldown between successful submissions of the same
//!    form.
//!
//! Neither is a security boundary; the per-IP rate limiter in front of the
//! servers handles volume.

use chrono::{DateTime, Duration, Utc};

/// Default wait between two submissions of the same form.
pub const DEFAULT_COOLDOWN_SECS: i64 = 30;

/// Name of the hidden honeypot input on every public form.
pub const HONEYPOT_FIELD: &str = "company_website";

/// Which public form is being submitted. Each has its own cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Submission,
    Contact,
}

impl FormKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::Contact => "contact",
        }
    }
}

/// Verdict of [`Cooldown::check`] combined with the honeypot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Proceed,
    /// Honeypot tripped. Do nothing and show nothing.
    DropSilently,
    /// Too soon after the last submission.
    Throttled { remaining_secs: i64 },
}

impl GuardOutcome {
    /// Visitor-facing message for a throttled attempt.
    #[must_use]
    pub fn message(self) -> Option<String> {
        match self {
            Self::Throttled { remaining_secs } => Some(format!(
                "Please wait {remaining_secs} seconds before submitting again."
            )),
            Self::Proceed | Self::DropSilently => None,
        }
    }
}

/// Returns `true` when the honeypot carries anything besides whitespace.
#[must_use]
pub fn honeypot_tripped(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Fixed-window cooldown keyed on the last successful submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    window: Duration,
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::from_secs(DEFAULT_COOLDOWN_SECS)
    }
}

impl Cooldown {
    #[must_use]
    pub fn from_secs(secs: i64) -> Self {
        Self {
            window: Duration::seconds(secs),
        }
    }

    /// Seconds left before another submission is allowed, rounded up.
    /// `None` when the window has elapsed or nothing was submitted yet.
    #[must_use]
    pub fn remaining(
        &self,
        last_submitted: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<i64> {
        let last = last_submitted?;
        let left = last + self.window - now;
        if left <= Duration::zero() {
            return None;
        }
        let millis = left.num_milliseconds();
        Some((millis + 999) / 1000)
    }

    /// Run both guards. The honeypot is checked first so bots never learn
    /// about the cooldown.
    #[must_use]
    pub fn check(
        &self,
        honeypot: Option<&str>,
        last_submitted: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> GuardOutcome {
        if honeypot_tripped(honeypot) {
            return GuardOutcome::DropSilently;
        }
        match self.remaining(last_submitted, now) {
            Some(remaining_secs) => GuardOutcome::Throttled { remaining_secs },
            None => GuardOutcome::Proceed,
        }
    }
}
