//! View types shared by the signed-in admin pages.

use chrono::{DateTime, Utc};
use tower_sessions::Session;

use crate::middleware::take_flash;
use crate::models::{CurrentAdmin, Flash};

/// Signed-in account as shown in the header and used to hide actions the
/// role cannot take.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub email: String,
    pub role: String,
    pub can_moderate: bool,
    pub can_edit: bool,
    pub can_manage: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            email: admin.email.to_string(),
            role: admin.role_label(),
            can_moderate: admin.authorization.can_moderate(),
            can_edit: admin.authorization.can_edit_providers(),
            can_manage: admin.authorization.can_manage_catalog(),
        }
    }
}

/// Everything the admin layout needs besides the page body.
#[derive(Debug, Clone)]
pub struct PageChrome {
    pub admin_user: AdminUserView,
    /// Section path, used to highlight the active nav link.
    pub current_path: &'static str,
    pub flash: Option<Flash>,
}

impl PageChrome {
    /// Build the chrome for `admin`, consuming any pending flash notice.
    pub async fn load(session: &Session, admin: &CurrentAdmin, current_path: &'static str) -> Self {
        Self {
            admin_user: AdminUserView::from(admin),
            current_path,
            flash: take_flash(session).await,
        }
    }
}

/// `1 Mar 2026 14:05`, in UTC.
#[must_use]
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.format("%-d %b %Y %H:%M").to_string()
}

/// `2026-03-01`, the value format of a date input.
#[must_use]
pub fn format_date_input(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d").to_string()
}
