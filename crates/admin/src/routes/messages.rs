//! Contact message inbox.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use appy_link_core::catalog::ContactMessage;

use super::views::{PageChrome, format_datetime};
use crate::db::MessageRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireView;
use crate::state::AppState;

/// Messages shown per page load.
const INBOX_LIMIT: i64 = 200;

#[derive(Debug, Clone)]
pub struct MessageView {
    pub name: String,
    pub email: String,
    pub message: String,
    pub received: String,
}

impl From<ContactMessage> for MessageView {
    fn from(message: ContactMessage) -> Self {
        Self {
            received: format_datetime(&message.created_at),
            name: message.name,
            email: message.email,
            message: message.message,
        }
    }
}

/// Inbox page template.
#[derive(Template, WebTemplate)]
#[template(path = "messages.html")]
pub struct MessagesTemplate {
    pub chrome: PageChrome,
    pub messages: Vec<MessageView>,
}

/// Newest messages first.
///
/// GET /messages
#[instrument(skip_all)]
pub async fn index(
    RequireView(admin): RequireView,
    State(state): State<AppState>,
    session: Session,
) -> Result<MessagesTemplate> {
    let messages = MessageRepository::new(state.pool())
        .list_recent(INBOX_LIMIT)
        .await?
        .into_iter()
        .map(MessageView::from)
        .collect();

    Ok(MessagesTemplate {
        chrome: PageChrome::load(&session, &admin, "/messages").await,
        messages,
    })
}
