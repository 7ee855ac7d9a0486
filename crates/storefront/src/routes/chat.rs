//! Shopping assistant page.
//!
//! The conversation lives in the session so it survives navigation. The
//! assistant never fails the page: errors become the fixed apology message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::CHAT_GREETING;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{ChatTurn, CurrentUser, Speaker, session_keys};
use crate::state::AppState;

/// Messages kept per session; older ones are dropped first.
pub const MAX_CHAT_TURNS: usize = 20;

/// Context sent when the shopper writes from the assistant page itself.
const DEFAULT_CONTEXT: &str = "The shopper is on the assistant page of the store.";

/// Chat form data.
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// Assistant page template.
#[derive(Template, WebTemplate)]
#[template(path = "chat.html")]
pub struct ChatTemplate {
    pub user: Option<CurrentUser>,
    pub greeting: &'static str,
    pub turns: Vec<ChatTurn>,
}

async fn history(session: &Session) -> Vec<ChatTurn> {
    session
        .get::<Vec<ChatTurn>>(session_keys::CHAT_HISTORY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Append turns, keeping only the most recent [`MAX_CHAT_TURNS`].
fn push_turns(turns: &mut Vec<ChatTurn>, new: impl IntoIterator<Item = ChatTurn>) {
    turns.extend(new);
    let excess = turns.len().saturating_sub(MAX_CHAT_TURNS);
    turns.drain(..excess);
}

/// Display the conversation.
pub async fn page(session: Session, OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    ChatTemplate {
        user,
        greeting: CHAT_GREETING,
        turns: history(&session).await,
    }
}

/// Send a message to the assistant and show the answer.
#[instrument(skip_all)]
pub async fn send(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ChatForm>,
) -> Response {
    let message = form.message.trim();
    if message.is_empty() {
        return Redirect::to("/chat").into_response();
    }

    let context = form
        .context
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CONTEXT);
    let answer = state.chat().reply(message, context).await;

    let mut turns = history(&session).await;
    push_turns(
        &mut turns,
        [
            ChatTurn {
                speaker: Speaker::Shopper,
                text: message.to_string(),
            },
            ChatTurn {
                speaker: Speaker::Assistant,
                text: answer,
            },
        ],
    );
    if let Err(e) = session.insert(session_keys::CHAT_HISTORY, &turns).await {
        tracing::error!(error = %e, "Failed to store chat history");
    }

    Redirect::to("/chat").into_response()
}
