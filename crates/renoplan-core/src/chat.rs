//! Chat controller: the conversation state behind the chat view.
//!
//! Owns the conversation list, the selected conversation and its messages,
//! sends user messages through a [`ChatTransport`] and applies the streamed
//! reply to a placeholder assistant message. Signed-in users persist through
//! the repositories; anonymous visitors persist to an [`AnonymousChatStore`].

use crate::anonymous::AnonymousChatStore;
use crate::relay::{ChatTransport, RelayState, relay};
use crate::repo::{ConversationRepository, MessageRepository};
use crate::{RenoplanError, Result};
use renoplan_types::{
    ChatRequest, ChatTurn, Conversation, Message, MessageRole, SessionContext, title_from_prompt,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct ChatController<T, R>
where
    T: ChatTransport,
    R: ConversationRepository + MessageRepository,
{
    ctx: SessionContext,
    transport: T,
    repo: Arc<R>,
    anonymous: Option<(AnonymousChatStore, String)>,
    /// Conversation id stamped on anonymous messages.
    anonymous_conversation: Uuid,
    project_id: Option<Uuid>,
    conversations: Vec<Conversation>,
    selected: Option<Uuid>,
    messages: Vec<Message>,
    state: RelayState,
}

impl<T, R> ChatController<T, R>
where
    T: ChatTransport,
    R: ConversationRepository + MessageRepository,
{
    pub fn new(ctx: SessionContext, transport: T, repo: Arc<R>) -> Self {
        Self {
            ctx,
            transport,
            repo,
            anonymous: None,
            anonymous_conversation: Uuid::new_v4(),
            project_id: None,
            conversations: Vec::new(),
            selected: None,
            messages: Vec::new(),
            state: RelayState::Idle,
        }
    }

    /// Persist an anonymous visitor's history under `session_id` and restore
    /// whatever was saved there before.
    pub fn with_anonymous_store(
        mut self,
        store: AnonymousChatStore,
        session_id: impl Into<String>,
    ) -> Result<Self> {
        let session_id = session_id.into();
        self.messages = store.load(&session_id)?;
        if let Some(first) = self.messages.first() {
            self.anonymous_conversation = first.conversation_id;
        }
        self.anonymous = Some((store, session_id));
        Ok(self)
    }

    /// Attach new conversations (and chat requests) to a project.
    pub fn set_project(&mut self, project_id: Option<Uuid>) {
        self.project_id = project_id;
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn selected_conversation(&self) -> Option<Uuid> {
        self.selected
    }

    fn is_anonymous(&self) -> bool {
        self.ctx.is_anonymous()
    }

    /// Refresh the conversation list from the store.
    pub fn load_conversations(&mut self) -> Result<&[Conversation]> {
        if !self.is_anonymous() {
            self.conversations = self.repo.list_conversations(self.ctx.user_id)?;
        }
        Ok(&self.conversations)
    }

    /// Load a conversation the caller owns (or any, for admins).
    fn owned_conversation(&self, id: Uuid) -> Result<Conversation> {
        let conversation = self
            .repo
            .get_conversation(id)?
            .ok_or_else(|| RenoplanError::not_found("Conversation", id))?;
        let owner = conversation.user_id.is_some() && conversation.user_id == self.ctx.user_id;
        if !owner && !self.ctx.is_admin {
            return Err(RenoplanError::Forbidden(format!("no access to conversation {}", id)));
        }
        Ok(conversation)
    }

    /// Open an existing conversation and load its messages.
    pub fn select_conversation(&mut self, id: Uuid) -> Result<()> {
        let conversation = self.owned_conversation(id)?;

        self.messages = self.repo.list_messages(id)?;
        self.selected = Some(id);
        self.project_id = conversation.project_id.or(self.project_id);
        self.state = RelayState::Idle;
        Ok(())
    }

    /// Reset to the "new conversation" state.
    pub fn new_conversation(&mut self) {
        self.selected = None;
        self.messages.clear();
        self.state = RelayState::Idle;
        if let Some((store, session_id)) = &self.anonymous {
            if let Err(e) = store.clear(session_id) {
                tracing::warn!(target: "renoplan::chat", "Failed to clear anonymous history: {}", e);
            }
            self.anonymous_conversation = Uuid::new_v4();
        }
    }

    /// Delete a conversation. If it was selected, the view resets.
    pub fn delete_conversation(&mut self, id: Uuid) -> Result<()> {
        self.owned_conversation(id)?;
        if !self.repo.delete_conversation(id)? {
            return Err(RenoplanError::not_found("Conversation", id));
        }
        self.conversations.retain(|c| c.id != id);
        if self.selected == Some(id) {
            self.new_conversation();
        }
        tracing::info!(target: "renoplan::chat", "Deleted conversation {}", id);
        Ok(())
    }

    /// Merge a message delivered by a realtime subscription.
    ///
    /// Messages are deduplicated by id, so echoes of locally sent messages
    /// are dropped. Returns whether the message was added.
    pub fn merge_realtime(&mut self, message: Message) -> bool {
        let in_view = if self.is_anonymous() {
            message.conversation_id == self.anonymous_conversation
        } else {
            self.selected == Some(message.conversation_id)
        };
        if !in_view || self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Send a user message and stream the assistant's reply.
    ///
    /// `on_update` is called with the full message list whenever it changes.
    /// On failure the placeholder reply is removed and the error returned;
    /// the user message is kept.
    pub async fn send_message<F>(
        &mut self,
        content: &str,
        image_url: Option<String>,
        mut on_update: F,
    ) -> Result<String>
    where
        F: FnMut(&[Message]),
    {
        if self.state == RelayState::Streaming {
            return Err(RenoplanError::InvalidInput("a reply is already streaming".into()));
        }
        let content = content.trim();
        if content.is_empty() && image_url.is_none() {
            return Err(RenoplanError::InvalidInput("message cannot be empty".into()));
        }

        let conversation_id = self.ensure_conversation(content)?;
        let user_message = Message::new(conversation_id, MessageRole::User, content, image_url);
        self.messages.push(user_message.clone());
        self.persist(&user_message);

        let anonymous = self.is_anonymous();
        let request = ChatRequest {
            messages: self.messages.iter().map(ChatTurn::from).collect(),
            conversation_id: (!anonymous).then_some(conversation_id),
            project_id: self.project_id,
            is_anonymous: anonymous.then_some(true),
        };

        let placeholder = Message::assistant(conversation_id, "");
        let placeholder_id = placeholder.id;
        self.messages.push(placeholder);
        self.state = RelayState::Streaming;
        on_update(&self.messages);

        let result = match self.transport.open(&request).await {
            Ok(stream) => {
                let messages = &mut self.messages;
                relay(stream, |text| {
                    if let Some(m) = messages.iter_mut().find(|m| m.id == placeholder_id) {
                        m.content = text.to_string();
                    }
                    on_update(&messages[..]);
                })
                .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(text) if text.is_empty() => {
                self.messages.retain(|m| m.id != placeholder_id);
                self.state = RelayState::Done;
                on_update(&self.messages);
                Ok(text)
            }
            Ok(text) => {
                self.state = RelayState::Done;
                if let Some(reply) = self.messages.iter().find(|m| m.id == placeholder_id).cloned() {
                    self.persist(&reply);
                }
                Ok(text)
            }
            Err(e) => {
                tracing::warn!(target: "renoplan::chat", "Chat stream failed: {}", e);
                self.messages.retain(|m| m.id != placeholder_id);
                self.state = RelayState::RolledBack;
                on_update(&self.messages);
                Err(e.into())
            }
        }
    }

    /// Id of the conversation the next message belongs to, creating one for
    /// a signed-in user's first message.
    fn ensure_conversation(&mut self, first_prompt: &str) -> Result<Uuid> {
        if self.is_anonymous() {
            return Ok(self.anonymous_conversation);
        }
        if let Some(id) = self.selected {
            return Ok(id);
        }

        let conversation = Conversation::new(
            title_from_prompt(first_prompt),
            self.ctx.user_id,
            self.project_id,
        );
        self.repo.create_conversation(&conversation)?;
        tracing::info!(target: "renoplan::chat", "Created conversation {}", conversation.id);

        let id = conversation.id;
        self.conversations.insert(0, conversation);
        self.selected = Some(id);
        Ok(id)
    }

    /// Best-effort save. Failures are logged, not retried or surfaced.
    fn persist(&self, message: &Message) {
        if self.is_anonymous() {
            if let Some((store, session_id)) = &self.anonymous {
                if let Err(e) = store.save(session_id, &self.messages) {
                    tracing::warn!(target: "renoplan::chat", "Failed to save anonymous history: {}", e);
                }
            }
            return;
        }
        if let Err(e) = self.repo.append_message(message) {
            tracing::warn!(target: "renoplan::chat", "Failed to save message {}: {}", message.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::{ByteStream, RelayError};
    use crate::store::Store;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    type Script = std::result::Result<Vec<std::result::Result<&'static str, RelayError>>, RelayError>;

    /// Transport that replays scripted responses and records requests.
    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Script>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedTransport {
        fn with(scripts: Vec<Script>) -> Self {
            Self {
                script: Mutex::new(scripts.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn open(&self, request: &ChatRequest) -> std::result::Result<ByteStream, RelayError> {
            self.requests.lock().unwrap().push(request.clone());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RelayError::Failed("no script".into())));
            let chunks: Vec<std::result::Result<Bytes, RelayError>> = next?
                .into_iter()
                .map(|c| c.map(|s| Bytes::from_static(s.as_bytes())))
                .collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
    }

    const HELLO: &[&str] = &[
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
        "data: [DONE]\n",
    ];

    fn ok(chunks: &[&'static str]) -> Script {
        Ok(chunks.iter().map(|c| Ok(*c)).collect())
    }

    fn signed_in(scripts: Vec<Script>) -> (ChatController<ScriptedTransport, Store>, Arc<Store>, Uuid) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let user = Uuid::new_v4();
        let controller = ChatController::new(
            SessionContext::user(user, false),
            ScriptedTransport::with(scripts),
            store.clone(),
        );
        (controller, store, user)
    }

    #[tokio::test]
    async fn test_send_streams_and_persists_once() {
        let (mut chat, store, user) = signed_in(vec![ok(HELLO)]);

        let mut snapshots: Vec<String> = Vec::new();
        let text = chat
            .send_message("Plan my kitchen", None, |msgs| {
                snapshots.push(msgs.last().map(|m| m.content.clone()).unwrap_or_default())
            })
            .await
            .unwrap();

        assert_eq!(text, "Hello");
        assert_eq!(snapshots, vec!["", "Hel", "Hello"]);
        assert_eq!(chat.state(), RelayState::Done);

        let conversation_id = chat.selected_conversation().unwrap();
        assert_eq!(chat.conversations().len(), 1);
        assert_eq!(chat.conversations()[0].title, "Plan my kitchen");
        assert_eq!(chat.conversations()[0].user_id, Some(user));

        let stored = store.list_messages(conversation_id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, MessageRole::User);
        assert_eq!(stored[1].content, "Hello");
        assert_eq!(stored[1].id, chat.messages()[1].id);
    }

    #[tokio::test]
    async fn test_follow_up_reuses_conversation_and_sends_history() {
        let (mut chat, store, _) = signed_in(vec![ok(HELLO), ok(HELLO)]);
        chat.send_message("first", None, |_| {}).await.unwrap();
        let conversation_id = chat.selected_conversation().unwrap();

        chat.send_message("second", Some("https://img.example/p.jpg".into()), |_| {})
            .await
            .unwrap();
        assert_eq!(chat.selected_conversation(), Some(conversation_id));
        assert_eq!(store.list_messages(conversation_id).unwrap().len(), 4);

        let requests = chat.transport.requests.lock().unwrap();
        let last = requests.last().unwrap();
        assert_eq!(last.conversation_id, Some(conversation_id));
        assert_eq!(last.messages.len(), 3);
        assert_eq!(last.messages[1].content, "Hello");
        assert_eq!(last.messages[2].image_url.as_deref(), Some("https://img.example/p.jpg"));
        assert!(last.is_anonymous.is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_rolls_back_placeholder() {
        let (mut chat, store, _) = signed_in(vec![Err(RelayError::RateLimited)]);

        let err = chat.send_message("hello?", None, |_| {}).await.unwrap_err();
        assert!(matches!(err, RenoplanError::Relay(RelayError::RateLimited)));
        assert_eq!(chat.state(), RelayState::RolledBack);

        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].role, MessageRole::User);
        let conversation_id = chat.selected_conversation().unwrap();
        assert_eq!(store.list_messages(conversation_id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_rolls_back() {
        let script = Ok(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n"),
            Err(RelayError::Failed("connection reset".into())),
        ]);
        let (mut chat, store, _) = signed_in(vec![script]);

        let mut last_len = 0;
        let err = chat
            .send_message("hi", None, |msgs| last_len = msgs.len())
            .await
            .unwrap_err();
        assert!(matches!(err, RenoplanError::Relay(RelayError::Failed(_))));
        assert_eq!(last_len, 1);
        assert_eq!(store.list_messages(chat.selected_conversation().unwrap()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_reply_is_not_saved() {
        let (mut chat, store, _) = signed_in(vec![ok(&["data: [DONE]\n"])]);
        let text = chat.send_message("hi", None, |_| {}).await.unwrap();
        assert_eq!(text, "");
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(store.list_messages(chat.selected_conversation().unwrap()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_empty_message() {
        let (mut chat, _, _) = signed_in(vec![]);
        assert!(matches!(
            chat.send_message("   ", None, |_| {}).await,
            Err(RenoplanError::InvalidInput(_))
        ));
        assert!(chat.selected_conversation().is_none());
    }

    #[tokio::test]
    async fn test_realtime_merge_dedupes_by_id() {
        let (mut chat, _, _) = signed_in(vec![ok(HELLO)]);
        chat.send_message("hi", None, |_| {}).await.unwrap();
        let conversation_id = chat.selected_conversation().unwrap();

        let echo = chat.messages()[1].clone();
        assert!(!chat.merge_realtime(echo));

        // Same role and content but a different id is a distinct message.
        let other = Message::assistant(conversation_id, "Hello");
        assert!(chat.merge_realtime(other.clone()));
        assert!(!chat.merge_realtime(other));
        assert_eq!(chat.messages().len(), 3);

        assert!(!chat.merge_realtime(Message::user(Uuid::new_v4(), "elsewhere")));
    }

    #[tokio::test]
    async fn test_delete_selected_conversation_resets() {
        let (mut chat, store, user) = signed_in(vec![ok(HELLO)]);
        let other = Conversation::new("Older", Some(user), None);
        store.create_conversation(&other).unwrap();

        chat.send_message("hi", None, |_| {}).await.unwrap();
        let current = chat.selected_conversation().unwrap();
        assert_eq!(chat.load_conversations().unwrap().len(), 2);

        chat.delete_conversation(other.id).unwrap();
        assert_eq!(chat.selected_conversation(), Some(current));
        assert_eq!(chat.conversations().len(), 1);

        chat.delete_conversation(current).unwrap();
        assert!(chat.conversations().is_empty());
        assert!(chat.selected_conversation().is_none());
        assert!(chat.messages().is_empty());
        assert_eq!(chat.state(), RelayState::Idle);
        assert!(store.get_conversation(current).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_requires_ownership() {
        let (mut chat, store, _) = signed_in(vec![]);
        let theirs = Conversation::new("Theirs", Some(Uuid::new_v4()), None);
        store.create_conversation(&theirs).unwrap();

        assert!(matches!(
            chat.delete_conversation(theirs.id),
            Err(RenoplanError::Forbidden(_))
        ));
        assert!(store.get_conversation(theirs.id).unwrap().is_some());
        assert!(matches!(
            chat.delete_conversation(Uuid::new_v4()),
            Err(RenoplanError::NotFound { .. })
        ));

        let mut admin = ChatController::new(
            SessionContext::user(Uuid::new_v4(), true),
            ScriptedTransport::default(),
            store.clone(),
        );
        admin.delete_conversation(theirs.id).unwrap();
        assert!(store.get_conversation(theirs.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_select_conversation() {
        let (mut chat, store, user) = signed_in(vec![]);
        let mine = Conversation::new("Mine", Some(user), Some(Uuid::new_v4()));
        store.create_conversation(&mine).unwrap();
        store.append_message(&Message::user(mine.id, "stored")).unwrap();

        chat.select_conversation(mine.id).unwrap();
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].content, "stored");

        let theirs = Conversation::new("Theirs", Some(Uuid::new_v4()), None);
        store.create_conversation(&theirs).unwrap();
        assert!(matches!(
            chat.select_conversation(theirs.id),
            Err(RenoplanError::Forbidden(_))
        ));
        assert!(matches!(
            chat.select_conversation(Uuid::new_v4()),
            Err(RenoplanError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_anonymous_session_uses_local_store() {
        let temp_dir = TempDir::new().unwrap();
        let anon_store = AnonymousChatStore::new(temp_dir.path());
        let store = Arc::new(Store::open_in_memory().unwrap());

        let mut chat = ChatController::new(
            SessionContext::anonymous(),
            ScriptedTransport::with(vec![ok(HELLO)]),
            store.clone(),
        )
        .with_anonymous_store(anon_store.clone(), "visitor-1")
        .unwrap();

        chat.send_message("Is drywall hard?", None, |_| {}).await.unwrap();
        assert!(chat.selected_conversation().is_none());
        assert!(store.list_conversations(None).unwrap().is_empty());
        {
            let requests = chat.transport.requests.lock().unwrap();
            assert_eq!(requests[0].is_anonymous, Some(true));
            assert!(requests[0].conversation_id.is_none());
        }

        let saved = anon_store.load("visitor-1").unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].content, "Hello");

        let restored = ChatController::new(
            SessionContext::anonymous(),
            ScriptedTransport::default(),
            store,
        )
        .with_anonymous_store(anon_store.clone(), "visitor-1")
        .unwrap();
        assert_eq!(restored.messages(), saved.as_slice());

        chat.new_conversation();
        assert!(anon_store.load("visitor-1").unwrap().is_empty());
    }
}
