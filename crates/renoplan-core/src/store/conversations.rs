use super::{Store, parse_opt_uuid, parse_time, parse_uuid};
use crate::repo::{ConversationRepository, MessageRepository};
use crate::{RenoplanError, Result};
use chrono::Utc;
use renoplan_types::{Conversation, Message, MessageRole};
use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

impl ConversationRepository for Store {
    fn create_conversation(&self, conversation: &Conversation) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO conversations (id, title, user_id, project_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                conversation.id.to_string(),
                conversation.title,
                conversation.user_id.map(|u| u.to_string()),
                conversation.project_id.map(|p| p.to_string()),
                conversation.created_at.to_rfc3339(),
                conversation.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        let conn = self.conn()?;
        let conversation = conn
            .query_row(
                "SELECT * FROM conversations WHERE id = ?1",
                params![id.to_string()],
                row_to_conversation,
            )
            .optional()?;
        Ok(conversation)
    }

    fn list_conversations(&self, user_id: Option<Uuid>) -> Result<Vec<Conversation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM conversations WHERE user_id IS ?1 ORDER BY updated_at DESC",
        )?;
        let conversations = stmt
            .query_map(params![user_id.map(|u| u.to_string())], row_to_conversation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(conversations)
    }

    fn rename_conversation(&self, id: Uuid, title: &str) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE conversations SET title = ?1, updated_at = ?2 WHERE id = ?3",
            params![title, Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RenoplanError::not_found("Conversation", id));
        }
        Ok(())
    }

    fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM conversations WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(changed > 0)
    }
}

impl MessageRepository for Store {
    fn append_message(&self, message: &Message) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let conversation_id = message.conversation_id.to_string();

        let changed = tx.execute(
            "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), conversation_id],
        )?;
        if changed == 0 {
            return Err(RenoplanError::not_found("Conversation", message.conversation_id));
        }

        tx.execute(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, image_url, created_at, seq)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6,
                (SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE conversation_id = ?2))
            "#,
            params![
                message.id.to_string(),
                conversation_id,
                message.role.as_str(),
                message.content,
                message.image_url,
                message.created_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE conversation_id = ?1 ORDER BY seq ASC",
        )?;
        let messages = stmt
            .query_map(params![conversation_id.to_string()], row_to_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }
}

fn row_to_conversation(row: &rusqlite::Row) -> rusqlite::Result<Conversation> {
    let id: String = row.get("id")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Conversation {
        id: parse_uuid(&id),
        title: row.get("title")?,
        user_id: parse_opt_uuid(row.get("user_id")?),
        project_id: parse_opt_uuid(row.get("project_id")?),
        created_at: parse_time(&created_at),
        updated_at: parse_time(&updated_at),
    })
}

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Message> {
    let id: String = row.get("id")?;
    let conversation_id: String = row.get("conversation_id")?;
    let role: String = row.get("role")?;
    let created_at: String = row.get("created_at")?;

    Ok(Message {
        id: parse_uuid(&id),
        conversation_id: parse_uuid(&conversation_id),
        role: MessageRole::parse(&role).unwrap_or(MessageRole::Assistant),
        content: row.get("content")?,
        image_url: row.get("image_url")?,
        created_at: parse_time(&created_at),
    })
}
