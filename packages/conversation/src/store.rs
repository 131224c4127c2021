// ABOUTME: Durable stores for conversation state and finished specifications
// ABOUTME: Conversation writes go through an optimistic revision check; specs are append-only

use chrono::{DateTime, Utc};
use specwright_core::{
    AnsweredQuestion, ConversationStage, ConversationState, ExtractionResult, MessageEntry,
    ProjectSpecification, SkillLevel,
};
use sqlx::{Row, SqlitePool};
use tracing::{error, info};

use crate::error::{ConversationError, Result};

/// Store for conversation state. The revision column implements per-key
/// compare-and-swap: concurrent writers to the same conversation cannot
/// interleave a read-modify-write without one of them being rejected.
#[derive(Clone)]
pub struct ConversationStore {
    pool: SqlitePool,
}

impl ConversationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a freshly created conversation.
    pub async fn insert(&self, conversation: &ConversationState) -> Result<()> {
        info!("Inserting conversation: {}", conversation.id);

        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, user_id, stage, initial_prompt, project_name, skill_level,
                analyzed, analysis_result, analysis_error, open_questions,
                answered_questions, message_log, spec_id, revision, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&conversation.id)
        .bind(&conversation.user_id)
        .bind(conversation.stage.as_str())
        .bind(&conversation.initial_prompt)
        .bind(&conversation.project_name)
        .bind(encode_skill_level(conversation.skill_level)?)
        .bind(conversation.analyzed)
        .bind(encode_optional_json(&conversation.analysis_result)?)
        .bind(&conversation.analysis_error)
        .bind(serde_json::to_string(&conversation.open_questions)?)
        .bind(serde_json::to_string(&conversation.answered_questions)?)
        .bind(serde_json::to_string(&conversation.message_log)?)
        .bind(&conversation.spec_id)
        .bind(conversation.revision)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert conversation: {}", e);
            ConversationError::Database(e)
        })?;

        Ok(())
    }

    /// Fetch a conversation by id.
    pub async fn get(&self, conversation_id: &str) -> Result<Option<ConversationState>> {
        let row = sqlx::query(
            r#"
            SELECT
                id, user_id, stage, initial_prompt, project_name, skill_level,
                analyzed, analysis_result, analysis_error, open_questions,
                answered_questions, message_log, spec_id, revision, created_at, updated_at
            FROM conversations
            WHERE id = ?
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_conversation).transpose()
    }

    /// Write back a mutated conversation, gated by its revision.
    ///
    /// Succeeds only when the stored revision still matches the one this
    /// state was loaded at, then bumps it. A mismatch means another writer
    /// committed in between and yields `RevisionConflict`.
    pub async fn update(&self, conversation: &mut ConversationState) -> Result<()> {
        let now = Utc::now();

        let outcome = sqlx::query(
            r#"
            UPDATE conversations SET
                stage = ?,
                project_name = ?,
                analyzed = ?,
                analysis_result = ?,
                analysis_error = ?,
                open_questions = ?,
                answered_questions = ?,
                message_log = ?,
                spec_id = ?,
                revision = revision + 1,
                updated_at = ?
            WHERE id = ? AND revision = ?
            "#,
        )
        .bind(conversation.stage.as_str())
        .bind(&conversation.project_name)
        .bind(conversation.analyzed)
        .bind(encode_optional_json(&conversation.analysis_result)?)
        .bind(&conversation.analysis_error)
        .bind(serde_json::to_string(&conversation.open_questions)?)
        .bind(serde_json::to_string(&conversation.answered_questions)?)
        .bind(serde_json::to_string(&conversation.message_log)?)
        .bind(&conversation.spec_id)
        .bind(now)
        .bind(&conversation.id)
        .bind(conversation.revision)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to update conversation: {}", e);
            ConversationError::Database(e)
        })?;

        if outcome.rows_affected() == 0 {
            return Err(ConversationError::RevisionConflict(conversation.id.clone()));
        }

        conversation.revision += 1;
        conversation.updated_at = now;
        Ok(())
    }
}

/// Append-only store for finished specifications.
#[derive(Clone)]
pub struct SpecificationStore {
    pool: SqlitePool,
}

impl SpecificationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new specification. Never updates an existing one.
    pub async fn save(&self, spec: &ProjectSpecification) -> Result<()> {
        info!("Saving specification: {}", spec.id);

        sqlx::query(
            r#"
            INSERT INTO specifications (id, user_id, project_name, content, created_at, version)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&spec.id)
        .bind(&spec.user_id)
        .bind(&spec.project_name)
        .bind(serde_json::to_string(&spec.content)?)
        .bind(spec.created_at)
        .bind(spec.version)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save specification: {}", e);
            ConversationError::Database(e)
        })?;

        Ok(())
    }

    /// Fetch a specification by id.
    pub async fn get(&self, spec_id: &str) -> Result<Option<ProjectSpecification>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, project_name, content, created_at, version
            FROM specifications
            WHERE id = ?
            "#,
        )
        .bind(spec_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(ProjectSpecification {
                id: row.get("id"),
                user_id: row.get("user_id"),
                project_name: row.get("project_name"),
                content: serde_json::from_str(&row.get::<String, _>("content"))?,
                created_at: row.get::<DateTime<Utc>, _>("created_at"),
                version: row.get("version"),
            })
        })
        .transpose()
    }
}

fn row_to_conversation(row: sqlx::sqlite::SqliteRow) -> Result<ConversationState> {
    let stage_raw: String = row.get("stage");
    let stage = ConversationStage::parse(&stage_raw).map_err(ConversationError::InvalidStage)?;

    let analysis_result: Option<ExtractionResult> = row
        .get::<Option<String>, _>("analysis_result")
        .map(|s| serde_json::from_str(&s))
        .transpose()?;

    let open_questions: Vec<String> =
        serde_json::from_str(&row.get::<String, _>("open_questions"))?;
    let answered_questions: Vec<AnsweredQuestion> =
        serde_json::from_str(&row.get::<String, _>("answered_questions"))?;
    let message_log: Vec<MessageEntry> =
        serde_json::from_str(&row.get::<String, _>("message_log"))?;

    Ok(ConversationState {
        id: row.get("id"),
        user_id: row.get("user_id"),
        stage,
        initial_prompt: row.get("initial_prompt"),
        project_name: row.get("project_name"),
        skill_level: decode_skill_level(row.get::<Option<String>, _>("skill_level"))?,
        analyzed: row.get("analyzed"),
        analysis_result,
        analysis_error: row.get("analysis_error"),
        open_questions,
        answered_questions,
        message_log,
        spec_id: row.get("spec_id"),
        revision: row.get("revision"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}

fn encode_skill_level(level: Option<SkillLevel>) -> Result<Option<String>> {
    level
        .map(|l| {
            serde_json::to_string(&l).map(|s| s.trim_matches('"').to_string())
        })
        .transpose()
        .map_err(ConversationError::from)
}

fn decode_skill_level(raw: Option<String>) -> Result<Option<SkillLevel>> {
    raw.map(|s| serde_json::from_str(&format!("\"{}\"", s)))
        .transpose()
        .map_err(ConversationError::from)
}

fn encode_optional_json<T: serde::Serialize>(value: &Option<T>) -> Result<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(ConversationError::from)
}
