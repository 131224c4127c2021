// ABOUTME: SQLite schema for conversations and specifications
// ABOUTME: Idempotent DDL applied at startup and by tests

use sqlx::SqlitePool;

/// Create the conversation and specification tables if they do not exist.
pub async fn init(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            stage TEXT NOT NULL,
            initial_prompt TEXT NOT NULL,
            project_name TEXT,
            skill_level TEXT,
            analyzed INTEGER NOT NULL DEFAULT 0,
            analysis_result TEXT,
            analysis_error TEXT,
            open_questions TEXT NOT NULL,
            answered_questions TEXT NOT NULL,
            message_log TEXT NOT NULL,
            spec_id TEXT,
            revision INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS specifications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            project_name TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL,
            version INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
