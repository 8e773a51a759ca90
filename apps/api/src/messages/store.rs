use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::message::MessageRow;

const MESSAGE_COLUMNS: &str = "id, connection_id, sender_id, content, read, created_at";

/// Stores a message and stamps the connection's `last_contact_at` in the
/// same transaction.
pub async fn insert_message(
    pool: &PgPool,
    connection_id: Uuid,
    sender_id: Uuid,
    content: &str,
) -> Result<MessageRow, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let message = sqlx::query_as::<_, MessageRow>(&format!(
        r#"
        INSERT INTO messages (id, connection_id, sender_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING {MESSAGE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(connection_id)
    .bind(sender_id)
    .bind(content)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE connections SET last_contact_at = $2 WHERE id = $1")
        .bind(connection_id)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        "Message {} sent by {sender_id} on connection {connection_id}",
        message.id
    );
    Ok(message)
}

/// The conversation on a connection, oldest first.
pub async fn list_messages(
    pool: &PgPool,
    connection_id: Uuid,
) -> Result<Vec<MessageRow>, sqlx::Error> {
    sqlx::query_as::<_, MessageRow>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE connection_id = $1 ORDER BY created_at, id"
    ))
    .bind(connection_id)
    .fetch_all(pool)
    .await
}

/// Marks every unread message not written by `reader_id` as read.
pub async fn mark_read(
    pool: &PgPool,
    connection_id: Uuid,
    reader_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE messages SET read = TRUE
        WHERE connection_id = $1 AND sender_id <> $2 AND NOT read
        "#,
    )
    .bind(connection_id)
    .bind(reader_id)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!(
            "Marked {} message(s) read on connection {connection_id} for {reader_id}",
            result.rows_affected()
        );
    }
    Ok(result.rows_affected())
}
