use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::connections::status::ConnectionStatus;
use crate::models::connection::ConnectionRow;

const CONNECTION_COLUMNS: &str =
    "id, sender_id, receiver_id, status, created_at, updated_at, last_contact_at";

pub async fn get_connection(pool: &PgPool, id: Uuid) -> Result<Option<ConnectionRow>, sqlx::Error> {
    sqlx::query_as::<_, ConnectionRow>(&format!(
        "SELECT {CONNECTION_COLUMNS} FROM connections WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// The connection between two profiles, whichever of them sent it.
pub async fn find_between(
    pool: &PgPool,
    a: Uuid,
    b: Uuid,
) -> Result<Option<ConnectionRow>, sqlx::Error> {
    sqlx::query_as::<_, ConnectionRow>(&format!(
        r#"
        SELECT {CONNECTION_COLUMNS} FROM connections
        WHERE (sender_id = $1 AND receiver_id = $2)
           OR (sender_id = $2 AND receiver_id = $1)
        "#
    ))
    .bind(a)
    .bind(b)
    .fetch_optional(pool)
    .await
}

/// Inserts a pending request. The unordered-pair unique index rejects a
/// second request between the same two profiles.
pub async fn insert_request(
    pool: &PgPool,
    sender_id: Uuid,
    receiver_id: Uuid,
) -> Result<ConnectionRow, sqlx::Error> {
    let row = sqlx::query_as::<_, ConnectionRow>(&format!(
        r#"
        INSERT INTO connections (id, sender_id, receiver_id, status)
        VALUES ($1, $2, $3, 'pending')
        RETURNING {CONNECTION_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(sender_id)
    .bind(receiver_id)
    .fetch_one(pool)
    .await?;

    info!("Connection request {} sent from {sender_id} to {receiver_id}", row.id);
    Ok(row)
}

/// Moves a pending connection to `target`. Returns `None` when the row is
/// missing or was answered concurrently.
pub async fn answer_request(
    pool: &PgPool,
    id: Uuid,
    target: ConnectionStatus,
) -> Result<Option<ConnectionRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, ConnectionRow>(&format!(
        r#"
        UPDATE connections SET status = $2, updated_at = now()
        WHERE id = $1 AND status = 'pending'
        RETURNING {CONNECTION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(target.as_str())
    .fetch_optional(pool)
    .await?;

    if row.is_some() {
        info!("Connection {id} {target}");
    }
    Ok(row)
}

pub async fn delete_connection(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM connections WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() > 0 {
        info!("Deleted connection {id}");
    }
    Ok(result.rows_affected() > 0)
}

/// Every connection involving the profile, newest first.
pub async fn list_for_profile(
    pool: &PgPool,
    profile_id: Uuid,
) -> Result<Vec<ConnectionRow>, sqlx::Error> {
    sqlx::query_as::<_, ConnectionRow>(&format!(
        r#"
        SELECT {CONNECTION_COLUMNS} FROM connections
        WHERE sender_id = $1 OR receiver_id = $1
        ORDER BY created_at DESC, id
        "#
    ))
    .bind(profile_id)
    .fetch_all(pool)
    .await
}

pub async fn list_sent(pool: &PgPool, profile_id: Uuid) -> Result<Vec<ConnectionRow>, sqlx::Error> {
    sqlx::query_as::<_, ConnectionRow>(&format!(
        "SELECT {CONNECTION_COLUMNS} FROM connections WHERE sender_id = $1 ORDER BY created_at DESC, id"
    ))
    .bind(profile_id)
    .fetch_all(pool)
    .await
}

/// Received connections, optionally narrowed to one status.
pub async fn list_received(
    pool: &PgPool,
    profile_id: Uuid,
    status: Option<ConnectionStatus>,
) -> Result<Vec<ConnectionRow>, sqlx::Error> {
    sqlx::query_as::<_, ConnectionRow>(&format!(
        r#"
        SELECT {CONNECTION_COLUMNS} FROM connections
        WHERE receiver_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC, id
        "#
    ))
    .bind(profile_id)
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await
}

/// Accepted connections involving the profile, most recently accepted first.
pub async fn list_accepted(
    pool: &PgPool,
    profile_id: Uuid,
) -> Result<Vec<ConnectionRow>, sqlx::Error> {
    sqlx::query_as::<_, ConnectionRow>(&format!(
        r#"
        SELECT {CONNECTION_COLUMNS} FROM connections
        WHERE (sender_id = $1 OR receiver_id = $1) AND status = 'accepted'
        ORDER BY updated_at DESC, id
        "#
    ))
    .bind(profile_id)
    .fetch_all(pool)
    .await
}
