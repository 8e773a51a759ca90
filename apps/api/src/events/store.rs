use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::events::validation::{EventChanges, NewEvent, ParticipantStatus};
use crate::models::event::{cap_fits, is_full, EventRow, ParticipantRow};

const EVENT_SELECT: &str = r#"
    SELECT e.id, e.created_by, e.title, e.description, e.location, e.event_date,
           e.max_participants, e.category,
           (SELECT COUNT(*) FROM event_participants ep
             WHERE ep.event_id = e.id AND ep.status <> 'declined') AS participant_count,
           e.created_at, e.updated_at
    FROM events e
"#;

#[derive(Debug)]
pub enum EventUpdate {
    Updated(EventRow),
    Missing,
    /// The requested cap is below the number of current attendees.
    BelowAttendance { attending: i64 },
}

/// Result of an RSVP attempt.
#[derive(Debug)]
pub enum JoinOutcome {
    Joined(ParticipantRow),
    EventMissing,
    AlreadyJoined,
    Full,
}

/// Events ordered by date. Past events are skipped unless `include_past`.
/// The category match ignores case.
pub async fn list_events(
    pool: &PgPool,
    category: Option<&str>,
    include_past: bool,
) -> Result<Vec<EventRow>, sqlx::Error> {
    sqlx::query_as::<_, EventRow>(&format!(
        r#"
        {EVENT_SELECT}
        WHERE ($1::text IS NULL OR lower(e.category) = lower($1))
          AND ($2 OR e.event_date > now())
        ORDER BY e.event_date, e.id
        "#
    ))
    .bind(category)
    .bind(include_past)
    .fetch_all(pool)
    .await
}

pub async fn get_event(pool: &PgPool, id: Uuid) -> Result<Option<EventRow>, sqlx::Error> {
    sqlx::query_as::<_, EventRow>(&format!("{EVENT_SELECT} WHERE e.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_participants(
    pool: &PgPool,
    event_id: Uuid,
) -> Result<Vec<ParticipantRow>, sqlx::Error> {
    sqlx::query_as::<_, ParticipantRow>(
        r#"
        SELECT ep.profile_id, p.name, p.city, ep.status, ep.created_at AS joined_at
        FROM event_participants ep
        JOIN profiles p ON p.id = ep.profile_id
        WHERE ep.event_id = $1
        ORDER BY ep.created_at, ep.profile_id
        "#,
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
}

/// Creates the event and RSVPs its creator as confirmed.
pub async fn create_event(pool: &PgPool, new: &NewEvent) -> Result<EventRow, sqlx::Error> {
    let id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO events
            (id, created_by, title, description, location, event_date, max_participants, category)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(id)
    .bind(new.created_by)
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.location)
    .bind(new.event_date)
    .bind(new.max_participants)
    .bind(&new.category)
    .execute(&mut *tx)
    .await?;

    insert_participant(&mut tx, id, new.created_by, ParticipantStatus::Confirmed).await?;
    tx.commit().await?;

    info!("Created event {id} ({}) by {}", new.title, new.created_by);

    get_event(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

/// Applies a partial update while holding the event row lock, so a
/// concurrent join cannot slip in between the attendance count and a
/// lowered cap.
pub async fn update_event(
    pool: &PgPool,
    id: Uuid,
    changes: &EventChanges,
) -> Result<EventUpdate, sqlx::Error> {
    let mut tx = pool.begin().await?;

    if lock_event(&mut tx, id).await?.is_none() {
        return Ok(EventUpdate::Missing);
    }
    if let Some(new_cap) = changes.max_participants {
        let attending = count_attending(&mut tx, id).await?;
        if !cap_fits(new_cap, attending) {
            return Ok(EventUpdate::BelowAttendance { attending });
        }
    }

    sqlx::query(
        r#"
        UPDATE events SET
            title            = COALESCE($2, title),
            description      = CASE WHEN $3 THEN $4 ELSE description END,
            location         = CASE WHEN $5 THEN $6 ELSE location END,
            event_date       = COALESCE($7, event_date),
            max_participants = CASE WHEN $8 THEN $9 ELSE max_participants END,
            category         = CASE WHEN $10 THEN $11 ELSE category END,
            updated_at       = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&changes.title)
    .bind(changes.description.is_some())
    .bind(changes.description.clone().flatten())
    .bind(changes.location.is_some())
    .bind(changes.location.clone().flatten())
    .bind(changes.event_date)
    .bind(changes.max_participants.is_some())
    .bind(changes.max_participants.flatten())
    .bind(changes.category.is_some())
    .bind(changes.category.clone().flatten())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!("Updated event {id}");
    let event = get_event(pool, id).await?.ok_or(sqlx::Error::RowNotFound)?;
    Ok(EventUpdate::Updated(event))
}

pub async fn delete_event(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() > 0 {
        info!("Deleted event {id}");
    }
    Ok(result.rows_affected() > 0)
}

/// RSVPs `profile_id` to the event. The event row is locked while the
/// capacity is checked so concurrent joins cannot overbook it.
pub async fn join_event(
    pool: &PgPool,
    event_id: Uuid,
    profile_id: Uuid,
    status: ParticipantStatus,
) -> Result<JoinOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(max_participants) = lock_event(&mut tx, event_id).await? else {
        return Ok(JoinOutcome::EventMissing);
    };

    let already: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM event_participants WHERE event_id = $1 AND profile_id = $2)",
    )
    .bind(event_id)
    .bind(profile_id)
    .fetch_one(&mut *tx)
    .await?;
    if already {
        return Ok(JoinOutcome::AlreadyJoined);
    }

    if status.occupies_spot() {
        let taken = count_attending(&mut tx, event_id).await?;
        if is_full(max_participants, taken) {
            return Ok(JoinOutcome::Full);
        }
    }

    insert_participant(&mut tx, event_id, profile_id, status).await?;

    let participant = sqlx::query_as::<_, ParticipantRow>(
        r#"
        SELECT ep.profile_id, p.name, p.city, ep.status, ep.created_at AS joined_at
        FROM event_participants ep
        JOIN profiles p ON p.id = ep.profile_id
        WHERE ep.event_id = $1 AND ep.profile_id = $2
        "#,
    )
    .bind(event_id)
    .bind(profile_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    info!("Profile {profile_id} joined event {event_id} as {status}");
    Ok(JoinOutcome::Joined(participant))
}

pub async fn leave_event(pool: &PgPool, event_id: Uuid, profile_id: Uuid) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM event_participants WHERE event_id = $1 AND profile_id = $2")
            .bind(event_id)
            .bind(profile_id)
            .execute(pool)
            .await?;
    if result.rows_affected() > 0 {
        info!("Profile {profile_id} left event {event_id}");
    }
    Ok(result.rows_affected() > 0)
}

/// Locks the event row and returns its cap; `None` when the event is missing.
async fn lock_event(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<Option<Option<i32>>, sqlx::Error> {
    sqlx::query_scalar("SELECT max_participants FROM events WHERE id = $1 FOR UPDATE")
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await
}

async fn count_attending(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM event_participants WHERE event_id = $1 AND status <> 'declined'",
    )
    .bind(event_id)
    .fetch_one(&mut **tx)
    .await
}

async fn insert_participant(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
    profile_id: Uuid,
    status: ParticipantStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO event_participants (event_id, profile_id, status) VALUES ($1, $2, $3)",
    )
    .bind(event_id)
    .bind(profile_id)
    .bind(status.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::profiles::store::seed_profile;

    async fn seed_event(pool: &PgPool, created_by: Uuid, max: Option<i32>) -> EventRow {
        let new = NewEvent {
            created_by,
            title: "Board games".to_string(),
            description: None,
            location: Some("Library".to_string()),
            event_date: Utc::now() + Duration::days(7),
            max_participants: max,
            category: Some("Games".to_string()),
        };
        create_event(pool, &new).await.unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_creator_is_confirmed_attendee(pool: PgPool) {
        let host = seed_profile(&pool, "Host", None).await;
        let event = seed_event(&pool, host.id, Some(4)).await;
        assert_eq!(event.participant_count, 1);
        assert_eq!(event.available_spots(), Some(3));

        let participants = list_participants(&pool, event.id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].profile_id, host.id);
        assert_eq!(participants[0].status, "confirmed");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_join_respects_capacity_and_duplicates(pool: PgPool) {
        let host = seed_profile(&pool, "Host", None).await;
        let guest = seed_profile(&pool, "Guest", None).await;
        let late = seed_profile(&pool, "Late", None).await;
        let event = seed_event(&pool, host.id, Some(2)).await;

        let outcome = join_event(&pool, event.id, guest.id, ParticipantStatus::Interested)
            .await
            .unwrap();
        assert!(matches!(outcome, JoinOutcome::Joined(ref p) if p.name == "Guest"));

        let again = join_event(&pool, event.id, guest.id, ParticipantStatus::Confirmed)
            .await
            .unwrap();
        assert!(matches!(again, JoinOutcome::AlreadyJoined));

        let full = join_event(&pool, event.id, late.id, ParticipantStatus::Interested)
            .await
            .unwrap();
        assert!(matches!(full, JoinOutcome::Full));

        // A declined RSVP takes no place, so it still fits.
        let declined = join_event(&pool, event.id, late.id, ParticipantStatus::Declined)
            .await
            .unwrap();
        assert!(matches!(declined, JoinOutcome::Joined(_)));
        let event = get_event(&pool, event.id).await.unwrap().unwrap();
        assert_eq!(event.participant_count, 2);
        assert!(event.is_full());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_join_unknown_event(pool: PgPool) {
        let guest = seed_profile(&pool, "Guest", None).await;
        let outcome = join_event(&pool, Uuid::new_v4(), guest.id, ParticipantStatus::Interested)
            .await
            .unwrap();
        assert!(matches!(outcome, JoinOutcome::EventMissing));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_cap_cannot_drop_below_attendance(pool: PgPool) {
        let host = seed_profile(&pool, "Host", None).await;
        let a = seed_profile(&pool, "A", None).await;
        let b = seed_profile(&pool, "B", None).await;
        let event = seed_event(&pool, host.id, Some(3)).await;
        join_event(&pool, event.id, a.id, ParticipantStatus::Interested).await.unwrap();
        join_event(&pool, event.id, b.id, ParticipantStatus::Confirmed).await.unwrap();

        let lower = EventChanges {
            max_participants: Some(Some(2)),
            ..Default::default()
        };
        let outcome = update_event(&pool, event.id, &lower).await.unwrap();
        assert!(matches!(outcome, EventUpdate::BelowAttendance { attending: 3 }));
        let unchanged = get_event(&pool, event.id).await.unwrap().unwrap();
        assert_eq!(unchanged.max_participants, Some(3));

        let exact = EventChanges {
            max_participants: Some(Some(3)),
            title: Some("Game night".to_string()),
            ..Default::default()
        };
        let EventUpdate::Updated(updated) = update_event(&pool, event.id, &exact).await.unwrap()
        else {
            panic!("update at current attendance should succeed");
        };
        assert_eq!(updated.title, "Game night");
        assert!(updated.is_full());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_cap_can_be_removed(pool: PgPool) {
        let host = seed_profile(&pool, "Host", None).await;
        let event = seed_event(&pool, host.id, Some(1)).await;
        assert!(event.is_full());

        let uncap = EventChanges {
            max_participants: Some(None),
            ..Default::default()
        };
        let EventUpdate::Updated(updated) = update_event(&pool, event.id, &uncap).await.unwrap()
        else {
            panic!("removing the cap should succeed");
        };
        assert_eq!(updated.max_participants, None);
        assert_eq!(updated.available_spots(), None);
        assert_eq!(updated.location.as_deref(), Some("Library"));

        let outcome = update_event(&pool, Uuid::new_v4(), &uncap).await.unwrap();
        assert!(matches!(outcome, EventUpdate::Missing));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_filters_category_and_past(pool: PgPool) {
        let host = seed_profile(&pool, "Host", None).await;
        let upcoming = seed_event(&pool, host.id, None).await;
        let past = create_event(
            &pool,
            &NewEvent {
                created_by: host.id,
                title: "Last week".to_string(),
                description: None,
                location: None,
                event_date: Utc::now() - Duration::days(7),
                max_participants: None,
                category: Some("games".to_string()),
            },
        )
        .await
        .unwrap();

        let ids = |events: Vec<EventRow>| events.into_iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids(list_events(&pool, Some("GAMES"), false).await.unwrap()), vec![upcoming.id]);
        assert_eq!(
            ids(list_events(&pool, Some("games"), true).await.unwrap()),
            vec![past.id, upcoming.id]
        );
        assert!(list_events(&pool, Some("outdoors"), true).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_leave_and_cascade(pool: PgPool) {
        let host = seed_profile(&pool, "Host", None).await;
        let guest = seed_profile(&pool, "Guest", None).await;
        let event = seed_event(&pool, host.id, None).await;
        join_event(&pool, event.id, guest.id, ParticipantStatus::Interested).await.unwrap();

        assert!(leave_event(&pool, event.id, guest.id).await.unwrap());
        assert!(!leave_event(&pool, event.id, guest.id).await.unwrap());

        assert!(delete_event(&pool, event.id).await.unwrap());
        assert!(list_participants(&pool, event.id).await.unwrap().is_empty());
    }
}
