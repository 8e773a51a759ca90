use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::models::profile::{ProfileRow, ProfileSummary};
use crate::profiles::validation::{NewProfile, ProfileChanges};

/// Profile columns plus the tag tables folded into ordered arrays.
const PROFILE_SELECT: &str = r#"
    SELECT p.id, p.name, p.bio, p.city, p.neighborhood, p.availability,
           ARRAY(SELECT i.tag FROM interests i
                 WHERE i.profile_id = p.id ORDER BY i.position) AS interests,
           ARRAY(SELECT a.activity FROM activities a
                 WHERE a.profile_id = p.id ORDER BY a.position) AS activities,
           p.created_at, p.updated_at
    FROM profiles p
"#;

/// All profiles, newest first.
pub async fn list_profiles(pool: &PgPool) -> Result<Vec<ProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>(&format!(
        "{PROFILE_SELECT} ORDER BY p.created_at DESC, p.id"
    ))
    .fetch_all(pool)
    .await
}

/// Every profile except `id`, newest first.
pub async fn list_profiles_except(pool: &PgPool, id: Uuid) -> Result<Vec<ProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>(&format!(
        "{PROFILE_SELECT} WHERE p.id <> $1 ORDER BY p.created_at DESC, p.id"
    ))
    .bind(id)
    .fetch_all(pool)
    .await
}

pub async fn get_profile(pool: &PgPool, id: Uuid) -> Result<Option<ProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>(&format!("{PROFILE_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_profiles_by_ids(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<Vec<ProfileRow>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    sqlx::query_as::<_, ProfileRow>(&format!("{PROFILE_SELECT} WHERE p.id = ANY($1)"))
        .bind(ids)
        .fetch_all(pool)
        .await
}

pub async fn get_summaries(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<ProfileSummary>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    sqlx::query_as::<_, ProfileSummary>(
        "SELECT id, name, bio, city FROM profiles WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub async fn profile_exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Inserts the profile row and its tags in one transaction.
pub async fn create_profile(pool: &PgPool, new: &NewProfile) -> Result<ProfileRow, sqlx::Error> {
    let id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO profiles (id, name, bio, city, neighborhood, availability)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(&new.name)
    .bind(&new.bio)
    .bind(&new.city)
    .bind(&new.neighborhood)
    .bind(new.availability.map(|a| a.as_str()))
    .execute(&mut *tx)
    .await?;

    replace_interests(&mut tx, id, &new.interests).await?;
    replace_activities(&mut tx, id, &new.activities).await?;
    tx.commit().await?;

    info!("Created profile {id} ({})", new.name);

    get_profile(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

/// Applies a partial update. Returns `None` when the profile does not exist.
pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    changes: &ProfileChanges,
) -> Result<Option<ProfileRow>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let updated: Option<Uuid> = sqlx::query_scalar(
        r#"
        UPDATE profiles SET
            name         = COALESCE($2, name),
            bio          = CASE WHEN $3 THEN $4 ELSE bio END,
            city         = CASE WHEN $5 THEN $6 ELSE city END,
            neighborhood = CASE WHEN $7 THEN $8 ELSE neighborhood END,
            availability = CASE WHEN $9 THEN $10 ELSE availability END,
            updated_at   = now()
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(&changes.name)
    .bind(changes.bio.is_some())
    .bind(changes.bio.clone().flatten())
    .bind(changes.city.is_some())
    .bind(changes.city.clone().flatten())
    .bind(changes.neighborhood.is_some())
    .bind(changes.neighborhood.clone().flatten())
    .bind(changes.availability.is_some())
    .bind(changes.availability.flatten().map(|a| a.as_str()))
    .fetch_optional(&mut *tx)
    .await?;

    if updated.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }

    if let Some(interests) = &changes.interests {
        replace_interests(&mut tx, id, interests).await?;
    }
    if let Some(activities) = &changes.activities {
        replace_activities(&mut tx, id, activities).await?;
    }
    tx.commit().await?;

    info!("Updated profile {id}");
    get_profile(pool, id).await
}

/// Deletes a profile; tags, connections, messages and RSVPs cascade.
pub async fn delete_profile(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() > 0 {
        info!("Deleted profile {id}");
    }
    Ok(result.rows_affected() > 0)
}

async fn replace_interests(
    tx: &mut Transaction<'_, Postgres>,
    profile_id: Uuid,
    tags: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM interests WHERE profile_id = $1")
        .bind(profile_id)
        .execute(&mut **tx)
        .await?;
    if tags.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        INSERT INTO interests (profile_id, tag, position)
        SELECT $1, t.tag, t.ord::int
        FROM UNNEST($2::text[]) WITH ORDINALITY AS t(tag, ord)
        "#,
    )
    .bind(profile_id)
    .bind(tags)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn replace_activities(
    tx: &mut Transaction<'_, Postgres>,
    profile_id: Uuid,
    activities: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM activities WHERE profile_id = $1")
        .bind(profile_id)
        .execute(&mut **tx)
        .await?;
    if activities.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        INSERT INTO activities (profile_id, activity, position)
        SELECT $1, t.activity, t.ord::int
        FROM UNNEST($2::text[]) WITH ORDINALITY AS t(activity, ord)
        "#,
    )
    .bind(profile_id)
    .bind(activities)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Inserts a minimal profile for database tests in other modules.
#[cfg(test)]
pub(crate) async fn seed_profile(pool: &PgPool, name: &str, city: Option<&str>) -> ProfileRow {
    let new = NewProfile {
        name: name.to_string(),
        bio: None,
        city: city.map(str::to_string),
        neighborhood: None,
        availability: None,
        interests: vec![],
        activities: vec![],
    };
    create_profile(pool, &new).await.unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::Availability;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_tags_keep_their_order(pool: PgPool) {
        let new = NewProfile {
            name: "Ana".to_string(),
            bio: None,
            city: Some("Oakland".to_string()),
            neighborhood: None,
            availability: Some(Availability::Weekend),
            interests: vec!["jazz".to_string(), "chess".to_string(), "art".to_string()],
            activities: vec!["climbing".to_string()],
        };
        let created = create_profile(&pool, &new).await.unwrap();
        assert_eq!(created.interests, vec!["jazz", "chess", "art"]);
        assert_eq!(created.availability(), Some(Availability::Weekend));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_clears_and_replaces(pool: PgPool) {
        let ana = seed_profile(&pool, "Ana", Some("Oakland")).await;
        let changes = ProfileChanges {
            city: Some(None),
            interests: Some(vec!["hiking".to_string()]),
            ..Default::default()
        };
        let updated = update_profile(&pool, ana.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.name, "Ana");
        assert_eq!(updated.city, None);
        assert_eq!(updated.interests, vec!["hiking"]);

        assert!(update_profile(&pool, Uuid::new_v4(), &changes).await.unwrap().is_none());
    }
}
