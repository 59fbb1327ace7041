use chrono::Utc;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::db::SCHEMA_VERSION;
use crate::models::profile::{ContactPatch, Section, UserProfile, PROFILE_ID};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt profile document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Change notification published after every successful profile mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileEvent {
    Updated,
    Wiped,
}

/// Repository owning the singleton profile row.
///
/// All mutations go through the public operations here; callers never
/// read-modify-write the whole document themselves. Failures are fatal to the
/// triggering operation; local storage errors are not treated as transient,
/// so there is no retry.
#[derive(Clone)]
pub struct ProfileStore {
    pool: SqlitePool,
    events: broadcast::Sender<ProfileEvent>,
}

impl ProfileStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (events, _) = broadcast::channel(16);
        ProfileStore { pool, events }
    }

    /// Subscribes to profile change events. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<ProfileEvent> {
        self.events.subscribe()
    }

    /// Idempotent singleton creation. Safe to call on every entry point that
    /// needs profile data; a second call never creates a second row.
    pub async fn ensure_exists(&self) -> Result<(), StoreError> {
        let scaffold = serde_json::to_value(UserProfile::empty(Utc::now()))?;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO user_profile (id, document, schema_version) VALUES (?1, ?2, ?3)",
        )
        .bind(PROFILE_ID)
        .bind(&scaffold)
        .bind(SCHEMA_VERSION)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!("Created empty profile scaffold");
        }
        Ok(())
    }

    /// Returns the current profile, or `None` before the first
    /// `ensure_exists` call.
    pub async fn get(&self) -> Result<Option<UserProfile>, StoreError> {
        match self.document().await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Merges the given subset of contact fields into the existing contact
    /// record and stamps `updatedAt`. No-op when no profile row exists;
    /// callers must `ensure_exists` first.
    pub async fn update_contact(&self, patch: ContactPatch) -> Result<(), StoreError> {
        let Some(doc) = self.document().await? else {
            warn!("update_contact called before profile initialization; ignoring");
            return Ok(());
        };

        let mut profile: UserProfile = serde_json::from_value(doc)?;
        profile.contact.apply(patch);
        profile.updated_at = Utc::now();

        self.write_document(&serde_json::to_value(&profile)?)
            .await?;
        let _ = self.events.send(ProfileEvent::Updated);
        Ok(())
    }

    /// Wholesale-replaces one named section with the given value and stamps
    /// `updatedAt`. The store performs no shape validation; that is the form
    /// layer's job; readers normalize `skills` defensively. No-op when no
    /// profile row exists.
    pub async fn replace_section(&self, section: Section, value: Value) -> Result<(), StoreError> {
        let Some(mut doc) = self.document().await? else {
            warn!("replace_section called before profile initialization; ignoring");
            return Ok(());
        };

        doc[section.as_str()] = value;
        doc["updatedAt"] = json!(Utc::now());

        self.write_document(&doc).await?;
        debug!("Replaced profile section '{}'", section.as_str());
        let _ = self.events.send(ProfileEvent::Updated);
        Ok(())
    }

    /// Irreversibly deletes all profile and resume rows. The store stays
    /// empty until the next `ensure_exists`.
    pub async fn wipe_all(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM user_profile")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM resumes").execute(&mut *tx).await?;
        tx.commit().await?;

        info!("Wiped all local data");
        let _ = self.events.send(ProfileEvent::Wiped);
        Ok(())
    }

    async fn document(&self) -> Result<Option<Value>, StoreError> {
        Ok(
            sqlx::query_scalar("SELECT document FROM user_profile WHERE id = ?1")
                .bind(PROFILE_ID)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn write_document(&self, doc: &Value) -> Result<(), StoreError> {
        sqlx::query("UPDATE user_profile SET document = ?1 WHERE id = ?2")
            .bind(doc)
            .bind(PROFILE_ID)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn store() -> ProfileStore {
        ProfileStore::new(test_pool().await)
    }

    #[tokio::test]
    async fn test_ensure_exists_is_idempotent() {
        let store = store().await;
        store.ensure_exists().await.unwrap();
        store.ensure_exists().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_profile")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_get_before_ensure_returns_none() {
        let store = store().await;
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_contact_merges_partial_fields() {
        let store = store().await;
        store.ensure_exists().await.unwrap();

        store
            .update_contact(ContactPatch {
                full_name: Some("Laura Secord".to_string()),
                ..ContactPatch::default()
            })
            .await
            .unwrap();
        store
            .update_contact(ContactPatch {
                city: Some("Queenston".to_string()),
                ..ContactPatch::default()
            })
            .await
            .unwrap();

        let profile = store.get().await.unwrap().unwrap();
        assert_eq!(profile.contact.full_name, "Laura Secord");
        assert_eq!(profile.contact.city, "Queenston");
    }

    #[tokio::test]
    async fn test_update_contact_without_profile_is_noop() {
        let store = store().await;
        store
            .update_contact(ContactPatch {
                email: Some("nobody@example.ca".to_string()),
                ..ContactPatch::default()
            })
            .await
            .unwrap();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_skills_round_trips_and_bumps_updated_at() {
        let store = store().await;
        store.ensure_exists().await.unwrap();
        let before = store.get().await.unwrap().unwrap().updated_at;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .replace_section(
                Section::Skills,
                json!({"technical": ["Go"], "soft": ["Leadership"]}),
            )
            .await
            .unwrap();

        let profile = store.get().await.unwrap().unwrap();
        assert_eq!(profile.skills.technical, vec!["Go"]);
        assert_eq!(profile.skills.soft, vec!["Leadership"]);
        assert!(profile.updated_at > before);
    }

    #[tokio::test]
    async fn test_read_normalizes_v1_skills_written_by_caller() {
        // The store accepts whatever shape the caller hands it; the flat v1
        // list must come back coerced to the structured form.
        let store = store().await;
        store.ensure_exists().await.unwrap();

        store
            .replace_section(Section::Skills, json!(["Python", "SQL"]))
            .await
            .unwrap();

        let profile = store.get().await.unwrap().unwrap();
        assert_eq!(profile.skills.technical, vec!["Python", "SQL"]);
        assert!(profile.skills.soft.is_empty());
    }

    #[tokio::test]
    async fn test_wipe_all_empties_the_store() {
        let store = store().await;
        store.ensure_exists().await.unwrap();
        store.wipe_all().await.unwrap();

        assert!(store.get().await.unwrap().is_none());

        // Lazy re-creation works after a wipe.
        store.ensure_exists().await.unwrap();
        assert!(store.get().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_subscribers_see_mutation_events() {
        let store = store().await;
        store.ensure_exists().await.unwrap();
        let mut events = store.subscribe();

        store
            .replace_section(Section::Certifications, json!([]))
            .await
            .unwrap();
        store.wipe_all().await.unwrap();

        assert_eq!(events.recv().await.unwrap(), ProfileEvent::Updated);
        assert_eq!(events.recv().await.unwrap(), ProfileEvent::Wiped);
    }
}
