//! Shortlist ledger: membership, categories and the single-lock rule.
//!
//! The ledger owns the shortlist rows. It never touches the student's
//! stage; callers fire the matching stage trigger after a successful
//! lock or unlock.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::model::{Category, ShortlistCounts, ShortlistEntry};
use crate::error::JourneyError;
use crate::store::Database;

pub struct ShortlistLedger {
    db: Arc<dyn Database>,
}

impl ShortlistLedger {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Add a university, or change its category if already present.
    /// A missing category means `Target` for new entries and "keep" for
    /// existing ones. The lock flag is left untouched.
    pub async fn add_or_update(
        &self,
        student_id: Uuid,
        university_id: Uuid,
        category: Option<Category>,
    ) -> Result<ShortlistEntry, JourneyError> {
        if self.db.get_university(university_id).await?.is_none() {
            return Err(JourneyError::university_not_found(university_id));
        }

        let category = match category {
            Some(c) => c,
            None => self
                .db
                .get_shortlist_entry(student_id, university_id)
                .await?
                .map(|e| e.category)
                .unwrap_or_default(),
        };

        let entry = self
            .db
            .upsert_shortlist_entry(student_id, university_id, category)
            .await?;
        debug!(%student_id, %university_id, %category, "Shortlist entry upserted");
        Ok(entry)
    }

    /// Remove an entry. Removing an absent entry is a no-op; returns
    /// whether anything was removed.
    pub async fn remove(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<bool, JourneyError> {
        let removed = self
            .db
            .delete_shortlist_entry(student_id, university_id)
            .await?;
        if removed {
            debug!(%student_id, %university_id, "Shortlist entry removed");
        }
        Ok(removed)
    }

    /// Lock one shortlisted university. Fails with `AlreadyLocked` if the
    /// student has any locked entry, including this one.
    pub async fn lock(
        &self,
        student_id: Uuid,
        university_id: Uuid,
    ) -> Result<ShortlistEntry, JourneyError> {
        let entry = self
            .db
            .get_shortlist_entry(student_id, university_id)
            .await?
            .ok_or_else(|| JourneyError::entry_not_found(student_id, university_id))?;

        if let Some(locked) = self.db.locked_entry(student_id).await? {
            return Err(JourneyError::AlreadyLocked {
                student_id,
                locked_university_id: locked.university_id,
            });
        }

        if !self.db.try_lock_entry(student_id, university_id).await? {
            // Lost a race against a concurrent lock.
            let winner = self
                .db
                .locked_entry(student_id)
                .await?
                .map(|e| e.university_id)
                .unwrap_or(university_id);
            return Err(JourneyError::AlreadyLocked {
                student_id,
                locked_university_id: winner,
            });
        }

        info!(%student_id, %university_id, "University locked");
        Ok(ShortlistEntry {
            locked: true,
            ..entry
        })
    }

    /// Unlock a locked entry and delete the tasks scoped to that
    /// university. Returns the number of tasks removed.
    pub async fn unlock(&self, student_id: Uuid, university_id: Uuid) -> Result<u64, JourneyError> {
        let entry = self
            .db
            .get_shortlist_entry(student_id, university_id)
            .await?
            .ok_or_else(|| JourneyError::entry_not_found(student_id, university_id))?;

        if !entry.locked {
            return Err(JourneyError::InvalidState(format!(
                "university {university_id} is not locked"
            )));
        }

        let removed = self
            .db
            .unlock_entry_and_clear_tasks(student_id, university_id)
            .await?
            .ok_or_else(|| {
                JourneyError::InvalidState(format!("university {university_id} is not locked"))
            })?;

        info!(%student_id, %university_id, tasks_removed = removed, "University unlocked");
        Ok(removed)
    }

    pub async fn entries(&self, student_id: Uuid) -> Result<Vec<ShortlistEntry>, JourneyError> {
        Ok(self.db.list_shortlist(student_id).await?)
    }

    pub async fn locked(&self, student_id: Uuid) -> Result<Option<ShortlistEntry>, JourneyError> {
        Ok(self.db.locked_entry(student_id).await?)
    }

    /// Count entries per category from the stored rows.
    pub async fn recompute_counts(
        &self,
        student_id: Uuid,
    ) -> Result<ShortlistCounts, JourneyError> {
        let entries = self.db.list_shortlist(student_id).await?;
        Ok(ShortlistCounts::from_entries(&entries))
    }
}
