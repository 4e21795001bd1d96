//! Per-student async mutexes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Serializes mutating journey operations per student. Different
/// students never contend.
#[derive(Default)]
pub struct StudentLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl StudentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and hold the lock for `student_id`.
    pub async fn acquire(&self, student_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // Drop entries nobody is holding or waiting on.
            map.retain(|id, m| *id == student_id || Arc::strong_count(m) > 1);
            map.entry(student_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_student_is_serialized() {
        let locks = Arc::new(StudentLocks::new());
        let id = Uuid::new_v4();
        let guard = locks.acquire(id).await;

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.acquire(id).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_students_do_not_contend() {
        let locks = StudentLocks::new();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let b =
            tokio::time::timeout(Duration::from_millis(100), locks.acquire(Uuid::new_v4())).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = StudentLocks::new();
        for _ in 0..5 {
            let _g = locks.acquire(Uuid::new_v4()).await;
        }
        let _g = locks.acquire(Uuid::new_v4()).await;
        assert_eq!(locks.tracked().await, 1);
    }
}
