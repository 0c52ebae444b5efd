//! Write serialization for the shared metadata document
//!
//! Every intake mutation is a read-modify-write of one document. Without a
//! lock, two mutations that overlap in time both read the same snapshot and
//! the later write silently drops the earlier one.
//!
//! Under `PerOwner` a writer first queues behind earlier writers of the same
//! owner, then takes the store-wide commit lock for the document write. All
//! owners share the document, so the commit lock is never skipped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use dossier_core::WriteLockPolicy;
use tokio::sync::{Mutex, OwnedMutexGuard};

type OwnerMap = Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>;

/// Held for the duration of one read-modify-write sequence
pub struct WriteGuard {
    commit: Option<OwnedMutexGuard<()>>,
    owner: Option<OwnerSlot>,
}

struct OwnerSlot {
    owner_id: String,
    guard: Option<OwnedMutexGuard<()>>,
    owners: OwnerMap,
}

impl WriteGuard {
    fn unlocked() -> Self {
        Self {
            commit: None,
            owner: None,
        }
    }

    pub fn is_held(&self) -> bool {
        self.commit.is_some()
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        self.commit.take();
        if let Some(mut slot) = self.owner.take() {
            slot.guard.take();
            let mut owners = slot.owners.lock().unwrap_or_else(|e| e.into_inner());
            // Only the map still references the lock: nobody holds or waits on it
            if owners
                .get(&slot.owner_id)
                .is_some_and(|lock| Arc::strong_count(lock) == 1)
            {
                owners.remove(&slot.owner_id);
            }
        }
    }
}

#[derive(Clone)]
pub struct OwnerLocks {
    policy: WriteLockPolicy,
    store: Arc<Mutex<()>>,
    owners: OwnerMap,
}

impl OwnerLocks {
    pub fn new(policy: WriteLockPolicy) -> Self {
        Self {
            policy,
            store: Arc::new(Mutex::new(())),
            owners: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    pub fn policy(&self) -> WriteLockPolicy {
        self.policy
    }

    /// Wait for the right to mutate `owner_id`'s data under the configured
    /// policy.
    pub async fn acquire(&self, owner_id: &str) -> WriteGuard {
        match self.policy {
            WriteLockPolicy::None => WriteGuard::unlocked(),
            WriteLockPolicy::Store => WriteGuard {
                commit: Some(self.store.clone().lock_owned().await),
                owner: None,
            },
            WriteLockPolicy::PerOwner => {
                let lock = {
                    let mut owners = self.owners.lock().unwrap_or_else(|e| e.into_inner());
                    owners
                        .entry(owner_id.to_string())
                        .or_insert_with(|| Arc::new(Mutex::new(())))
                        .clone()
                };
                // The slot exists before the first await so a dropped
                // acquire still runs the eviction check.
                let mut guard = WriteGuard {
                    commit: None,
                    owner: Some(OwnerSlot {
                        owner_id: owner_id.to_string(),
                        guard: None,
                        owners: self.owners.clone(),
                    }),
                };
                let owner_guard = lock.lock_owned().await;
                if let Some(slot) = guard.owner.as_mut() {
                    slot.guard = Some(owner_guard);
                }
                guard.commit = Some(self.store.clone().lock_owned().await);
                guard
            }
        }
    }

    /// Number of owners with a live per-owner lock entry
    pub fn tracked_owners(&self) -> usize {
        self.owners.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_none_policy_never_blocks() {
        let locks = OwnerLocks::new(WriteLockPolicy::None);
        let first = locks.acquire("PAN001").await;
        let second = locks.acquire("PAN001").await;
        assert!(!first.is_held());
        assert!(!second.is_held());
    }

    #[tokio::test]
    async fn test_per_owner_commit_waits_for_other_owners() {
        let locks = OwnerLocks::new(WriteLockPolicy::PerOwner);
        let held = locks.acquire("PAN001").await;
        assert!(held.is_held());

        let same = tokio::time::timeout(Duration::from_millis(50), locks.acquire("PAN001")).await;
        assert!(same.is_err());

        let other = tokio::time::timeout(Duration::from_millis(50), locks.acquire("PAN002")).await;
        assert!(other.is_err());

        drop(held);
        let other = tokio::time::timeout(Duration::from_millis(50), locks.acquire("PAN002")).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_per_owner_entries_evicted_after_release() {
        let locks = OwnerLocks::new(WriteLockPolicy::PerOwner);
        for owner in ["PAN001", "PAN002", "PAN003"] {
            let guard = locks.acquire(owner).await;
            assert_eq!(locks.tracked_owners(), 1);
            drop(guard);
        }
        assert_eq!(locks.tracked_owners(), 0);
    }

    #[tokio::test]
    async fn test_per_owner_entry_kept_while_waiter_queued() {
        let locks = OwnerLocks::new(WriteLockPolicy::PerOwner);
        let held = locks.acquire("PAN001").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("PAN001").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(held);
        assert_eq!(locks.tracked_owners(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.tracked_owners(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_acquire_does_not_leak_entry() {
        let locks = OwnerLocks::new(WriteLockPolicy::PerOwner);
        let held = locks.acquire("PAN001").await;

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), locks.acquire("PAN001")).await;
        assert!(abandoned.is_err());

        drop(held);
        assert_eq!(locks.tracked_owners(), 0);
    }

    #[tokio::test]
    async fn test_store_policy_blocks_every_owner() {
        let locks = OwnerLocks::new(WriteLockPolicy::Store);
        let held = locks.acquire("PAN001").await;

        let other = tokio::time::timeout(Duration::from_millis(50), locks.acquire("PAN002")).await;
        assert!(other.is_err());

        drop(held);
        let other = tokio::time::timeout(Duration::from_millis(50), locks.acquire("PAN002")).await;
        assert!(other.is_ok());
    }
}
