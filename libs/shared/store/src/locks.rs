use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

/// Per-doctor serialization point. Operations that mutate one doctor's
/// shared state (interval set, queue order) take that doctor's lock for
/// the duration of their check-then-write section; operations for
/// different doctors proceed in parallel.
///
/// The inner async mutex is not reentrant - a holder must not call back
/// into another operation that locks the same registry.
#[derive(Default)]
pub struct DoctorLockRegistry {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl DoctorLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, doctor_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(doctor_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_doctor_serializes_different_doctors_do_not() {
        let registry = DoctorLockRegistry::new();
        let doctor_a = Uuid::new_v4();
        let doctor_b = Uuid::new_v4();

        let lock_a = registry.lock_for(doctor_a);
        let held_a = lock_a.lock().await;

        // Another doctor's lock is free.
        let lock_b = registry.lock_for(doctor_b);
        assert!(lock_b.try_lock().is_ok());

        // The same doctor's lock is the same mutex and is held.
        let lock_a_again = registry.lock_for(doctor_a);
        assert!(lock_a_again.try_lock().is_err());

        drop(held_a);
        assert!(registry.lock_for(doctor_a).try_lock().is_ok());
    }
}
