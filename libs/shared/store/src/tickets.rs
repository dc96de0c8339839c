use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use uuid::Uuid;

/// Monotonic ticket sequence keyed by (doctor, calendar day). Queue numbers
/// come from here, never from reading the current maximum over stored
/// entries - the increment is atomic, so concurrent check-ins cannot be
/// handed the same number.
#[derive(Default)]
pub struct TicketCounters {
    counters: Mutex<HashMap<(Uuid, NaiveDate), u32>>,
}

impl TicketCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next ticket number for the doctor's day, starting at 1.
    pub fn next(&self, doctor_id: Uuid, date: NaiveDate) -> u32 {
        let mut counters = self.counters.lock().unwrap();
        let counter = counters.entry((doctor_id, date)).or_insert(0);
        *counter += 1;
        *counter
    }
}
