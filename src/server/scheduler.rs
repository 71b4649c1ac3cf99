use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use uuid::Uuid;

/// Periodic re-emission of live characteristics.
#[derive(Debug)]
pub struct NotificationScheduler {
    period: Duration,
    armed: BTreeMap<Uuid, Instant>,
}

impl NotificationScheduler {
    pub fn new(period: Duration) -> Self {
        NotificationScheduler {
            period,
            armed: BTreeMap::new(),
        }
    }

    pub fn arm(&mut self, characteristic: Uuid, now: Instant) {
        self.armed.insert(characteristic, now + self.period);
    }

    pub fn disarm(&mut self, characteristic: &Uuid) -> bool {
        self.armed.remove(characteristic).is_some()
    }

    pub fn disarm_all(&mut self) {
        self.armed.clear();
    }

    pub fn is_armed(&self, characteristic: &Uuid) -> bool {
        self.armed.contains_key(characteristic)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed.values().min().copied()
    }

    pub fn due<F>(&mut self, now: Instant, still_subscribed: F) -> Vec<Uuid>
    where
        F: Fn(&Uuid) -> bool,
    {
        let period = self.period;
        let mut due = Vec::new();
        self.armed.retain(|uuid, next| {
            if *next > now {
                return true;
            }
            if !still_subscribed(uuid) {
                log::debug!("Notify timer for {uuid} cancelled");
                return false;
            }
            due.push(*uuid);
            *next += period;
            if *next <= now {
                // Fell more than a period behind; realign instead of bursting.
                *next = now + period;
            }
            true
        });
        due
    }
}
