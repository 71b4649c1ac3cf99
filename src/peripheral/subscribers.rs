use std::collections::HashMap;

use uuid::Uuid;

#[derive(Debug)]
pub struct Subscribers<W> {
    writers: HashMap<Uuid, HashMap<String, W>>,
}

impl<W> Default for Subscribers<W> {
    fn default() -> Self {
        Subscribers {
            writers: HashMap::new(),
        }
    }
}

impl<W: Clone> Subscribers<W> {
    /// Returns `true` when `client` is the first subscriber of `characteristic`.
    pub fn insert(&mut self, characteristic: Uuid, client: String, writer: W) -> bool {
        let clients = self.writers.entry(characteristic).or_default();
        let first = clients.is_empty();
        clients.insert(client, writer);
        first
    }

    /// Returns `true` when `client` was the last subscriber of `characteristic`.
    pub fn remove(&mut self, characteristic: &Uuid, client: &str) -> bool {
        let Some(clients) = self.writers.get_mut(characteristic) else {
            return false;
        };
        if clients.remove(client).is_none() {
            return false;
        }
        if clients.is_empty() {
            self.writers.remove(characteristic);
            return true;
        }
        false
    }

    pub fn writers(&self, characteristic: &Uuid) -> Vec<W> {
        self.writers
            .get(characteristic)
            .map(|clients| clients.values().cloned().collect())
            .unwrap_or_default()
    }
}
