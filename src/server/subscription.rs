use uuid::Uuid;

use crate::{
    error::{Error, ErrorType},
    gatt::properties::Properties,
    profile::{value_source::ValueSource, ValueKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionState {
    #[default]
    Idle,
    Subscribed,
}

#[derive(Debug)]
pub struct CharacteristicSlot {
    pub uuid: Uuid,
    pub service: Uuid,
    pub properties: Properties,
    pub kind: ValueKind,
    state: SubscriptionState,
}

impl CharacteristicSlot {
    pub fn new(uuid: Uuid, service: Uuid, properties: Properties, kind: ValueKind) -> Self {
        CharacteristicSlot {
            uuid,
            service,
            properties,
            kind,
            state: SubscriptionState::Idle,
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn is_subscribed(&self) -> bool {
        self.state == SubscriptionState::Subscribed
    }

    /// Returns `true` only on the `Idle -> Subscribed` edge.
    pub fn subscribe(&mut self) -> Result<bool, Error> {
        if !self.properties.can_subscribe() {
            return Err(self.not_permitted("notify"));
        }
        if self.is_subscribed() {
            return Ok(false);
        }
        self.state = SubscriptionState::Subscribed;
        Ok(true)
    }

    pub fn unsubscribe(&mut self) -> bool {
        let was_subscribed = self.is_subscribed();
        self.state = SubscriptionState::Idle;
        was_subscribed
    }

    pub fn indicates(&self) -> bool {
        self.properties.contains(Properties::INDICATE)
            && !self.properties.contains(Properties::NOTIFY)
    }

    pub fn require(&self, property: Properties) -> Result<(), Error> {
        if self.properties.contains(property) {
            Ok(())
        } else {
            Err(self.not_permitted(&property.name()))
        }
    }

    pub fn read(&self, source: &mut dyn ValueSource) -> Result<Vec<u8>, Error> {
        self.require(Properties::READ)?;
        self.kind
            .compute(source)
            .ok_or_else(|| self.not_permitted("read"))
    }

    fn not_permitted(&self, operation: &str) -> Error {
        Error::new(
            format!("{} not permitted", operation),
            format!(
                "characteristic {} does not declare {}",
                self.uuid,
                operation
            ),
            ErrorType::NotPermitted,
        )
    }
}
