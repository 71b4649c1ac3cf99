pub mod fitness_machine;
pub mod generic_access;
pub mod heart_rate;
pub mod value_source;

use crate::{
    codec::{self, IndoorBikeDataLayout},
    gatt::{characteristic::Characteristic, service::Service},
};
use uuid::Uuid;
use value_source::ValueSource;

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Static(Vec<u8>),
    Status(u8),
    HeartRate,
    IndoorBikeData(IndoorBikeDataLayout),
    ControlPoint,
}

impl ValueKind {
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            ValueKind::Status(_) | ValueKind::HeartRate | ValueKind::IndoorBikeData(_)
        )
    }

    pub fn compute(&self, source: &mut dyn ValueSource) -> Option<Vec<u8>> {
        match self {
            ValueKind::Static(bytes) => Some(bytes.clone()),
            ValueKind::Status(code) => Some(vec![*code]),
            ValueKind::HeartRate => Some(codec::encode_heart_rate(source.heart_rate()).to_vec()),
            ValueKind::IndoorBikeData(layout) => Some(layout.encode(&source.bike_sample())),
            ValueKind::ControlPoint => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileCharacteristic {
    pub definition: Characteristic,
    pub kind: ValueKind,
}

impl ProfileCharacteristic {
    pub fn new(definition: Characteristic, kind: ValueKind) -> Self {
        ProfileCharacteristic { definition, kind }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileService {
    pub uuid: Uuid,
    pub primary: bool,
    pub characteristics: Vec<ProfileCharacteristic>,
}

impl ProfileService {
    pub fn new(uuid: Uuid, primary: bool) -> Self {
        ProfileService {
            uuid,
            primary,
            characteristics: Vec::new(),
        }
    }

    pub fn with_characteristic(mut self, definition: Characteristic, kind: ValueKind) -> Self {
        self.characteristics
            .push(ProfileCharacteristic::new(definition, kind));
        self
    }

    pub fn definition(&self) -> Service {
        Service {
            uuid: self.uuid,
            primary: self.primary,
            characteristics: self
                .characteristics
                .iter()
                .map(|c| c.definition.clone())
                .collect(),
        }
    }
}
