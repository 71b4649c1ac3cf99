use uuid::Uuid;

use super::{ProfileService, ValueKind};
use crate::{
    codec,
    config::ServerConfig,
    gatt::{characteristic::Characteristic, properties::Properties},
    uuid::ShortUuid,
};

pub const SERVICE_UUID: u16 = 0x1800;
pub const DEVICE_NAME_UUID: u16 = 0x2A00;
pub const APPEARANCE_UUID: u16 = 0x2A01;
pub const PREFERRED_CONNECTION_PARAMETERS_UUID: u16 = 0x2A04;

pub fn service(config: &ServerConfig) -> ProfileService {
    let read = |uuid: u16| Characteristic::new(Uuid::from_short(uuid), Properties::READ);

    ProfileService::new(Uuid::from_short(SERVICE_UUID), true)
        .with_characteristic(
            read(DEVICE_NAME_UUID),
            ValueKind::Static(config.device_name.as_bytes().to_vec()),
        )
        .with_characteristic(
            read(APPEARANCE_UUID),
            ValueKind::Static(codec::encode_u16_le(config.appearance).to_vec()),
        )
        .with_characteristic(
            read(PREFERRED_CONNECTION_PARAMETERS_UUID),
            ValueKind::Static(config.connection_parameters.encode().to_vec()),
        )
}
