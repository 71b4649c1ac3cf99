use std::collections::BTreeMap;

use uuid::Uuid;

use super::{ProfileService, ValueKind};
use crate::{
    codec,
    config::ServerConfig,
    gatt::{advertisement::Advertisement, characteristic::Characteristic, properties::Properties},
    uuid::ShortUuid,
};

pub const SERVICE_UUID: u16 = 0x1826;
pub const CYCLING_POWER_SERVICE_UUID: u16 = 0x1818;

pub const FEATURE_UUID: u16 = 0x2ACC;
pub const INDOOR_BIKE_DATA_UUID: u16 = 0x2AD2;
pub const TRAINING_STATUS_UUID: u16 = 0x2AD3;
pub const SUPPORTED_RESISTANCE_LEVEL_RANGE_UUID: u16 = 0x2AD6;
pub const SUPPORTED_POWER_RANGE_UUID: u16 = 0x2AD8;
pub const CONTROL_POINT_UUID: u16 = 0x2AD9;
pub const MACHINE_STATUS_UUID: u16 = 0x2ADA;

pub const MACHINE_FEATURES: u32 = 0x0000_4003;
pub const TARGET_SETTING_FEATURES: u32 = 0x0000_E00C;

const SERVICE_DATA_AVAILABLE: u8 = 0x01;
const MACHINE_TYPE_INDOOR_BIKE: u16 = 1 << 5;

pub fn service(config: &ServerConfig) -> ProfileService {
    let chr = |uuid: u16, properties: Properties| {
        Characteristic::new(Uuid::from_short(uuid), properties)
    };

    ProfileService::new(Uuid::from_short(SERVICE_UUID), true)
        .with_characteristic(
            chr(FEATURE_UUID, Properties::READ),
            ValueKind::Static(
                codec::encode_feature(MACHINE_FEATURES, TARGET_SETTING_FEATURES).to_vec(),
            ),
        )
        .with_characteristic(
            chr(TRAINING_STATUS_UUID, Properties::READ | Properties::NOTIFY),
            ValueKind::Status(config.training_status),
        )
        .with_characteristic(
            chr(CONTROL_POINT_UUID, Properties::WRITE | Properties::INDICATE),
            ValueKind::ControlPoint,
        )
        .with_characteristic(
            chr(MACHINE_STATUS_UUID, Properties::NOTIFY),
            ValueKind::Status(config.machine_status),
        )
        .with_characteristic(
            chr(INDOOR_BIKE_DATA_UUID, Properties::READ | Properties::NOTIFY),
            ValueKind::IndoorBikeData(config.indoor_bike),
        )
        .with_characteristic(
            chr(SUPPORTED_RESISTANCE_LEVEL_RANGE_UUID, Properties::READ),
            ValueKind::Static(config.resistance_range.encode().to_vec()),
        )
        .with_characteristic(
            chr(SUPPORTED_POWER_RANGE_UUID, Properties::READ),
            ValueKind::Static(config.power_range.encode().to_vec()),
        )
}

pub fn advertisement(config: &ServerConfig) -> Advertisement {
    let fitness_machine = Uuid::from_short(SERVICE_UUID);
    let mut service_data = BTreeMap::new();
    service_data.insert(
        fitness_machine,
        codec::encode_fitness_machine_service_data(SERVICE_DATA_AVAILABLE, MACHINE_TYPE_INDOOR_BIKE)
            .to_vec(),
    );
    Advertisement {
        local_name: config.local_name.clone(),
        service_uuids: vec![Uuid::from_short(CYCLING_POWER_SERVICE_UUID), fitness_machine],
        service_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn characteristics_in_advertised_order() {
        let service = service(&ServerConfig::default());
        let order: Vec<Option<u16>> = service
            .characteristics
            .iter()
            .map(|c| c.definition.uuid.to_short())
            .collect();
        assert_eq!(
            order,
            vec![
                Some(FEATURE_UUID),
                Some(TRAINING_STATUS_UUID),
                Some(CONTROL_POINT_UUID),
                Some(MACHINE_STATUS_UUID),
                Some(INDOOR_BIKE_DATA_UUID),
                Some(SUPPORTED_RESISTANCE_LEVEL_RANGE_UUID),
                Some(SUPPORTED_POWER_RANGE_UUID),
            ]
        );
    }

    #[test]
    fn control_point_is_write_indicate() {
        let service = service(&ServerConfig::default());
        let control_point = &service.characteristics[2].definition;
        assert!(control_point.properties.contains(Properties::WRITE));
        assert!(control_point.properties.contains(Properties::INDICATE));
        assert!(!control_point.properties.contains(Properties::READ));
    }

    #[test]
    fn advertisement_carries_service_data() {
        let adv = advertisement(&ServerConfig::default());
        assert_eq!(adv.local_name, "HERL FM");
        assert_eq!(
            adv.service_data.get(&Uuid::from_short(SERVICE_UUID)),
            Some(&vec![0x01, 0x20, 0x00])
        );
        assert_eq!(adv.service_uuids.len(), 2);
    }
}
