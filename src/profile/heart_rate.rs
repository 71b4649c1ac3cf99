use uuid::Uuid;

use super::{ProfileService, ValueKind};
use crate::{
    gatt::{characteristic::Characteristic, descriptor::Descriptor, properties::Properties},
    uuid::ShortUuid,
};

pub const SERVICE_UUID: u16 = 0x180D;
pub const MEASUREMENT_UUID: u16 = 0x2A37;
pub const BODY_SENSOR_LOCATION_UUID: u16 = 0x2A38;
pub const UNIT_UUID: Uuid = Uuid::from_u128(0x0000_0001_710e_4a5b_8d75_3e5b_444b_c3cf);

const BODY_SENSOR_LOCATION_CHEST: u8 = 0x01;
const UNIT: &str = "BPM";
const UNIT_DESCRIPTION: &str = "Beats Per Minute (BPM)";

pub fn service() -> ProfileService {
    ProfileService::new(Uuid::from_short(SERVICE_UUID), true)
        .with_characteristic(
            Characteristic::new(Uuid::from_short(MEASUREMENT_UUID), Properties::NOTIFY),
            ValueKind::HeartRate,
        )
        .with_characteristic(
            Characteristic::new(
                Uuid::from_short(BODY_SENSOR_LOCATION_UUID),
                Properties::READ,
            ),
            ValueKind::Static(vec![BODY_SENSOR_LOCATION_CHEST]),
        )
        .with_characteristic(
            Characteristic::new(UNIT_UUID, Properties::READ | Properties::WRITE)
                .with_descriptor(Descriptor::user_description(UNIT_DESCRIPTION)),
            ValueKind::Static(UNIT.as_bytes().to_vec()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_uuid_matches_vendor_string() {
        assert_eq!(
            Uuid::from_string("00000001-710e-4a5b-8d75-3e5b444bc3cf").unwrap(),
            UNIT_UUID
        );
    }

    #[test]
    fn unit_characteristic_has_user_description() {
        let service = service();
        let unit = &service.characteristics[2].definition;
        assert_eq!(unit.descriptors.len(), 1);
        assert_eq!(unit.descriptors[0].value, UNIT_DESCRIPTION.as_bytes());
        assert_eq!(unit.descriptors[0].uuid.to_short(), Some(0x2901));
    }
}
