use crate::uuid::ShortUuid;
use uuid::Uuid;

/// Characteristic User Description.
pub const USER_DESCRIPTION_UUID: u16 = 0x2901;

#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub uuid: Uuid,
    pub value: Vec<u8>,
}

impl Descriptor {
    pub fn user_description(text: &str) -> Self {
        Descriptor {
            uuid: Uuid::from_short(USER_DESCRIPTION_UUID),
            value: text.as_bytes().to_vec(),
        }
    }
}
