use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Advertisement {
    pub local_name: String,
    pub service_uuids: Vec<Uuid>,
    pub service_data: BTreeMap<Uuid, Vec<u8>>,
}
