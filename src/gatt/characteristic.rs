use super::{descriptor::Descriptor, properties::Properties};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Characteristic {
    pub uuid: Uuid,
    pub properties: Properties,
    pub descriptors: Vec<Descriptor>,
}

impl Characteristic {
    pub fn new(uuid: Uuid, properties: Properties) -> Self {
        Characteristic {
            uuid,
            properties,
            descriptors: Vec::new(),
        }
    }

    pub fn with_descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }
}
