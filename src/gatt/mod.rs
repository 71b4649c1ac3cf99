pub mod advertisement;
pub mod characteristic;
pub mod descriptor;
pub mod peripheral_event;
pub mod properties;
pub mod service;
