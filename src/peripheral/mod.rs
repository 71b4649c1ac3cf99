#[cfg(target_os = "linux")]
mod bluez;
#[cfg(target_os = "linux")]
pub use self::bluez::Peripheral;
pub mod subscribers;

use crate::{
    error::Error,
    gatt::{advertisement::Advertisement, service::Service},
};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait PeripheralImpl: Send {
    async fn is_powered(&mut self) -> Result<bool, Error>;

    async fn is_advertising(&mut self) -> Result<bool, Error>;

    async fn start_advertising(&mut self, advertisement: &Advertisement) -> Result<(), Error>;

    async fn stop_advertising(&mut self) -> Result<(), Error>;

    async fn add_service(&mut self, service: &Service) -> Result<(), Error>;

    async fn update_characteristic(
        &mut self,
        characteristic: Uuid,
        value: Vec<u8>,
    ) -> Result<(), Error>;
}
