pub mod application;
pub mod codec;
pub mod config;
pub mod error;
pub mod gatt;
pub mod profile;
pub mod server;
pub mod uuid;

pub mod peripheral;
#[cfg(target_os = "linux")]
pub use self::peripheral::Peripheral;
pub use self::peripheral::PeripheralImpl;
