use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    config::ServerConfig,
    error::{Error, ErrorType},
    gatt::{advertisement::Advertisement, service::Service},
    peripheral::PeripheralImpl,
    profile::{fitness_machine, generic_access, heart_rate, ProfileCharacteristic, ProfileService},
    uuid::ShortUuid,
};

#[derive(Debug, Clone)]
pub struct Application {
    services: Vec<ProfileService>,
    advertisement: Advertisement,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    pub fn fitness_machine(config: &ServerConfig) -> Result<Self, Error> {
        let mut builder = Application::builder()
            .advertisement(fitness_machine::advertisement(config))
            .service(fitness_machine::service(config))
            .service(heart_rate::service())
            .advertise(Uuid::from_short(heart_rate::SERVICE_UUID));
        if config.generic_access {
            builder = builder.service(generic_access::service(config));
        }
        builder.build()
    }

    pub fn services(&self) -> &[ProfileService] {
        &self.services
    }

    pub fn advertisement(&self) -> &Advertisement {
        &self.advertisement
    }

    pub fn definitions(&self) -> Vec<Service> {
        self.services
            .iter()
            .map(ProfileService::definition)
            .collect()
    }

    pub fn characteristics(&self) -> impl Iterator<Item = (Uuid, &ProfileCharacteristic)> {
        self.services.iter().flat_map(|service| {
            service
                .characteristics
                .iter()
                .map(move |characteristic| (service.uuid, characteristic))
        })
    }

    pub async fn register<P>(&self, peripheral: &mut P) -> Result<(), Error>
    where
        P: PeripheralImpl + ?Sized,
    {
        for service in self.definitions() {
            peripheral.add_service(&service).await?;
            log::info!(
                "Registered service {} with {} characteristics",
                service.uuid,
                service.characteristics.len()
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ApplicationBuilder {
    services: Vec<ProfileService>,
    advertisement: Advertisement,
}

impl ApplicationBuilder {
    pub fn service(mut self, service: ProfileService) -> Self {
        self.services.push(service);
        self
    }

    pub fn advertisement(mut self, advertisement: Advertisement) -> Self {
        self.advertisement = advertisement;
        self
    }

    pub fn advertise(mut self, uuid: Uuid) -> Self {
        if !self.advertisement.service_uuids.contains(&uuid) {
            self.advertisement.service_uuids.push(uuid);
        }
        self
    }

    /// Characteristic UUIDs must be unique across the whole catalog, since
    /// the transport addresses values by characteristic alone.
    pub fn build(self) -> Result<Application, Error> {
        let mut seen = HashSet::new();
        for service in &self.services {
            for characteristic in &service.characteristics {
                if !seen.insert(characteristic.definition.uuid) {
                    return Err(Error::new(
                        String::from("Duplicate characteristic"),
                        format!("{} registered twice", characteristic.definition.uuid),
                        ErrorType::Config,
                    ));
                }
            }
        }
        Ok(Application {
            services: self.services,
            advertisement: self.advertisement,
        })
    }
}
