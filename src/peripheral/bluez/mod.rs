mod bluez_utils;
mod characteristic_utils;

use crate::{
    error::{Error, ErrorType},
    gatt::{
        advertisement,
        peripheral_event::{PeripheralEvent, PeripheralRequest},
        service,
    },
};
use async_trait::async_trait;
use bluer::{
    adv::{Advertisement, AdvertisementHandle},
    gatt::{
        local::{Application, ApplicationHandle, CharacteristicControlEvent},
        CharacteristicWriter,
    },
    Adapter, AdapterEvent, AdapterProperty,
};
use bluez_utils::CharNotifyHandler;
use characteristic_utils::parse_services;
use futures::{channel::oneshot, Stream, StreamExt};
use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
};
use tokio::sync::mpsc::Sender;
use uuid::Uuid;

use super::{subscribers::Subscribers, PeripheralImpl};

type Writers = Arc<Mutex<Subscribers<Arc<CharacteristicWriter>>>>;

#[derive(Debug)]
pub struct Peripheral {
    pub adapter: Adapter,
    services: Vec<service::Service>,
    adv_handle: Option<AdvertisementHandle>,
    app_handle: Option<ApplicationHandle>,
    sender_tx: Sender<PeripheralEvent>,
    writers: Writers,
    _drop_tx: oneshot::Sender<()>,
}

impl Peripheral {
    pub async fn new(sender_tx: Sender<PeripheralEvent>) -> Result<Self, Error> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;
        adapter.set_powered(true).await?;
        log::debug!(
            "Initialize Bluetooth adapter {} with address {}",
            adapter.name(),
            adapter.address().await?
        );

        let (drop_tx, drop_rx) = oneshot::channel();
        match adapter.events().await {
            Ok(adapter_stream) => {
                let sender = sender_tx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = forward_adapter_events(adapter_stream, sender) => {},
                        _ = drop_rx => {}
                    }
                });
            }
            Err(err) => log::warn!("Adapter events unavailable: {}", err),
        }

        Ok(Peripheral {
            adapter,
            services: Vec::new(),
            adv_handle: None,
            app_handle: None,
            sender_tx,
            writers: Arc::new(Mutex::new(Subscribers::default())),
            _drop_tx: drop_tx,
        })
    }

    fn setup_char_handlers(&mut self, handlers: Vec<CharNotifyHandler>) {
        for mut handler in handlers {
            let sender_tx = self.sender_tx.clone();
            let writers = self.writers.clone();

            tokio::spawn(async move {
                while let Some(event) = handler.control.next().await {
                    let CharacteristicControlEvent::Notify(writer) = event else {
                        continue;
                    };
                    let request = PeripheralRequest {
                        client: writer.device_address().to_string(),
                        service: handler.service_uuid,
                        characteristic: handler.characteristic_uuid,
                    };
                    tokio::spawn(track_writer(
                        Arc::new(writer),
                        request,
                        writers.clone(),
                        sender_tx.clone(),
                    ));
                }
            });
        }
    }
}

// The engine only hears about the first subscriber and the last one leaving.
async fn track_writer(
    writer: Arc<CharacteristicWriter>,
    request: PeripheralRequest,
    writers: Writers,
    sender_tx: Sender<PeripheralEvent>,
) {
    let first = match writers.lock() {
        Ok(mut writers) => writers.insert(
            request.characteristic,
            request.client.clone(),
            writer.clone(),
        ),
        Err(_) => {
            log::error!("Failed to lock writers for adding a writer");
            return;
        }
    };
    if first {
        send_subscription(&sender_tx, request.clone(), true).await;
    }

    if let Err(err) = writer.closed().await {
        log::error!("NotifyClosedErr {err:?}");
    }

    let last = match writers.lock() {
        Ok(mut writers) => writers.remove(&request.characteristic, &request.client),
        Err(_) => {
            log::error!("Failed to lock writers for removing a writer");
            false
        }
    };
    if last {
        send_subscription(&sender_tx, request, false).await;
    }
}

async fn forward_adapter_events<S>(mut events: S, sender: Sender<PeripheralEvent>)
where
    S: Stream<Item = AdapterEvent> + Unpin,
{
    while let Some(event) = events.next().await {
        let AdapterEvent::PropertyChanged(property) = event else {
            continue;
        };
        match property {
            AdapterProperty::ActiveAdvertisingInstances(i) => {
                log::debug!("ActiveAdvertisingInstances: {i}")
            }
            AdapterProperty::Powered(powered) => {
                if let Err(err) = sender
                    .send(PeripheralEvent::StateUpdate {
                        is_powered: powered,
                    })
                    .await
                {
                    log::error!("Error sending state update event: {:?}", err);
                }
            }
            _ => {}
        }
    }
}

async fn send_subscription(
    sender_tx: &Sender<PeripheralEvent>,
    request: PeripheralRequest,
    subscribed: bool,
) {
    if let Err(err) = sender_tx
        .send(PeripheralEvent::CharacteristicSubscriptionUpdate {
            request,
            subscribed,
        })
        .await
    {
        log::error!("Error sending subscription event: {:?}", err);
    }
}

#[async_trait]
impl PeripheralImpl for Peripheral {
    async fn is_powered(&mut self) -> Result<bool, Error> {
        Ok(self.adapter.is_powered().await?)
    }

    async fn is_advertising(&mut self) -> Result<bool, Error> {
        let instances = self.adapter.active_advertising_instances().await?;
        Ok(instances > 0 && self.adv_handle.is_some())
    }

    async fn start_advertising(
        &mut self,
        advertisement: &advertisement::Advertisement,
    ) -> Result<(), Error> {
        let service_uuids: BTreeSet<Uuid> = advertisement.service_uuids.iter().copied().collect();

        let le_advertisement = Advertisement {
            service_uuids,
            service_data: advertisement.service_data.clone(),
            discoverable: Some(true),
            local_name: Some(advertisement.local_name.clone()),
            ..Default::default()
        };
        let adv_handle: AdvertisementHandle = self.adapter.advertise(le_advertisement).await?;

        let (handlers, services) = parse_services(&self.services, self.sender_tx.clone());

        let app_handle = self
            .adapter
            .serve_gatt_application(Application {
                services,
                ..Default::default()
            })
            .await?;

        self.setup_char_handlers(handlers);

        self.adv_handle = Some(adv_handle);
        self.app_handle = Some(app_handle);
        Ok(())
    }

    async fn stop_advertising(&mut self) -> Result<(), Error> {
        self.adv_handle = None;
        self.app_handle = None;
        Ok(())
    }

    async fn add_service(&mut self, service: &service::Service) -> Result<(), Error> {
        if self.app_handle.is_some() {
            return Err(Error::new(
                "Application already served",
                "services must be added before advertising starts",
                ErrorType::Bluez,
            ));
        }
        self.services.push(service.clone());
        Ok(())
    }

    async fn update_characteristic(
        &mut self,
        characteristic: Uuid,
        value: Vec<u8>,
    ) -> Result<(), Error> {
        let writers = match self.writers.lock() {
            Ok(writers) => writers.writers(&characteristic),
            Err(err) => return Err(Error::from_string(err.to_string(), ErrorType::Bluez)),
        };
        if writers.is_empty() {
            log::debug!("No subscriber for {characteristic}");
            return Ok(());
        }
        for writer in writers {
            let value = value.clone();
            tokio::spawn(async move {
                if let Err(err) = writer.send(&value).await {
                    log::error!("Error sending value {err:?}")
                }
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bluer::Address;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn power_off_is_forwarded_after_device_events() {
        let (tx, mut rx) = mpsc::channel(4);
        let events = futures::stream::iter(vec![
            AdapterEvent::DeviceAdded(Address::new([1, 2, 3, 4, 5, 6])),
            AdapterEvent::DeviceRemoved(Address::new([1, 2, 3, 4, 5, 6])),
            AdapterEvent::PropertyChanged(AdapterProperty::Powered(false)),
        ]);
        forward_adapter_events(events, tx).await;
        assert!(matches!(
            rx.recv().await,
            Some(PeripheralEvent::StateUpdate { is_powered: false })
        ));
        assert!(rx.recv().await.is_none());
    }
}
