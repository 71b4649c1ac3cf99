use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use ftms_peripheral::{
    application::Application,
    config::ServerConfig,
    error::Error,
    gatt::{
        advertisement::Advertisement,
        peripheral_event::{
            PeripheralEvent, PeripheralRequest, ReadRequestResponse, RequestResponse,
            WriteRequestResponse,
        },
        service::Service,
    },
    profile::{fitness_machine, heart_rate, value_source::FixedValueSource},
    server::{runner, GattServer},
    uuid::ShortUuid,
    PeripheralImpl,
};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

type Updates = Arc<Mutex<Vec<(Uuid, Vec<u8>)>>>;

#[derive(Default)]
struct FakePeripheral {
    services: Vec<Service>,
    advertisement: Option<Advertisement>,
    updates: Updates,
}

#[async_trait]
impl PeripheralImpl for FakePeripheral {
    async fn is_powered(&mut self) -> Result<bool, Error> {
        Ok(true)
    }

    async fn is_advertising(&mut self) -> Result<bool, Error> {
        Ok(self.advertisement.is_some())
    }

    async fn start_advertising(&mut self, advertisement: &Advertisement) -> Result<(), Error> {
        self.advertisement = Some(advertisement.clone());
        Ok(())
    }

    async fn stop_advertising(&mut self) -> Result<(), Error> {
        self.advertisement = None;
        Ok(())
    }

    async fn add_service(&mut self, service: &Service) -> Result<(), Error> {
        self.services.push(service.clone());
        Ok(())
    }

    async fn update_characteristic(
        &mut self,
        characteristic: Uuid,
        value: Vec<u8>,
    ) -> Result<(), Error> {
        self.updates.lock().unwrap().push((characteristic, value));
        Ok(())
    }
}

fn request(characteristic: Uuid) -> PeripheralRequest {
    PeripheralRequest {
        client: String::from("AA:BB:CC:DD:EE:FF"),
        service: Uuid::from_short(fitness_machine::SERVICE_UUID),
        characteristic,
    }
}

fn server() -> GattServer {
    let config = ServerConfig::default();
    let application = Application::fitness_machine(&config).unwrap();
    GattServer::new(application, &config, Box::new(FixedValueSource::default()))
}

#[tokio::test]
async fn registers_catalog_in_order() {
    let config = ServerConfig::default();
    let application = Application::fitness_machine(&config).unwrap();
    let mut peripheral = FakePeripheral::default();
    application.register(&mut peripheral).await.unwrap();
    let uuids: Vec<Uuid> = peripheral.services.iter().map(|s| s.uuid).collect();
    assert_eq!(
        uuids,
        vec![
            Uuid::from_short(fitness_machine::SERVICE_UUID),
            Uuid::from_short(heart_rate::SERVICE_UUID),
        ]
    );
    assert_eq!(peripheral.services[0].characteristics.len(), 7);
}

#[tokio::test(start_paused = true)]
async fn notifies_on_cadence_until_unsubscribed() {
    let mut peripheral = FakePeripheral::default();
    let updates = peripheral.updates.clone();
    let mut server = server();
    let (tx, rx) = mpsc::channel(16);
    let hr = Uuid::from_short(heart_rate::MEASUREMENT_UUID);

    let driver = tokio::spawn(async move {
        runner::run(&mut peripheral, &mut server, rx).await;
        server
    });

    tx.send(PeripheralEvent::CharacteristicSubscriptionUpdate {
        request: request(hr),
        subscribed: true,
    })
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(updates.lock().unwrap().len(), 4);

    tx.send(PeripheralEvent::CharacteristicSubscriptionUpdate {
        request: request(hr),
        subscribed: false,
    })
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert_eq!(updates.lock().unwrap().len(), 4);
    assert!(updates
        .lock()
        .unwrap()
        .iter()
        .all(|(uuid, value)| *uuid == hr && value == &vec![0xE0, 75]));

    drop(tx);
    let server = driver.await.unwrap();
    assert!(!server.is_subscribed(&hr));
}

#[tokio::test(start_paused = true)]
async fn power_off_drops_subscriptions() {
    let mut peripheral = FakePeripheral::default();
    let updates = peripheral.updates.clone();
    let mut server = server();
    let (tx, rx) = mpsc::channel(16);
    let hr = Uuid::from_short(heart_rate::MEASUREMENT_UUID);
    let bike = Uuid::from_short(fitness_machine::INDOOR_BIKE_DATA_UUID);

    let driver = tokio::spawn(async move {
        runner::run(&mut peripheral, &mut server, rx).await;
        server
    });

    for characteristic in [hr, bike] {
        tx.send(PeripheralEvent::CharacteristicSubscriptionUpdate {
            request: request(characteristic),
            subscribed: true,
        })
        .await
        .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(updates.lock().unwrap().len(), 4);

    tx.send(PeripheralEvent::StateUpdate { is_powered: false })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert_eq!(updates.lock().unwrap().len(), 4);

    drop(tx);
    let server = driver.await.unwrap();
    assert!(!server.is_subscribed(&hr));
    assert!(!server.is_subscribed(&bike));
    assert!(server.next_deadline().is_none());
}

#[tokio::test]
async fn answers_reads_and_writes() {
    let mut peripheral = FakePeripheral::default();
    let updates = peripheral.updates.clone();
    let mut server = server();
    let (tx, rx) = mpsc::channel(16);
    let control_point = Uuid::from_short(fitness_machine::CONTROL_POINT_UUID);
    let power_range = Uuid::from_short(fitness_machine::SUPPORTED_POWER_RANGE_UUID);

    let driver = tokio::spawn(async move {
        runner::run(&mut peripheral, &mut server, rx).await;
    });

    let (read_tx, read_rx) = oneshot::channel();
    tx.send(PeripheralEvent::ReadRequest {
        request: request(power_range),
        offset: 2,
        responder: read_tx,
    })
    .await
    .unwrap();
    assert_eq!(
        read_rx.await.unwrap(),
        ReadRequestResponse::success(vec![208, 7, 1, 0])
    );

    let (read_tx, read_rx) = oneshot::channel();
    tx.send(PeripheralEvent::ReadRequest {
        request: request(power_range),
        offset: 7,
        responder: read_tx,
    })
    .await
    .unwrap();
    assert_eq!(
        read_rx.await.unwrap().response,
        RequestResponse::InvalidOffset
    );

    tx.send(PeripheralEvent::CharacteristicSubscriptionUpdate {
        request: request(control_point),
        subscribed: true,
    })
    .await
    .unwrap();

    let (write_tx, write_rx) = oneshot::channel();
    tx.send(PeripheralEvent::WriteRequest {
        request: request(control_point),
        value: vec![0x00],
        offset: 0,
        responder: write_tx,
    })
    .await
    .unwrap();
    assert_eq!(
        write_rx.await.unwrap(),
        WriteRequestResponse {
            response: RequestResponse::Success
        }
    );

    let (write_tx, write_rx) = oneshot::channel();
    tx.send(PeripheralEvent::WriteRequest {
        request: request(Uuid::from_short(fitness_machine::FEATURE_UUID)),
        value: vec![0x01],
        offset: 0,
        responder: write_tx,
    })
    .await
    .unwrap();
    assert_eq!(
        write_rx.await.unwrap().response,
        RequestResponse::RequestNotSupported
    );

    drop(tx);
    driver.await.unwrap();
    assert_eq!(
        updates.lock().unwrap().as_slice(),
        &[(control_point, vec![0x80, 0x00, 0x01])]
    );
}
