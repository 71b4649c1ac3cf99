use super::bluez_utils::CharNotifyHandler;
use crate::gatt::peripheral_event::{
    PeripheralEvent, PeripheralRequest, ReadRequestResponse, RequestResponse, WriteRequestResponse,
};
use crate::gatt::properties::Properties;
use crate::gatt::{characteristic, descriptor, service};
use bluer::gatt::local::{
    characteristic_control, service_control, Characteristic, CharacteristicControl,
    CharacteristicControlHandle, CharacteristicNotify, CharacteristicNotifyMethod,
    CharacteristicRead, CharacteristicReadRequest, CharacteristicWrite,
    CharacteristicWriteMethod, CharacteristicWriteRequest, Descriptor, DescriptorRead,
    DescriptorReadRequest, ReqError, Service,
};
use futures::FutureExt;
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot;
use uuid::Uuid;

pub fn parse_services(
    gatt_services: &[service::Service],
    sender_tx: Sender<PeripheralEvent>,
) -> (Vec<CharNotifyHandler>, Vec<Service>) {
    let mut services: Vec<Service> = Vec::with_capacity(gatt_services.len());
    let mut char_notify_handlers: Vec<CharNotifyHandler> = Vec::new();

    for gatt_service in gatt_services {
        let (_, service_handle) = service_control();
        let mut characteristics: Vec<Characteristic> = Vec::new();

        for char in &gatt_service.characteristics {
            let (parsed, control) = parse_characteristic(char, gatt_service.uuid, &sender_tx);
            if let Some(control) = control {
                char_notify_handlers.push(CharNotifyHandler {
                    service_uuid: gatt_service.uuid,
                    characteristic_uuid: char.uuid,
                    control,
                });
            }
            characteristics.push(parsed);
        }

        services.push(Service {
            uuid: gatt_service.uuid,
            primary: gatt_service.primary,
            characteristics,
            control_handle: service_handle,
            ..Default::default()
        });
    }
    (char_notify_handlers, services)
}

fn parse_characteristic(
    characteristic: &characteristic::Characteristic,
    service_uuid: Uuid,
    sender_tx: &Sender<PeripheralEvent>,
) -> (Characteristic, Option<CharacteristicControl>) {
    let notify = get_characteristic_notify(characteristic);

    let (control, control_handle) = match notify {
        Some(_) => {
            let (control, handle) = characteristic_control();
            (Some(control), handle)
        }
        None => (None, CharacteristicControlHandle::default()),
    };

    let parsed = Characteristic {
        uuid: characteristic.uuid,
        read: get_characteristic_read(characteristic, service_uuid, sender_tx.clone()),
        write: get_characteristic_write(characteristic, service_uuid, sender_tx.clone()),
        notify,
        descriptors: characteristic
            .descriptors
            .iter()
            .map(parse_descriptor)
            .collect(),
        control_handle,
        ..Default::default()
    };
    (parsed, control)
}

fn get_characteristic_read(
    characteristic: &characteristic::Characteristic,
    service_uuid: Uuid,
    sender_tx: Sender<PeripheralEvent>,
) -> Option<CharacteristicRead> {
    if !characteristic.properties.contains(Properties::READ) {
        return None;
    }
    let characteristic_uuid = characteristic.uuid;

    Some(CharacteristicRead {
        read: true,
        fun: Box::new(move |request: CharacteristicReadRequest| {
            let sender_tx = sender_tx.clone();
            async move {
                on_read_request(sender_tx, request, service_uuid, characteristic_uuid).await
            }
            .boxed()
        }),
        ..Default::default()
    })
}

fn get_characteristic_write(
    characteristic: &characteristic::Characteristic,
    service_uuid: Uuid,
    sender_tx: Sender<PeripheralEvent>,
) -> Option<CharacteristicWrite> {
    if !characteristic.properties.contains(Properties::WRITE) {
        return None;
    }
    let characteristic_uuid = characteristic.uuid;

    Some(CharacteristicWrite {
        write: true,
        method: CharacteristicWriteMethod::Fun(Box::new(
            move |value: Vec<u8>, request: CharacteristicWriteRequest| {
                let sender_tx = sender_tx.clone();
                async move {
                    on_write_request(sender_tx, request, service_uuid, characteristic_uuid, value)
                        .await
                }
                .boxed()
            },
        )),
        ..Default::default()
    })
}

fn get_characteristic_notify(
    characteristic: &characteristic::Characteristic,
) -> Option<CharacteristicNotify> {
    if !characteristic.properties.can_subscribe() {
        return None;
    }

    Some(CharacteristicNotify {
        notify: characteristic.properties.contains(Properties::NOTIFY),
        indicate: characteristic.properties.contains(Properties::INDICATE),
        method: CharacteristicNotifyMethod::Io,
        ..Default::default()
    })
}

fn parse_descriptor(descriptor: &descriptor::Descriptor) -> Descriptor {
    let value = descriptor.value.clone();
    Descriptor {
        uuid: descriptor.uuid,
        read: Some(DescriptorRead {
            read: true,
            fun: Box::new(move |_request: DescriptorReadRequest| {
                let value = value.clone();
                async move { Ok::<_, ReqError>(value) }.boxed()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

async fn on_read_request(
    sender_tx: Sender<PeripheralEvent>,
    request: CharacteristicReadRequest,
    service_uuid: Uuid,
    characteristic: Uuid,
) -> Result<Vec<u8>, ReqError> {
    let (res_tx, res_rx) = oneshot::channel::<ReadRequestResponse>();
    if let Err(err) = sender_tx
        .send(PeripheralEvent::ReadRequest {
            request: PeripheralRequest {
                client: request.device_address.to_string(),
                service: service_uuid,
                characteristic,
            },
            offset: request.offset as u64,
            responder: res_tx,
        })
        .await
    {
        log::error!("Error sending read request event: {:?}", err);
    }

    match res_rx.await {
        Ok(res) => match res.response.to_req_err() {
            Some(err) => Err(err),
            None => Ok(res.value),
        },
        Err(_) => Err(ReqError::Failed),
    }
}

async fn on_write_request(
    sender_tx: Sender<PeripheralEvent>,
    request: CharacteristicWriteRequest,
    service_uuid: Uuid,
    characteristic: Uuid,
    value: Vec<u8>,
) -> Result<(), ReqError> {
    let (res_tx, res_rx) = oneshot::channel::<WriteRequestResponse>();
    if let Err(err) = sender_tx
        .send(PeripheralEvent::WriteRequest {
            request: PeripheralRequest {
                client: request.device_address.to_string(),
                service: service_uuid,
                characteristic,
            },
            offset: request.offset as u64,
            value,
            responder: res_tx,
        })
        .await
    {
        log::error!("Error sending write request event: {:?}", err);
    }

    match res_rx.await {
        Ok(res) => match res.response.to_req_err() {
            Some(err) => Err(err),
            None => Ok(()),
        },
        Err(_) => Err(ReqError::Failed),
    }
}

impl RequestResponse {
    fn to_req_err(self) -> Option<ReqError> {
        match self {
            RequestResponse::Success => None,
            RequestResponse::InvalidHandle => Some(ReqError::Failed),
            RequestResponse::RequestNotSupported => Some(ReqError::NotSupported),
            RequestResponse::InvalidOffset => Some(ReqError::InvalidOffset),
            RequestResponse::UnlikelyError => Some(ReqError::Failed),
        }
    }
}
