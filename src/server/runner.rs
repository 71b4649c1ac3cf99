use std::time::Instant as StdInstant;

use tokio::{
    sync::mpsc::Receiver,
    time::{sleep_until, Instant},
};

use super::{GattServer, NotificationFrame};
use crate::{
    gatt::peripheral_event::{
        PeripheralEvent, ReadRequestResponse, RequestResponse, WriteRequestResponse,
    },
    peripheral::PeripheralImpl,
};

pub async fn run<P>(
    peripheral: &mut P,
    server: &mut GattServer,
    mut events: Receiver<PeripheralEvent>,
) where
    P: PeripheralImpl + ?Sized,
{
    loop {
        let deadline = server.next_deadline();
        let mut frames: Vec<NotificationFrame> = Vec::new();
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => handle_event(server, event, &mut frames),
                None => break,
            },
            _ = wait_until(deadline) => {
                server.tick(now(), &mut frames);
            }
        }
        for frame in frames {
            if let Err(err) = peripheral
                .update_characteristic(frame.characteristic, frame.value)
                .await
            {
                log::error!("Error sending value to {}: {}", frame.characteristic, err);
            }
        }
    }
    log::info!("Event channel closed, stopping GATT server");
}

pub fn handle_event(
    server: &mut GattServer,
    event: PeripheralEvent,
    frames: &mut Vec<NotificationFrame>,
) {
    match event {
        PeripheralEvent::StateUpdate { is_powered } => {
            log::info!("PowerOn: {is_powered:?}");
            if !is_powered {
                server.stop_all();
            }
        }
        PeripheralEvent::CharacteristicSubscriptionUpdate {
            request,
            subscribed,
        } => {
            let result = if subscribed {
                server.start_notify(&request.characteristic, now(), frames)
            } else {
                server.stop_notify(&request.characteristic)
            };
            if let Err(err) = result {
                log::warn!(
                    "Subscription update from {} failed: {}",
                    request.client,
                    err
                );
            }
        }
        PeripheralEvent::ReadRequest {
            request,
            offset,
            responder,
        } => {
            let offset = usize::try_from(offset).unwrap_or(usize::MAX);
            let blob = server.read_blob(&request.client, &request.characteristic, offset);
            let response = match blob {
                Ok(Some(value)) => ReadRequestResponse::success(value),
                Ok(None) => ReadRequestResponse::failure(RequestResponse::InvalidOffset),
                Err(err) => {
                    log::warn!("Read from {} failed: {}", request.client, err);
                    ReadRequestResponse::failure(RequestResponse::from(&err))
                }
            };
            if responder.send(response).is_err() {
                log::error!("Read responder for {} dropped", request.characteristic);
            }
        }
        PeripheralEvent::WriteRequest {
            request,
            value,
            offset,
            responder,
        } => {
            let response = if offset != 0 {
                RequestResponse::InvalidOffset
            } else {
                match server.write_value(&request.characteristic, &value, frames) {
                    Ok(()) => RequestResponse::Success,
                    Err(err) => {
                        log::warn!("Write from {} failed: {}", request.client, err);
                        RequestResponse::from(&err)
                    }
                }
            };
            if responder.send(WriteRequestResponse { response }).is_err() {
                log::error!("Write responder for {} dropped", request.characteristic);
            }
        }
    }
}

fn now() -> StdInstant {
    Instant::now().into_std()
}

async fn wait_until(deadline: Option<StdInstant>) {
    match deadline {
        Some(deadline) => sleep_until(Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
