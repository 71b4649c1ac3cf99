pub mod control_point;
pub mod runner;
pub mod scheduler;
pub mod subscription;

use std::{collections::HashMap, time::Instant};

use uuid::Uuid;

use crate::{
    application::Application,
    config::ServerConfig,
    error::{Error, ErrorType},
    gatt::properties::Properties,
    profile::{value_source::ValueSource, ValueKind},
};
use control_point::{ControlPoint, Session};
use scheduler::NotificationScheduler;
use subscription::CharacteristicSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Notification,
    Indication,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationFrame {
    pub characteristic: Uuid,
    pub kind: FrameKind,
    pub value: Vec<u8>,
}

pub trait Notifier {
    fn emit(&mut self, frame: NotificationFrame);
}

impl Notifier for Vec<NotificationFrame> {
    fn emit(&mut self, frame: NotificationFrame) {
        self.push(frame);
    }
}

pub struct GattServer {
    application: Application,
    slots: Vec<CharacteristicSlot>,
    index: HashMap<Uuid, usize>,
    scheduler: NotificationScheduler,
    control_point: ControlPoint,
    source: Box<dyn ValueSource>,
    long_reads: HashMap<(String, Uuid), Vec<u8>>,
    dropped_responses: u64,
}

impl GattServer {
    pub fn new(
        application: Application,
        config: &ServerConfig,
        source: Box<dyn ValueSource>,
    ) -> Self {
        let mut slots = Vec::new();
        let mut index = HashMap::new();
        for service in application.services() {
            for characteristic in &service.characteristics {
                index.insert(characteristic.definition.uuid, slots.len());
                slots.push(CharacteristicSlot::new(
                    characteristic.definition.uuid,
                    service.uuid,
                    characteristic.definition.properties,
                    characteristic.kind.clone(),
                ));
            }
        }
        GattServer {
            application,
            slots,
            index,
            scheduler: NotificationScheduler::new(config.notify_interval),
            control_point: ControlPoint::new(config.power_range),
            source,
            long_reads: HashMap::new(),
            dropped_responses: 0,
        }
    }

    pub fn application(&self) -> &Application {
        &self.application
    }

    pub fn session(&self) -> &Session {
        self.control_point.session()
    }

    pub fn dropped_responses(&self) -> u64 {
        self.dropped_responses
    }

    pub fn is_subscribed(&self, characteristic: &Uuid) -> bool {
        self.slot(characteristic)
            .map(CharacteristicSlot::is_subscribed)
            .unwrap_or(false)
    }

    pub fn is_armed(&self, characteristic: &Uuid) -> bool {
        self.scheduler.is_armed(characteristic)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn start_notify(
        &mut self,
        characteristic: &Uuid,
        now: Instant,
        notifier: &mut dyn Notifier,
    ) -> Result<(), Error> {
        let position = self.position(characteristic)?;
        let slot = &mut self.slots[position];
        if !slot.subscribe()? {
            log::debug!("{} already subscribed", characteristic);
            return Ok(());
        }
        log::info!("Notifications started for {}", characteristic);
        let slot = &self.slots[position];
        if let Some(value) = slot.kind.compute(self.source.as_mut()) {
            notifier.emit(frame_for(slot, value));
        }
        if slot.kind.is_live() {
            self.scheduler.arm(*characteristic, now);
        }
        Ok(())
    }

    pub fn stop_notify(&mut self, characteristic: &Uuid) -> Result<(), Error> {
        let position = self.position(characteristic)?;
        if self.slots[position].unsubscribe() {
            log::info!("Notifications stopped for {}", characteristic);
        }
        self.scheduler.disarm(characteristic);
        Ok(())
    }

    pub fn stop_all(&mut self) {
        for slot in &mut self.slots {
            slot.unsubscribe();
        }
        self.scheduler.disarm_all();
    }

    pub fn read_value(&mut self, characteristic: &Uuid) -> Result<Vec<u8>, Error> {
        let position = self.position(characteristic)?;
        self.slots[position].read(self.source.as_mut())
    }

    /// Offset 0 computes a fresh value and keeps it for the client's follow-up
    /// blob reads.
    pub fn read_blob(
        &mut self,
        client: &str,
        characteristic: &Uuid,
        offset: usize,
    ) -> Result<Option<Vec<u8>>, Error> {
        let key = (client.to_string(), *characteristic);
        if offset > 0 {
            if let Some(value) = self.long_reads.get(&key) {
                return Ok(value.get(offset..).map(<[u8]>::to_vec));
            }
        }
        let value = self.read_value(characteristic)?;
        let blob = value.get(offset..).map(<[u8]>::to_vec);
        self.long_reads.insert(key, value);
        Ok(blob)
    }

    pub fn write_value(
        &mut self,
        characteristic: &Uuid,
        value: &[u8],
        notifier: &mut dyn Notifier,
    ) -> Result<(), Error> {
        let position = self.position(characteristic)?;
        let slot = &self.slots[position];
        slot.require(Properties::WRITE)?;

        if slot.kind != ValueKind::ControlPoint {
            if value.is_empty() {
                log::warn!("Discarding empty write to {}", characteristic);
            } else {
                log::info!("Write to {}: {:02x?}", characteristic, value);
            }
            return Ok(());
        }

        let response = match self.control_point.handle(value) {
            Ok(response) => response,
            Err(err) => {
                log::warn!("Discarding control point write: {}", err);
                return Ok(());
            }
        };
        let slot = &self.slots[position];
        if slot.is_subscribed() {
            notifier.emit(frame_for(slot, response.encode()));
        } else {
            self.dropped_responses += 1;
            log::warn!(
                "Control point response {:02x?} dropped, indications not enabled ({} so far)",
                response.encode(),
                self.dropped_responses
            );
        }
        Ok(())
    }

    pub fn tick(&mut self, now: Instant, notifier: &mut dyn Notifier) {
        let slots = &self.slots;
        let index = &self.index;
        let due = self.scheduler.due(now, |uuid| {
            index
                .get(uuid)
                .map(|&i| slots[i].is_subscribed())
                .unwrap_or(false)
        });
        for uuid in due {
            let Some(&position) = self.index.get(&uuid) else {
                continue;
            };
            let slot = &self.slots[position];
            if let Some(value) = slot.kind.compute(self.source.as_mut()) {
                notifier.emit(frame_for(slot, value));
            }
        }
    }

    fn slot(&self, characteristic: &Uuid) -> Option<&CharacteristicSlot> {
        self.index.get(characteristic).map(|&i| &self.slots[i])
    }

    fn position(&self, characteristic: &Uuid) -> Result<usize, Error> {
        self.index.get(characteristic).copied().ok_or_else(|| {
            Error::new(
                String::from("Unknown characteristic"),
                characteristic.to_string(),
                ErrorType::UnknownCharacteristic,
            )
        })
    }
}

fn frame_for(slot: &CharacteristicSlot, value: Vec<u8>) -> NotificationFrame {
    NotificationFrame {
        characteristic: slot.uuid,
        kind: if slot.indicates() {
            FrameKind::Indication
        } else {
            FrameKind::Notification
        },
        value,
    }
}
