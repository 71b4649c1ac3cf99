use std::{error, fmt};

use crate::error::{Error, ErrorType};

pub const RESPONSE_CODE: u8 = 0x80;

pub const HEART_RATE_FLAGS: u8 = 0xE0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    Empty,
    Truncated { expected: usize, actual: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "empty buffer"),
            DecodeError::Truncated { expected, actual } => {
                write!(f, "expected {} bytes, got {}", expected, actual)
            }
        }
    }
}

impl error::Error for DecodeError {}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::from_string(err.to_string(), ErrorType::Decode)
    }
}

pub fn encode_u16_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

pub fn decode_u16_le(bytes: &[u8]) -> Result<u16, DecodeError> {
    match bytes {
        [] => Err(DecodeError::Empty),
        [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Err(DecodeError::Truncated {
            expected: 2,
            actual: bytes.len(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCommand {
    pub opcode: u8,
    pub parameters: Vec<u8>,
}

pub fn decode_command(bytes: &[u8]) -> Result<ControlCommand, DecodeError> {
    let (opcode, parameters) = bytes.split_first().ok_or(DecodeError::Empty)?;
    Ok(ControlCommand {
        opcode: *opcode,
        parameters: parameters.to_vec(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success = 0x01,
    OpCodeNotSupported = 0x02,
    InvalidParameter = 0x03,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlResponse {
    pub opcode: u8,
    pub result: ResultCode,
    pub parameters: Vec<u8>,
}

impl ControlResponse {
    pub fn new(opcode: u8, result: ResultCode) -> Self {
        ControlResponse {
            opcode,
            result,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: &[u8]) -> Self {
        self.parameters.extend_from_slice(parameters);
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(3 + self.parameters.len());
        frame.push(RESPONSE_CODE);
        frame.push(self.opcode);
        frame.push(self.result as u8);
        frame.extend_from_slice(&self.parameters);
        frame
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeTriple {
    pub minimum: u16,
    pub maximum: u16,
    pub increment: u16,
}

impl RangeTriple {
    pub const fn new(minimum: u16, maximum: u16, increment: u16) -> Self {
        RangeTriple {
            minimum,
            maximum,
            increment,
        }
    }

    pub fn contains(&self, value: u16) -> bool {
        (self.minimum..=self.maximum).contains(&value)
    }

    pub fn encode(&self) -> [u8; 6] {
        let [min_lo, min_hi] = encode_u16_le(self.minimum);
        let [max_lo, max_hi] = encode_u16_le(self.maximum);
        let [inc_lo, inc_hi] = encode_u16_le(self.increment);
        [min_lo, min_hi, max_lo, max_hi, inc_lo, inc_hi]
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        if bytes.len() < 6 {
            return Err(DecodeError::Truncated {
                expected: 6,
                actual: bytes.len(),
            });
        }
        Ok(RangeTriple {
            minimum: decode_u16_le(&bytes[0..2])?,
            maximum: decode_u16_le(&bytes[2..4])?,
            increment: decode_u16_le(&bytes[4..6])?,
        })
    }
}

pub fn encode_feature(machine_features: u32, target_settings: u32) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&machine_features.to_le_bytes());
    out[4..].copy_from_slice(&target_settings.to_le_bytes());
    out
}

pub fn encode_heart_rate(bpm: u8) -> [u8; 2] {
    [HEART_RATE_FLAGS, bpm]
}

/// One instantaneous indoor bike reading in profile units: speed in
/// 0.01 km/h, cadence in 0.5 rpm, power in watts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BikeSample {
    pub speed: u16,
    pub cadence: u16,
    pub power: i16,
    pub heart_rate: u8,
}

const BIKE_FLAG_CADENCE: u16 = 1 << 2;
const BIKE_FLAG_POWER: u16 = 1 << 6;
const BIKE_FLAG_HEART_RATE: u16 = 1 << 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndoorBikeDataLayout {
    pub cadence: bool,
    pub power: bool,
    pub heart_rate: bool,
}

impl Default for IndoorBikeDataLayout {
    fn default() -> Self {
        IndoorBikeDataLayout {
            cadence: true,
            power: true,
            heart_rate: false,
        }
    }
}

impl IndoorBikeDataLayout {
    pub fn flags(&self) -> u16 {
        let mut flags = 0;
        if self.cadence {
            flags |= BIKE_FLAG_CADENCE;
        }
        if self.power {
            flags |= BIKE_FLAG_POWER;
        }
        if self.heart_rate {
            flags |= BIKE_FLAG_HEART_RATE;
        }
        flags
    }

    pub fn frame_len(&self) -> usize {
        4 + 2 * self.cadence as usize + 2 * self.power as usize + self.heart_rate as usize
    }

    pub fn encode(&self, sample: &BikeSample) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.frame_len());
        frame.extend_from_slice(&encode_u16_le(self.flags()));
        frame.extend_from_slice(&encode_u16_le(sample.speed));
        if self.cadence {
            frame.extend_from_slice(&encode_u16_le(sample.cadence));
        }
        if self.power {
            frame.extend_from_slice(&sample.power.to_le_bytes());
        }
        if self.heart_rate {
            frame.push(sample.heart_rate);
        }
        frame
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationParameters {
    /// 0.001 m/s
    pub wind_speed: i16,
    /// 0.01 %
    pub grade: i16,
    /// 0.0001
    pub crr: Option<u8>,
    /// 0.01 kg/m
    pub cw: Option<u8>,
}

impl SimulationParameters {
    pub const MIN_LEN: usize = 4;

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        if bytes.len() < Self::MIN_LEN {
            return Err(DecodeError::Truncated {
                expected: Self::MIN_LEN,
                actual: bytes.len(),
            });
        }
        Ok(SimulationParameters {
            wind_speed: i16::from_le_bytes([bytes[0], bytes[1]]),
            grade: i16::from_le_bytes([bytes[2], bytes[3]]),
            crr: bytes.get(4).copied(),
            cw: bytes.get(5).copied(),
        })
    }
}

pub fn encode_fitness_machine_service_data(flags: u8, machine_type: u16) -> [u8; 3] {
    let [lo, hi] = encode_u16_le(machine_type);
    [flags, lo, hi]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub min_interval: u16,
    pub max_interval: u16,
    pub latency: u16,
    pub timeout: u16,
}

impl ConnectionParameters {
    pub fn encode(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        for (chunk, field) in out.chunks_exact_mut(2).zip([
            self.min_interval,
            self.max_interval,
            self.latency,
            self.timeout,
        ]) {
            chunk.copy_from_slice(&encode_u16_le(field));
        }
        out
    }
}
