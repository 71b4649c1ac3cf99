use crate::codec::{
    self, ControlCommand, ControlResponse, DecodeError, RangeTriple, ResultCode,
    SimulationParameters,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    RequestControl = 0x00,
    Reset = 0x01,
    SetTargetSpeed = 0x02,
    SetTargetPower = 0x05,
    StartOrResume = 0x07,
    StopOrPause = 0x08,
    SetSimulationParameters = 0x11,
}

impl OpCode {
    pub fn from_u8(opcode: u8) -> Option<Self> {
        match opcode {
            0x00 => Some(OpCode::RequestControl),
            0x01 => Some(OpCode::Reset),
            0x02 => Some(OpCode::SetTargetSpeed),
            0x05 => Some(OpCode::SetTargetPower),
            0x07 => Some(OpCode::StartOrResume),
            0x08 => Some(OpCode::StopOrPause),
            0x11 => Some(OpCode::SetSimulationParameters),
            _ => None,
        }
    }

    pub fn min_parameters(self) -> usize {
        match self {
            OpCode::RequestControl
            | OpCode::Reset
            | OpCode::StartOrResume
            | OpCode::StopOrPause => 0,
            OpCode::SetTargetSpeed | OpCode::SetTargetPower => 1,
            OpCode::SetSimulationParameters => SimulationParameters::MIN_LEN,
        }
    }
}

const STOP: u8 = 0x01;
const PAUSE: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MachineState {
    #[default]
    Idle,
    Running,
    Stopped,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub control_granted: bool,
    pub state: MachineState,
    pub target_speed: Option<u16>,
    pub target_power: Option<u16>,
    pub simulation: Option<SimulationParameters>,
}

#[derive(Debug)]
pub struct ControlPoint {
    session: Session,
    power_range: RangeTriple,
}

impl ControlPoint {
    pub fn new(power_range: RangeTriple) -> Self {
        ControlPoint {
            session: Session::default(),
            power_range,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn handle(&mut self, value: &[u8]) -> Result<ControlResponse, DecodeError> {
        let command = codec::decode_command(value)?;
        Ok(self.dispatch(&command))
    }

    pub fn dispatch(&mut self, command: &ControlCommand) -> ControlResponse {
        let Some(opcode) = OpCode::from_u8(command.opcode) else {
            log::warn!("Control point opcode {:#04x} not supported", command.opcode);
            return ControlResponse::new(command.opcode, ResultCode::OpCodeNotSupported);
        };
        let params = command.parameters.as_slice();
        if params.len() < opcode.min_parameters() {
            log::warn!(
                "Control point {:?} needs {} parameter bytes, got {}",
                opcode,
                opcode.min_parameters(),
                params.len()
            );
            return ControlResponse::new(command.opcode, ResultCode::InvalidParameter);
        }
        log::debug!("Control point {:?} {:02x?}", opcode, params);

        let success = ControlResponse::new(command.opcode, ResultCode::Success);
        let invalid = ControlResponse::new(command.opcode, ResultCode::InvalidParameter);
        match opcode {
            OpCode::RequestControl => {
                self.session.control_granted = true;
                success
            }
            OpCode::Reset => {
                self.session = Session::default();
                success
            }
            OpCode::SetTargetSpeed => {
                let speed = target_value(params);
                self.session.target_speed = Some(speed);
                success.with_parameters(&codec::encode_u16_le(speed))
            }
            OpCode::SetTargetPower => {
                let power = target_value(params);
                if !self.power_range.contains(power) {
                    log::warn!("Target power {} W outside {:?}", power, self.power_range);
                    return invalid;
                }
                self.session.target_power = Some(power);
                success.with_parameters(&codec::encode_u16_le(power))
            }
            OpCode::StartOrResume => {
                self.session.state = MachineState::Running;
                success
            }
            OpCode::StopOrPause => {
                let control = params.first().copied().unwrap_or(PAUSE);
                self.session.state = match control {
                    STOP => MachineState::Stopped,
                    PAUSE => MachineState::Paused,
                    _ => return invalid,
                };
                success.with_parameters(&[control])
            }
            OpCode::SetSimulationParameters => match SimulationParameters::decode(params) {
                Ok(simulation) => {
                    self.session.simulation = Some(simulation);
                    success.with_parameters(&params[..SimulationParameters::MIN_LEN])
                }
                Err(_) => invalid,
            },
        }
    }
}

/// Targets are 16-bit little endian; a lone low byte is zero-extended.
fn target_value(params: &[u8]) -> u16 {
    let lo = params.first().copied().unwrap_or(0);
    let hi = params.get(1).copied().unwrap_or(0);
    u16::from_le_bytes([lo, hi])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control_point() -> ControlPoint {
        ControlPoint::new(RangeTriple::new(0, 2000, 1))
    }

    fn write(cp: &mut ControlPoint, bytes: &[u8]) -> Vec<u8> {
        cp.handle(bytes).unwrap().encode()
    }

    #[test]
    fn request_control_acks() {
        let mut cp = control_point();
        assert_eq!(write(&mut cp, &[0x00]), vec![0x80, 0x00, 0x01]);
        assert!(cp.session().control_granted);
    }

    #[test]
    fn every_known_opcode_echoes_itself() {
        let full = [0x10, 0x00, 0x00, 0x00, 0x28, 0x33];
        for opcode in [0x00, 0x01, 0x02, 0x05, 0x07, 0x08, 0x11] {
            let mut cp = control_point();
            let mut frame = vec![opcode];
            let op = OpCode::from_u8(opcode).unwrap();
            if op == OpCode::StopOrPause {
                frame.push(STOP);
            } else {
                frame.extend_from_slice(&full[..op.min_parameters()]);
            }
            let response = write(&mut cp, &frame);
            assert_eq!(response[0], 0x80);
            assert_eq!(response[1], opcode);
            assert_eq!(
                response[2],
                ResultCode::Success as u8,
                "opcode {opcode:#04x}"
            );
        }
    }

    #[test]
    fn short_parameters_are_invalid() {
        for opcode in [0x02, 0x05, 0x11] {
            let mut cp = control_point();
            let min = OpCode::from_u8(opcode).unwrap().min_parameters();
            for len in 0..min {
                let mut frame = vec![opcode];
                frame.extend(std::iter::repeat(0u8).take(len));
                assert_eq!(write(&mut cp, &frame), vec![0x80, opcode, 0x03]);
            }
        }
    }

    #[test]
    fn unknown_opcode_not_supported() {
        let mut cp = control_point();
        assert_eq!(write(&mut cp, &[0x99]), vec![0x80, 0x99, 0x02]);
        assert_eq!(write(&mut cp, &[0x04, 0x10]), vec![0x80, 0x04, 0x02]);
    }

    #[test]
    fn empty_write_is_a_decode_error() {
        assert_eq!(control_point().handle(&[]), Err(DecodeError::Empty));
    }

    #[test]
    fn target_speed_is_echoed_fixed_width() {
        let mut cp = control_point();
        assert_eq!(
            write(&mut cp, &[0x02, 0xFA]),
            vec![0x80, 0x02, 0x01, 0xFA, 0x00]
        );
        assert_eq!(
            write(&mut cp, &[0x02, 0xFA, 0x01]),
            vec![0x80, 0x02, 0x01, 0xFA, 0x01]
        );
        assert_eq!(cp.session().target_speed, Some(0x01FA));
    }

    #[test]
    fn target_power_outside_range_is_invalid() {
        let mut cp = control_point();
        assert_eq!(
            write(&mut cp, &[0x05, 0x3C, 0x00]),
            vec![0x80, 0x05, 0x01, 0x3C, 0x00]
        );
        assert_eq!(write(&mut cp, &[0x05, 0xD1, 0x07]), vec![0x80, 0x05, 0x03]);
        assert_eq!(cp.session().target_power, Some(60));
    }

    #[test]
    fn stop_or_pause() {
        let mut cp = control_point();
        assert_eq!(write(&mut cp, &[0x07]), vec![0x80, 0x07, 0x01]);
        assert_eq!(cp.session().state, MachineState::Running);
        assert_eq!(write(&mut cp, &[0x08]), vec![0x80, 0x08, 0x01, 0x02]);
        assert_eq!(cp.session().state, MachineState::Paused);
        assert_eq!(write(&mut cp, &[0x08, 0x01]), vec![0x80, 0x08, 0x01, 0x01]);
        assert_eq!(cp.session().state, MachineState::Stopped);
        assert_eq!(write(&mut cp, &[0x08, 0x07]), vec![0x80, 0x08, 0x03]);
        assert_eq!(cp.session().state, MachineState::Stopped);
    }

    #[test]
    fn simulation_parameters_echo_wind_and_grade() {
        let mut cp = control_point();
        let response = write(&mut cp, &[0x11, 0x11, 0x00, 0x00, 0xE7, 0x00, 0x28, 0x33]);
        assert_eq!(response, vec![0x80, 0x11, 0x01, 0x11, 0x00, 0x00, 0xE7]);
        let sim = cp.session().simulation.unwrap();
        assert_eq!(sim.wind_speed, 0x11);
        assert_eq!(sim.grade, i16::from_le_bytes([0x00, 0xE7]));
        assert_eq!(sim.crr, Some(0x00));
        assert_eq!(sim.cw, Some(0x28));
    }

    #[test]
    fn reset_clears_the_session() {
        let mut cp = control_point();
        write(&mut cp, &[0x00]);
        write(&mut cp, &[0x05, 0x64]);
        assert_eq!(write(&mut cp, &[0x01]), vec![0x80, 0x01, 0x01]);
        assert_eq!(cp.session(), &Session::default());
    }
}
