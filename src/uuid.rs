use crate::error::{Error, ErrorType};
use uuid::Uuid;

const BLUETOOTH_BASE_TAIL: &[u8; 8] = b"\x80\x00\x00\x80\x5F\x9B\x34\xFB";

pub trait ShortUuid {
    fn from_short(uuid: u16) -> Uuid;

    fn from_string(uuid_str: &str) -> Result<Uuid, Error>;

    fn to_short(&self) -> Option<u16>;
}

impl ShortUuid for Uuid {
    fn from_short(uuid: u16) -> Uuid {
        Uuid::from_fields(uuid.into(), 0, 0x1000, BLUETOOTH_BASE_TAIL)
    }

    /// Accepts full UUIDs as well as 4 or 8 hex digit aliases, with or without
    /// a leading `0x` (`"0x1826"`, `"2ad2"`).
    fn from_string(uuid_str: &str) -> Result<Uuid, Error> {
        if let Ok(uuid) = Uuid::parse_str(uuid_str) {
            return Ok(uuid);
        }
        let short = uuid_str
            .strip_prefix("0x")
            .or_else(|| uuid_str.strip_prefix("0X"))
            .unwrap_or(uuid_str);
        let long_uuid_str = match short.len() {
            4 => format!("0000{}-0000-1000-8000-00805f9b34fb", short),
            8 => format!("{}-0000-1000-8000-00805f9b34fb", short),
            _ => short.to_string(),
        };
        Uuid::parse_str(&long_uuid_str).map_err(|err| {
            Error::new(
                format!("Invalid UUID string: {}", uuid_str),
                err.to_string(),
                ErrorType::Config,
            )
        })
    }

    fn to_short(&self) -> Option<u16> {
        let (d1, d2, d3, d4) = self.as_fields();
        if d2 != 0 || d3 != 0x1000 || d4 != BLUETOOTH_BASE_TAIL || d1 > u16::MAX as u32 {
            return None;
        }
        Some(d1 as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_string_forms_agree() {
        let from_short = Uuid::from_short(0x1826);
        assert_eq!(Uuid::from_string("0x1826").unwrap(), from_short);
        assert_eq!(Uuid::from_string("1826").unwrap(), from_short);
        assert_eq!(
            Uuid::from_string("00001826-0000-1000-8000-00805f9b34fb").unwrap(),
            from_short
        );
        assert_eq!(from_short.to_short(), Some(0x1826));
    }

    #[test]
    fn vendor_uuid_has_no_short_form() {
        let vendor = Uuid::from_string("00000001-710e-4a5b-8d75-3e5b444bc3cf").unwrap();
        assert_eq!(vendor.to_short(), None);
    }

    #[test]
    fn garbage_is_a_config_error() {
        let err = Uuid::from_string("not-a-uuid").unwrap_err();
        assert_eq!(err.error_type(), &ErrorType::Config);
    }
}
