bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Properties: u8 {
        const READ = 0x02;
        const WRITE = 0x08;
        const NOTIFY = 0x10;
        const INDICATE = 0x20;
    }
}

impl Properties {
    pub fn can_subscribe(self) -> bool {
        self.intersects(Properties::NOTIFY | Properties::INDICATE)
    }

    /// Lowercase name of the first flag set, for log and error text.
    pub fn name(self) -> String {
        self.iter_names()
            .next()
            .map(|(name, _)| name.to_lowercase())
            .unwrap_or_else(|| String::from("none"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_and_contains() {
        let props = Properties::READ | Properties::NOTIFY;
        assert!(props.contains(Properties::READ));
        assert!(props.contains(Properties::NOTIFY));
        assert!(!props.contains(Properties::WRITE));
        assert!(props.can_subscribe());
        assert!(!Properties::READ.can_subscribe());
        assert!((Properties::WRITE | Properties::INDICATE).can_subscribe());
    }

    #[test]
    fn bits_follow_the_attribute_protocol() {
        let props = Properties::READ | Properties::WRITE | Properties::NOTIFY;
        assert_eq!(props.bits(), 0x1A);
        assert_eq!(Properties::INDICATE.name(), "indicate");
        assert_eq!(Properties::empty().name(), "none");
    }
}
