//! Capability flags reported by a bound characteristic
//!
//! Transports typically report capabilities as a set of strings (BlueZ uses
//! `"read"`, `"notify"`, `"write-without-response"`, ...). They are mapped
//! once onto a fixed bit set so capability checks never compare strings.

use tracing::debug;

bitflags::bitflags! {
    /// Set of operations supported by a characteristic
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharacteristicFlags: u16 {
        const BROADCAST = 1 << 0;
        const READ = 1 << 1;
        const WRITE_WITHOUT_RESPONSE = 1 << 2;
        const WRITE = 1 << 3;
        /// Value-change events without acknowledgement
        const NOTIFY = 1 << 4;
        /// Value-change events acknowledged by the client
        const INDICATE = 1 << 5;
        const AUTHENTICATED_SIGNED_WRITES = 1 << 6;
        const RELIABLE_WRITE = 1 << 7;
        const WRITABLE_AUXILIARIES = 1 << 8;
    }
}

const FLAG_NAMES: &[(&str, CharacteristicFlags)] = &[
    ("broadcast", CharacteristicFlags::BROADCAST),
    ("read", CharacteristicFlags::READ),
    (
        "write-without-response",
        CharacteristicFlags::WRITE_WITHOUT_RESPONSE,
    ),
    ("write", CharacteristicFlags::WRITE),
    ("notify", CharacteristicFlags::NOTIFY),
    ("indicate", CharacteristicFlags::INDICATE),
    (
        "authenticated-signed-writes",
        CharacteristicFlags::AUTHENTICATED_SIGNED_WRITES,
    ),
    ("reliable-write", CharacteristicFlags::RELIABLE_WRITE),
    (
        "writable-auxiliaries",
        CharacteristicFlags::WRITABLE_AUXILIARIES,
    ),
];

impl CharacteristicFlags {
    /// Look up a single flag by its transport name (case-insensitive).
    ///
    /// Distinct from the generated `from_name`, which matches constant names.
    pub fn from_transport_name(name: &str) -> Option<Self> {
        let name = name.trim();
        FLAG_NAMES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, flag)| *flag)
    }

    /// Build a flag set from the string-set a transport reports.
    ///
    /// Unknown names are skipped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .fold(Self::empty(), |flags, name| match Self::from_transport_name(name.as_ref()) {
                Some(flag) => flags | flag,
                None => {
                    debug!(flag = name.as_ref(), "Ignoring unknown characteristic flag");
                    flags
                }
            })
    }

    /// Transport names of every flag in this set
    pub fn names(&self) -> Vec<&'static str> {
        FLAG_NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Either change-event or acknowledged-event delivery qualifies
    pub fn can_notify(&self) -> bool {
        self.intersects(Self::NOTIFY | Self::INDICATE)
    }

    pub fn can_read(&self) -> bool {
        self.contains(Self::READ)
    }

    pub fn can_write(&self) -> bool {
        self.contains(Self::WRITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_names() {
        let flags = CharacteristicFlags::from_names(["read", "notify"]);
        assert_eq!(flags, CharacteristicFlags::READ | CharacteristicFlags::NOTIFY);
    }

    #[test]
    fn test_from_names_ignores_unknown_and_case() {
        let flags = CharacteristicFlags::from_names(vec![
            "READ".to_string(),
            "secure-read".to_string(),
            " indicate ".to_string(),
        ]);
        assert_eq!(flags, CharacteristicFlags::READ | CharacteristicFlags::INDICATE);
    }

    #[test]
    fn test_write_without_response_is_not_write() {
        let flags = CharacteristicFlags::from_names(["write-without-response"]);
        assert!(!flags.can_write());
        assert!(flags.contains(CharacteristicFlags::WRITE_WITHOUT_RESPONSE));
    }

    #[test]
    fn test_from_transport_name() {
        assert_eq!(
            CharacteristicFlags::from_transport_name("write-without-response"),
            Some(CharacteristicFlags::WRITE_WITHOUT_RESPONSE)
        );
        assert_eq!(
            CharacteristicFlags::from_transport_name("Notify"),
            Some(CharacteristicFlags::NOTIFY)
        );
        assert_eq!(CharacteristicFlags::from_transport_name("secure-read"), None);
    }

    #[test]
    fn test_names_round_trip_order() {
        let flags = CharacteristicFlags::WRITE | CharacteristicFlags::READ;
        assert_eq!(flags.names(), vec!["read", "write"]);
    }

    #[test]
    fn test_capability_derivation_for_every_combination() {
        let relevant = [
            CharacteristicFlags::READ,
            CharacteristicFlags::WRITE,
            CharacteristicFlags::NOTIFY,
            CharacteristicFlags::INDICATE,
        ];

        for mask in 0u8..16 {
            let flags = relevant
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .fold(CharacteristicFlags::empty(), |acc, (_, flag)| acc | *flag);

            assert_eq!(
                flags.can_notify(),
                flags.contains(CharacteristicFlags::NOTIFY)
                    || flags.contains(CharacteristicFlags::INDICATE),
                "mask {:04b}",
                mask
            );
            assert_eq!(flags.can_read(), mask & 0b0001 != 0);
            assert_eq!(flags.can_write(), mask & 0b0010 != 0);
        }
    }
}
