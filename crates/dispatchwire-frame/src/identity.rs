//! Identity bytes and subID tables.
//!
//! The byte after the size field names what a frame is. Command-class
//! identities (the four telecommand kinds and their acknowledgements) are
//! followed by a 2-byte subID; telemetry-class identities are followed by a
//! single tag byte. The two tables are disjoint and looked up independently.

/// Telecommand forwarded to a subsystem (frontend electronics).
pub const SEND_TO_SUBSYSTEM: u8 = 0xC0;

/// Custom telecommand with a caller-defined subID.
pub const CUSTOM_TC: u8 = 0xD0;

/// Telecommand handled by the dispatcher itself.
pub const INTERN_TC: u8 = 0xD1;

/// Dispatcher configuration (parameter requests and subscriptions).
pub const CONF_DISPATCHER: u8 = 0xB0;

/// Parameter value answering a request or subscription.
pub const PARAMETER_TM: u8 = 0xA0;

/// ASIC science data.
pub const SCIENCE_TM: u8 = 0xA1;

/// Dispatcher housekeeping.
pub const HOUSEKEEPING_TM: u8 = 0xA2;

/// INTERN_TC subIDs.
pub mod intern {
    pub const START_ACQUISITION: u16 = 0x0004;
    pub const STOP_ACQUISITION: u16 = 0x0005;
}

/// CONF_DISPATCHER subIDs.
pub mod conf {
    pub const REQUEST_PARAMETERS: u16 = 0x0001;
    pub const SUBSCRIBE_PARAMETERS: u16 = 0x0002;
    pub const UNSUBSCRIBE_PARAMETERS: u16 = 0x0003;
}

/// Which namespace an identity byte belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityClass {
    /// Followed by a 2-byte subID; body starts three bytes after the identity.
    Command,
    /// Followed by a tag byte; body starts two bytes after the identity.
    Telemetry,
    /// Not registered; body starts right after the identity.
    Unknown,
}

const COMMAND_IDENTITIES: &[(u8, &str)] = &[
    (SEND_TO_SUBSYSTEM, "SEND_TO_SUBSYSTEM"),
    (CUSTOM_TC, "CUSTOM_TC"),
    (INTERN_TC, "INTERN_TC"),
    (CONF_DISPATCHER, "CONF_DISPATCHER"),
];

const TELEMETRY_IDENTITIES: &[(u8, &str)] = &[
    (PARAMETER_TM, "PARAMETER_TM"),
    (SCIENCE_TM, "SCIENCE_TM"),
    (HOUSEKEEPING_TM, "HOUSEKEEPING_TM"),
];

/// Classify an identity byte.
pub fn identity_class(id: u8) -> IdentityClass {
    if lookup(COMMAND_IDENTITIES, id).is_some() {
        IdentityClass::Command
    } else if lookup(TELEMETRY_IDENTITIES, id).is_some() {
        IdentityClass::Telemetry
    } else {
        IdentityClass::Unknown
    }
}

/// Returns a human-readable name for an identity byte, if registered.
pub fn identity_label(id: u8) -> Option<&'static str> {
    lookup(COMMAND_IDENTITIES, id).or_else(|| lookup(TELEMETRY_IDENTITIES, id))
}

/// Returns the name of a subID under a command-class identity.
///
/// The outer `None` means the identity has no subID table (subsystem and
/// custom telecommands carry caller-defined subIDs); the inner `None` means
/// the table exists but does not know this subID.
pub fn sub_id_label(id: u8, sub_id: u16) -> Option<Option<&'static str>> {
    let table: &[(u16, &str)] = match id {
        INTERN_TC => &[
            (intern::START_ACQUISITION, "START_ACQUISITION"),
            (intern::STOP_ACQUISITION, "STOP_ACQUISITION"),
        ],
        CONF_DISPATCHER => &[
            (conf::REQUEST_PARAMETERS, "REQUEST_PARAMETERS"),
            (conf::SUBSCRIBE_PARAMETERS, "SUBSCRIBE_PARAMETERS"),
            (conf::UNSUBSCRIBE_PARAMETERS, "UNSUBSCRIBE_PARAMETERS"),
        ],
        _ => return None,
    };
    Some(
        table
            .iter()
            .find(|(code, _)| *code == sub_id)
            .map(|(_, name)| *name),
    )
}

fn lookup<K: PartialEq + Copy>(table: &[(K, &'static str)], key: K) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}
