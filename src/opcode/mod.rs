//! Static opcode table.
//!
//! The protocol identifies every payload shape by a 16-bit opcode. The table
//! below is the fixed, versioned mapping between numeric codes and symbolic
//! names; both directions are total for every code the decoder may encounter
//! and unknown values are rejected at construction time.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{CodecError, Result};

/// All known opcodes. Request opcodes are odd, their replies even, except for
/// one-way reports which occupy their own codes.
pub const OPCODES: &[(u16, &str)] = &[
    (0x0001, "COMMON_ERROR_REPLY"),
    // Client link management
    (0x0065, "CLIENT_ONLINE_REQ"),
    (0x0066, "CLIENT_ONLINE_RSP"),
    (0x0067, "CLIENT_HEARTBEAT_REQ"),
    (0x0068, "CLIENT_HEARTBEAT_RSP"),
    (0x0069, "CLIENT_OFFLINE_REQ"),
    (0x006a, "CLIENT_OFFLINE_RSP"),
    // Device lifecycle and info
    (0x1001, "DEVICE_REGISTER_REQ"),
    (0x1002, "DEVICE_REGISTER_RSP"),
    (0x1003, "DEVICE_CONTROL_LOCK_REQ"),
    (0x1004, "DEVICE_CONTROL_LOCK_RSP"),
    (0x1005, "DEVICE_CONTROL_UNLOCK_REQ"),
    (0x1006, "DEVICE_CONTROL_UNLOCK_RSP"),
    (0x1007, "DEVICE_STATUS_GETTING_REQ"),
    (0x1008, "DEVICE_STATUS_GETTING_RSP"),
    (0x1009, "DEVICE_WLAN_INFO_GETTING_REQ"),
    (0x100a, "DEVICE_WLAN_INFO_GETTING_RSP"),
    (0x100b, "DEVICE_VERSION_INFO_UPDATE_REQ"),
    (0x100c, "DEVICE_VERSION_INFO_UPDATE_RSP"),
    (0x100d, "DEVICE_SEEK_LOCATION_REQ"),
    (0x100e, "DEVICE_SEEK_LOCATION_RSP"),
    (0x100f, "DEVICE_TIME_SYNC_REQ"),
    (0x1010, "DEVICE_TIME_SYNC_RSP"),
    (0x1011, "DEVICE_GETTIME_REQ"),
    (0x1012, "DEVICE_GETTIME_RSP"),
    (0x1013, "DEVICE_SETTIME_REQ"),
    (0x1014, "DEVICE_SETTIME_RSP"),
    (0x1015, "DEVICE_CHARGE_REQ"),
    (0x1016, "DEVICE_CHARGE_RSP"),
    (0x1017, "DEVICE_BATTERY_INFO_REQ"),
    (0x1018, "DEVICE_BATTERY_INFO_REP"),
    (0x1019, "DEVICE_EVENT_REPORT_REQ"),
    (0x101a, "DEVICE_EVENT_REPORT_RSP"),
    (0x101b, "DEVICE_EVENT_REPORT_CLEANTASK"),
    (0x101c, "DEVICE_EVENT_REPORT_CLEANMAP"),
    (0x101d, "DEVICE_ERROR_REPORT_REQ"),
    (0x101e, "DEVICE_ERROR_REPORT_RSP"),
    (0x101f, "DEVICE_CONFIG_UPDATE_REQ"),
    (0x1020, "DEVICE_CONFIG_UPDATE_RSP"),
    // Cleaning control
    (0x1101, "DEVICE_AUTO_CLEAN_REQ"),
    (0x1102, "DEVICE_AUTO_CLEAN_RSP"),
    (0x1103, "DEVICE_MANUAL_CTRL_REQ"),
    (0x1104, "DEVICE_MANUAL_CTRL_RSP"),
    (0x1105, "DEVICE_AREA_CLEAN_REQ"),
    (0x1106, "DEVICE_AREA_CLEAN_RSP"),
    (0x1107, "DEVICE_SPOT_CLEAN_REQ"),
    (0x1108, "DEVICE_SPOT_CLEAN_RSP"),
    (0x1109, "DEVICE_ROOM_CLEAN_REQ"),
    (0x110a, "DEVICE_ROOM_CLEAN_RSP"),
    (0x110b, "DEVICE_CLEAN_PAUSE_REQ"),
    (0x110c, "DEVICE_CLEAN_PAUSE_RSP"),
    (0x110d, "DEVICE_CLEAN_RESUME_REQ"),
    (0x110e, "DEVICE_CLEAN_RESUME_RSP"),
    (0x110f, "DEVICE_CLEAN_STOP_REQ"),
    (0x1110, "DEVICE_CLEAN_STOP_RSP"),
    (0x1111, "DEVICE_BACK_CHARGE_REQ"),
    (0x1112, "DEVICE_BACK_CHARGE_RSP"),
    (0x1113, "DEVICE_FAN_SPEED_SET_REQ"),
    (0x1114, "DEVICE_FAN_SPEED_SET_RSP"),
    (0x1115, "DEVICE_WATER_LEVEL_SET_REQ"),
    (0x1116, "DEVICE_WATER_LEVEL_SET_RSP"),
    (0x1117, "DEVICE_MOP_MODE_SET_REQ"),
    (0x1118, "DEVICE_MOP_MODE_SET_RSP"),
    (0x1119, "DEVICE_VOICE_SET_REQ"),
    (0x111a, "DEVICE_VOICE_SET_RSP"),
    (0x111b, "DEVICE_DND_SET_REQ"),
    (0x111c, "DEVICE_DND_SET_RSP"),
    (0x111d, "DEVICE_ORDER_LIST_SET_REQ"),
    (0x111e, "DEVICE_ORDER_LIST_SET_RSP"),
    (0x111f, "DEVICE_ORDER_LIST_GET_REQ"),
    (0x1120, "DEVICE_ORDER_LIST_GET_RSP"),
    // Map exchange (binary payloads)
    (0x1201, "DEVICE_MAPID_GET_GLOBAL_INFO_REQ"),
    (0x1202, "DEVICE_MAPID_GET_GLOBAL_INFO_RSP"),
    (0x1203, "DEVICE_MAPID_PUSH_MAP_INFO"),
    (0x1204, "DEVICE_MAPID_PUSH_MAP_INFO_RSP"),
    (0x1205, "DEVICE_MAPID_PUSH_POSITION_INFO"),
    (0x1206, "DEVICE_MAPID_PUSH_POSITION_INFO_RSP"),
    (0x1207, "DEVICE_MAPID_PUSH_CHARGE_POSITION_INFO"),
    (0x1208, "DEVICE_MAPID_PUSH_CHARGE_POSITION_INFO_RSP"),
    (0x1209, "DEVICE_MAPID_PUSH_ALL_MEMORY_MAP_INFO"),
    (0x120a, "DEVICE_MAPID_PUSH_ALL_MEMORY_MAP_INFO_RSP"),
    (0x120b, "DEVICE_MAPID_SET_NAVIGATION_REQ"),
    (0x120c, "DEVICE_MAPID_SET_NAVIGATION_RSP"),
    (0x120d, "DEVICE_MAPID_SET_AREA_CLEAN_INFO_REQ"),
    (0x120e, "DEVICE_MAPID_SET_AREA_CLEAN_INFO_RSP"),
    (0x120f, "DEVICE_MAPID_SET_PLAN_PARAMS_REQ"),
    (0x1210, "DEVICE_MAPID_SET_PLAN_PARAMS_RSP"),
    (0x1211, "DEVICE_MAPID_SELECT_MAP_PLAN_REQ"),
    (0x1212, "DEVICE_MAPID_SELECT_MAP_PLAN_RSP"),
    (0x1213, "DEVICE_MAPID_WORK_STATUS_PUSH_REQ"),
    (0x1214, "DEVICE_MAPID_WORK_STATUS_PUSH_RSP"),
    (0x1215, "DEVICE_MAPID_GET_MAP_INFO_REQ"),
    (0x1216, "DEVICE_MAPID_GET_MAP_INFO_RSP"),
    // Server pushes and user settings
    (0x1301, "PUSH_DEVICE_AGENT_SETTING_REQ"),
    (0x1302, "PUSH_DEVICE_AGENT_SETTING_RSP"),
    (0x1303, "PUSH_DEVICE_PACKAGE_UPGRADE_INFO_REQ"),
    (0x1304, "PUSH_DEVICE_PACKAGE_UPGRADE_INFO_RSP"),
    (0x1305, "USER_SET_DEVICE_QUIETHOURS_REQ"),
    (0x1306, "USER_SET_DEVICE_QUIETHOURS_RSP"),
    (0x1307, "USER_GET_DEVICE_QUIETHOURS_REQ"),
    (0x1308, "USER_GET_DEVICE_QUIETHOURS_RSP"),
    (0x1309, "USER_SET_DEVICE_CLEANPREFERENCE_REQ"),
    (0x130a, "USER_SET_DEVICE_CLEANPREFERENCE_RSP"),
    (0x130b, "USER_GET_DEVICE_CLEANPREFERENCE_REQ"),
    (0x130c, "USER_GET_DEVICE_CLEANPREFERENCE_RSP"),
    (0x130d, "USER_KICKOUT_CMD"),
];

fn by_code() -> &'static HashMap<u16, &'static str> {
    static MAP: OnceLock<HashMap<u16, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| OPCODES.iter().copied().collect())
}

fn by_name() -> &'static HashMap<&'static str, u16> {
    static MAP: OnceLock<HashMap<&'static str, u16>> = OnceLock::new();
    MAP.get_or_init(|| OPCODES.iter().map(|&(code, name)| (name, code)).collect())
}

/// A validated 16-bit opcode that always carries its symbolic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    code: u16,
    name: &'static str,
}

impl Opcode {
    /// Look up an opcode by numeric code. Values above the 16-bit protocol
    /// bound are out of range; in-range values not present in the table are
    /// unknown.
    pub fn from_code(code: u32) -> Result<Self> {
        if code > u32::from(u16::MAX) {
            return Err(CodecError::OutOfRange {
                value: i64::from(code),
                min: 0,
                max: i64::from(u16::MAX),
            }
            .into());
        }

        let code = code as u16;
        let name = by_code()
            .get(&code)
            .copied()
            .ok_or_else(|| CodecError::UnknownOpcode(format!("0x{code:04x}")))?;

        Ok(Self { code, name })
    }

    /// Look up an opcode by symbolic name.
    pub fn from_name(name: &str) -> Result<Self> {
        let (&name, &code) = by_name()
            .get_key_value(name)
            .ok_or_else(|| CodecError::UnknownOpcode(name.to_string()))?;
        Ok(Self { code, name })
    }

    pub fn code(self) -> u16 {
        self.code
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:04x})", self.name, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_lookup_both_directions() {
        let op = Opcode::from_code(0x1012).unwrap();
        assert_eq!(op.name(), "DEVICE_GETTIME_RSP");
        assert_eq!(op.code(), 0x1012);

        let op = Opcode::from_name("DEVICE_GETTIME_RSP").unwrap();
        assert_eq!(op.code(), 0x1012);
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(matches!(
            Opcode::from_code(0x7fff),
            Err(Error::Codec(CodecError::UnknownOpcode(_)))
        ));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            Opcode::from_code(0x10000),
            Err(Error::Codec(CodecError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert!(Opcode::from_name("DEVICE_NO_SUCH_OP").is_err());
    }

    #[test]
    fn test_table_has_no_duplicates() {
        assert_eq!(by_code().len(), OPCODES.len());
        assert_eq!(by_name().len(), OPCODES.len());
    }

    #[test]
    fn test_display() {
        let op = Opcode::from_code(0x0001).unwrap();
        assert_eq!(op.to_string(), "COMMON_ERROR_REPLY(0x0001)");
    }
}
