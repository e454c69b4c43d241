//! Published message schemas for protobuf-encoded payloads.
//!
//! Every opcode that is not served by one of the hand-written binary codecs
//! resolves here: the opcode name keys a protobuf schema, and the message
//! structs below are the ahead-of-time form of those schemas. The opcode →
//! schema lookup is the only coupling point, so firmware additions become a
//! new struct plus one registry line.

use prost::Message as _;

use crate::error::{CodecError, Result};
use crate::opcode::Opcode;

/// Generic error payload: numeric result code, human-readable reason and the
/// offending opcode value. Used for "device not registered" and "target user
/// offline" replies.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ErrorReply {
    #[prost(uint32, tag = "1")]
    pub result: u32,
    #[prost(string, tag = "2")]
    pub error: String,
    #[prost(uint32, tag = "3")]
    pub opcode: u32,
}

/// Trivial acknowledgment carrying only a result code.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommonResponse {
    #[prost(uint32, tag = "1")]
    pub result: u32,
}

/// Placeholder for opcodes whose payload is always empty.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EmptyBody {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClientOnlineReq {
    #[prost(string, tag = "1")]
    pub device_serial_number: String,
    #[prost(uint32, tag = "2")]
    pub online_reason: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClientOnlineRsp {
    #[prost(uint32, tag = "1")]
    pub result: u32,
    #[prost(string, tag = "2")]
    pub reason: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceRegisterReq {
    #[prost(string, tag = "1")]
    pub device_serial_number: String,
    #[prost(string, tag = "2")]
    pub software_version: String,
    #[prost(string, tag = "3")]
    pub hardware_version: String,
    #[prost(string, tag = "4")]
    pub mac: String,
    #[prost(uint32, tag = "5")]
    pub device_type: u32,
    #[prost(uint32, tag = "6")]
    pub customer_firmware_id: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceRegisterRsp {
    #[prost(uint32, tag = "1")]
    pub result: u32,
    #[prost(uint32, tag = "2")]
    pub device_id: u32,
    #[prost(uint32, tag = "3")]
    pub user_id: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceTimeBody {
    #[prost(uint64, tag = "1")]
    pub device_time: u64,
    #[prost(uint32, tag = "2")]
    pub device_timezone: u32,
}

/// Reply shape shared by DEVICE_GETTIME_RSP and DEVICE_TIME_SYNC_RSP.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceTimeRsp {
    #[prost(uint32, tag = "1")]
    pub result: u32,
    #[prost(message, optional, tag = "3")]
    pub body: Option<DeviceTimeBody>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceSetTimeReq {
    #[prost(uint64, tag = "1")]
    pub device_time: u64,
    #[prost(uint32, tag = "2")]
    pub device_timezone: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceStatusBody {
    #[prost(uint32, tag = "1")]
    pub work_mode: u32,
    #[prost(uint32, tag = "2")]
    pub battery: u32,
    #[prost(bool, tag = "3")]
    pub charge_status: bool,
    #[prost(uint32, tag = "4")]
    pub fan_speed: u32,
    #[prost(uint32, tag = "5")]
    pub water_level: u32,
    #[prost(uint32, tag = "6")]
    pub clean_time: u32,
    #[prost(uint32, tag = "7")]
    pub clean_size: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceStatusRsp {
    #[prost(uint32, tag = "1")]
    pub result: u32,
    #[prost(message, optional, tag = "2")]
    pub body: Option<DeviceStatusBody>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WlanInfoBody {
    #[prost(string, tag = "1")]
    pub ssid: String,
    #[prost(string, tag = "2")]
    pub ip: String,
    #[prost(string, tag = "3")]
    pub mac: String,
    #[prost(int32, tag = "4")]
    pub rssi: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceWlanInfoRsp {
    #[prost(uint32, tag = "1")]
    pub result: u32,
    #[prost(message, optional, tag = "2")]
    pub body: Option<WlanInfoBody>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BatteryInfoRep {
    #[prost(uint32, tag = "1")]
    pub battery_level: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PackageVersion {
    #[prost(string, tag = "1")]
    pub package_name: String,
    #[prost(string, tag = "2")]
    pub package_version: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VersionInfoUpdateReq {
    #[prost(string, tag = "1")]
    pub software_version: String,
    #[prost(string, tag = "2")]
    pub hardware_version: String,
    #[prost(message, repeated, tag = "3")]
    pub package_versions: Vec<PackageVersion>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CleanTaskReport {
    #[prost(uint32, tag = "1")]
    pub task_id: u32,
    #[prost(uint32, tag = "2")]
    pub clean_time: u32,
    #[prost(uint32, tag = "3")]
    pub clean_size: u32,
    #[prost(uint64, tag = "4")]
    pub start_time: u64,
    #[prost(bool, tag = "5")]
    pub complete: bool,
    #[prost(uint32, tag = "6")]
    pub map_head_id: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CleanMapReport {
    #[prost(uint32, tag = "1")]
    pub task_id: u32,
    #[prost(uint32, tag = "2")]
    pub map_head_id: u32,
    #[prost(string, tag = "3")]
    pub map_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceErrorReport {
    #[prost(uint32, tag = "1")]
    pub fault_code: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceConfigUpdateReq {
    #[prost(string, tag = "1")]
    pub config: String,
}

/// Single-value command used by the simple set/start requests (fan speed,
/// water level, mop mode, voice volume, manual direction, map info masks).
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetValueReq {
    #[prost(uint32, tag = "1")]
    pub value: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RoomCleanReq {
    #[prost(uint32, repeated, tag = "1")]
    pub room_ids: Vec<u32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DndSetting {
    #[prost(bool, tag = "1")]
    pub enable: bool,
    #[prost(uint32, tag = "2")]
    pub begin_time: u32,
    #[prost(uint32, tag = "3")]
    pub end_time: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QuietHoursRsp {
    #[prost(uint32, tag = "1")]
    pub result: u32,
    #[prost(message, optional, tag = "2")]
    pub body: Option<DndSetting>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OrderInfo {
    #[prost(uint32, tag = "1")]
    pub order_id: u32,
    #[prost(bool, tag = "2")]
    pub enable: bool,
    #[prost(bool, tag = "3")]
    pub repeat: bool,
    #[prost(uint32, tag = "4")]
    pub week_day: u32,
    #[prost(uint32, tag = "5")]
    pub day_time: u32,
    #[prost(uint32, tag = "6")]
    pub clean_mode: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OrderListSetReq {
    #[prost(message, repeated, tag = "1")]
    pub orders: Vec<OrderInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OrderListRsp {
    #[prost(uint32, tag = "1")]
    pub result: u32,
    #[prost(message, repeated, tag = "2")]
    pub orders: Vec<OrderInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AgentSettingReq {
    #[prost(bool, tag = "1")]
    pub ota_enable: bool,
    #[prost(bool, tag = "2")]
    pub voice_enable: bool,
    #[prost(bool, tag = "3")]
    pub led_enable: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpgradePackageInfoReq {
    #[prost(string, tag = "1")]
    pub package_url: String,
    #[prost(string, tag = "2")]
    pub package_version: String,
    #[prost(bool, tag = "3")]
    pub force: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CleanPreferenceRsp {
    #[prost(uint32, tag = "1")]
    pub result: u32,
    #[prost(uint32, tag = "2")]
    pub mode: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NavigationReq {
    #[prost(uint32, tag = "1")]
    pub map_head_id: u32,
    #[prost(float, tag = "2")]
    pub pose_x: f32,
    #[prost(float, tag = "3")]
    pub pose_y: f32,
    #[prost(float, tag = "4")]
    pub pose_phi: f32,
    #[prost(uint32, tag = "5")]
    pub ctrl_value: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SelectMapPlanReq {
    #[prost(uint32, tag = "1")]
    pub map_head_id: u32,
    #[prost(uint32, tag = "2")]
    pub plan_id: u32,
}

macro_rules! message_union {
    ( $( $ty:ident ),* $(,)? ) => {
        /// Closed union over every schema-backed payload message.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Message {
            $( $ty($ty), )*
        }

        $(
            impl From<$ty> for Message {
                fn from(m: $ty) -> Self {
                    Message::$ty(m)
                }
            }
        )*
    };
}

message_union! {
    ErrorReply,
    CommonResponse,
    EmptyBody,
    ClientOnlineReq,
    ClientOnlineRsp,
    DeviceRegisterReq,
    DeviceRegisterRsp,
    DeviceTimeRsp,
    DeviceSetTimeReq,
    DeviceStatusBody,
    DeviceStatusRsp,
    DeviceWlanInfoRsp,
    BatteryInfoRep,
    VersionInfoUpdateReq,
    CleanTaskReport,
    CleanMapReport,
    DeviceErrorReport,
    DeviceConfigUpdateReq,
    SetValueReq,
    RoomCleanReq,
    DndSetting,
    QuietHoursRsp,
    OrderListSetReq,
    OrderListRsp,
    AgentSettingReq,
    UpgradePackageInfoReq,
    CleanPreferenceRsp,
    NavigationReq,
    SelectMapPlanReq,
}

macro_rules! registry {
    ( $( $op:literal => $ty:ident ),* $(,)? ) => {
        /// Opcode names that carry a generic protobuf schema.
        pub const SCHEMA_OPCODES: &[&str] = &[ $( $op, )* ];

        /// Check whether an opcode name has a registered generic schema.
        pub fn has_schema(name: &str) -> bool {
            matches!(name, $( $op )|*)
        }

        /// Decode a schema-backed payload. Returns `None` when the opcode
        /// has no registered schema.
        pub fn decode_message(opcode: Opcode, buf: &[u8]) -> Result<Option<Message>> {
            let message = match opcode.name() {
                $(
                    $op => Message::$ty($ty::decode(buf).map_err(|e| {
                        CodecError::InvalidArgument(format!("{}: {e}", opcode.name()))
                    })?),
                )*
                _ => return Ok(None),
            };
            Ok(Some(message))
        }

        /// Encode a schema-backed payload, validating the message variant
        /// against the opcode's registered schema.
        pub fn encode_message(opcode: Opcode, message: &Message) -> Result<Vec<u8>> {
            match (opcode.name(), message) {
                $( ($op, Message::$ty(m)) => Ok(m.encode_to_vec()), )*
                ($( $op )|*, _) => Err(CodecError::InvalidArgument(format!(
                    "message does not match schema for {}",
                    opcode.name()
                ))
                .into()),
                _ => Err(CodecError::UnknownOpcode(opcode.name().to_string()).into()),
            }
        }
    };
}

// Several opcodes share one message shape, so types repeat on the right.
// Opcodes absent from this table are either served by the hand-written
// binary codecs or rejected as unencodable.
registry! {
    "COMMON_ERROR_REPLY" => ErrorReply,
    "CLIENT_ONLINE_REQ" => ClientOnlineReq,
    "CLIENT_ONLINE_RSP" => ClientOnlineRsp,
    "CLIENT_HEARTBEAT_REQ" => EmptyBody,
    "CLIENT_HEARTBEAT_RSP" => CommonResponse,
    "CLIENT_OFFLINE_REQ" => EmptyBody,
    "CLIENT_OFFLINE_RSP" => CommonResponse,
    "DEVICE_REGISTER_REQ" => DeviceRegisterReq,
    "DEVICE_REGISTER_RSP" => DeviceRegisterRsp,
    "DEVICE_CONTROL_LOCK_REQ" => EmptyBody,
    "DEVICE_CONTROL_LOCK_RSP" => CommonResponse,
    "DEVICE_CONTROL_UNLOCK_REQ" => EmptyBody,
    "DEVICE_CONTROL_UNLOCK_RSP" => CommonResponse,
    "DEVICE_STATUS_GETTING_REQ" => EmptyBody,
    "DEVICE_STATUS_GETTING_RSP" => DeviceStatusRsp,
    "DEVICE_WLAN_INFO_GETTING_REQ" => EmptyBody,
    "DEVICE_WLAN_INFO_GETTING_RSP" => DeviceWlanInfoRsp,
    "DEVICE_VERSION_INFO_UPDATE_REQ" => VersionInfoUpdateReq,
    "DEVICE_VERSION_INFO_UPDATE_RSP" => CommonResponse,
    "DEVICE_SEEK_LOCATION_REQ" => EmptyBody,
    "DEVICE_SEEK_LOCATION_RSP" => CommonResponse,
    "DEVICE_TIME_SYNC_REQ" => EmptyBody,
    "DEVICE_TIME_SYNC_RSP" => DeviceTimeRsp,
    "DEVICE_GETTIME_REQ" => EmptyBody,
    "DEVICE_GETTIME_RSP" => DeviceTimeRsp,
    "DEVICE_SETTIME_REQ" => DeviceSetTimeReq,
    "DEVICE_SETTIME_RSP" => CommonResponse,
    "DEVICE_CHARGE_REQ" => SetValueReq,
    "DEVICE_CHARGE_RSP" => CommonResponse,
    "DEVICE_BATTERY_INFO_REQ" => EmptyBody,
    "DEVICE_BATTERY_INFO_REP" => BatteryInfoRep,
    "DEVICE_EVENT_REPORT_REQ" => EmptyBody,
    "DEVICE_EVENT_REPORT_RSP" => CommonResponse,
    "DEVICE_EVENT_REPORT_CLEANTASK" => CleanTaskReport,
    "DEVICE_EVENT_REPORT_CLEANMAP" => CleanMapReport,
    "DEVICE_ERROR_REPORT_REQ" => DeviceErrorReport,
    "DEVICE_ERROR_REPORT_RSP" => CommonResponse,
    "DEVICE_CONFIG_UPDATE_REQ" => DeviceConfigUpdateReq,
    "DEVICE_CONFIG_UPDATE_RSP" => CommonResponse,
    "DEVICE_AUTO_CLEAN_REQ" => SetValueReq,
    "DEVICE_AUTO_CLEAN_RSP" => CommonResponse,
    "DEVICE_MANUAL_CTRL_REQ" => SetValueReq,
    "DEVICE_MANUAL_CTRL_RSP" => CommonResponse,
    "DEVICE_AREA_CLEAN_REQ" => SetValueReq,
    "DEVICE_AREA_CLEAN_RSP" => CommonResponse,
    "DEVICE_SPOT_CLEAN_REQ" => SetValueReq,
    "DEVICE_SPOT_CLEAN_RSP" => CommonResponse,
    "DEVICE_ROOM_CLEAN_REQ" => RoomCleanReq,
    "DEVICE_ROOM_CLEAN_RSP" => CommonResponse,
    "DEVICE_CLEAN_PAUSE_REQ" => EmptyBody,
    "DEVICE_CLEAN_PAUSE_RSP" => CommonResponse,
    "DEVICE_CLEAN_RESUME_REQ" => EmptyBody,
    "DEVICE_CLEAN_RESUME_RSP" => CommonResponse,
    "DEVICE_CLEAN_STOP_REQ" => EmptyBody,
    "DEVICE_CLEAN_STOP_RSP" => CommonResponse,
    "DEVICE_BACK_CHARGE_REQ" => EmptyBody,
    "DEVICE_BACK_CHARGE_RSP" => CommonResponse,
    "DEVICE_FAN_SPEED_SET_REQ" => SetValueReq,
    "DEVICE_FAN_SPEED_SET_RSP" => CommonResponse,
    "DEVICE_WATER_LEVEL_SET_REQ" => SetValueReq,
    "DEVICE_WATER_LEVEL_SET_RSP" => CommonResponse,
    "DEVICE_MOP_MODE_SET_REQ" => SetValueReq,
    "DEVICE_MOP_MODE_SET_RSP" => CommonResponse,
    "DEVICE_VOICE_SET_REQ" => SetValueReq,
    "DEVICE_VOICE_SET_RSP" => CommonResponse,
    "DEVICE_DND_SET_REQ" => DndSetting,
    "DEVICE_DND_SET_RSP" => CommonResponse,
    "DEVICE_ORDER_LIST_SET_REQ" => OrderListSetReq,
    "DEVICE_ORDER_LIST_SET_RSP" => CommonResponse,
    "DEVICE_ORDER_LIST_GET_REQ" => EmptyBody,
    "DEVICE_ORDER_LIST_GET_RSP" => OrderListRsp,
    "DEVICE_MAPID_GET_GLOBAL_INFO_REQ" => SetValueReq,
    "DEVICE_MAPID_PUSH_MAP_INFO_RSP" => CommonResponse,
    "DEVICE_MAPID_PUSH_POSITION_INFO_RSP" => CommonResponse,
    "DEVICE_MAPID_PUSH_CHARGE_POSITION_INFO_RSP" => CommonResponse,
    "DEVICE_MAPID_PUSH_ALL_MEMORY_MAP_INFO_RSP" => CommonResponse,
    "DEVICE_MAPID_SET_NAVIGATION_REQ" => NavigationReq,
    "DEVICE_MAPID_SET_NAVIGATION_RSP" => CommonResponse,
    "DEVICE_MAPID_SET_AREA_CLEAN_INFO_REQ" => SetValueReq,
    "DEVICE_MAPID_SET_AREA_CLEAN_INFO_RSP" => CommonResponse,
    "DEVICE_MAPID_SET_PLAN_PARAMS_REQ" => SetValueReq,
    "DEVICE_MAPID_SET_PLAN_PARAMS_RSP" => CommonResponse,
    "DEVICE_MAPID_SELECT_MAP_PLAN_REQ" => SelectMapPlanReq,
    "DEVICE_MAPID_SELECT_MAP_PLAN_RSP" => CommonResponse,
    "DEVICE_MAPID_WORK_STATUS_PUSH_REQ" => DeviceStatusBody,
    "DEVICE_MAPID_WORK_STATUS_PUSH_RSP" => CommonResponse,
    "DEVICE_MAPID_GET_MAP_INFO_REQ" => SetValueReq,
    "PUSH_DEVICE_AGENT_SETTING_REQ" => AgentSettingReq,
    "PUSH_DEVICE_AGENT_SETTING_RSP" => CommonResponse,
    "PUSH_DEVICE_PACKAGE_UPGRADE_INFO_REQ" => UpgradePackageInfoReq,
    "PUSH_DEVICE_PACKAGE_UPGRADE_INFO_RSP" => CommonResponse,
    "USER_SET_DEVICE_QUIETHOURS_REQ" => DndSetting,
    "USER_SET_DEVICE_QUIETHOURS_RSP" => CommonResponse,
    "USER_GET_DEVICE_QUIETHOURS_REQ" => EmptyBody,
    "USER_GET_DEVICE_QUIETHOURS_RSP" => QuietHoursRsp,
    "USER_SET_DEVICE_CLEANPREFERENCE_REQ" => SetValueReq,
    "USER_SET_DEVICE_CLEANPREFERENCE_RSP" => CommonResponse,
    "USER_GET_DEVICE_CLEANPREFERENCE_REQ" => EmptyBody,
    "USER_GET_DEVICE_CLEANPREFERENCE_RSP" => CleanPreferenceRsp,
    "USER_KICKOUT_CMD" => EmptyBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_registry_names_resolve() {
        // Every registry entry must name a real opcode.
        for name in SCHEMA_OPCODES {
            assert!(
                Opcode::from_name(name).is_ok(),
                "schema registered for unknown opcode {name}"
            );
        }
    }

    #[test]
    fn test_gettime_reply_matches_wire_capture() {
        // Payload of a DEVICE_GETTIME_RSP captured from a live device.
        let raw = [
            0x08, 0x00, 0x1a, 0x09, 0x08, 0x93, 0xaf, 0xee, 0xfd, 0x05, 0x10,
            0x90, 0x1c,
        ];
        let opcode = Opcode::from_name("DEVICE_GETTIME_RSP").unwrap();
        let decoded = decode_message(opcode, &raw).unwrap().unwrap();
        assert_eq!(
            decoded,
            Message::DeviceTimeRsp(DeviceTimeRsp {
                result: 0,
                body: Some(DeviceTimeBody {
                    device_time: 1_606_129_555,
                    device_timezone: 3600,
                }),
            })
        );
    }

    #[test]
    fn test_empty_payload_decodes_to_defaults() {
        let opcode = Opcode::from_name("DEVICE_CONTROL_LOCK_RSP").unwrap();
        let decoded = decode_message(opcode, &[]).unwrap().unwrap();
        assert_eq!(decoded, Message::CommonResponse(CommonResponse::default()));
    }

    #[test]
    fn test_binary_opcodes_have_no_schema() {
        assert!(!has_schema("DEVICE_MAPID_PUSH_MAP_INFO"));
        assert!(!has_schema("DEVICE_MAPID_PUSH_POSITION_INFO"));
        assert!(has_schema("DEVICE_MAPID_PUSH_MAP_INFO_RSP"));

        let opcode = Opcode::from_name("DEVICE_MAPID_PUSH_MAP_INFO").unwrap();
        assert!(decode_message(opcode, &[0x01]).unwrap().is_none());
    }

    #[test]
    fn test_encode_rejects_mismatched_variant() {
        let opcode = Opcode::from_name("DEVICE_GETTIME_RSP").unwrap();
        let message = Message::CommonResponse(CommonResponse { result: 0 });
        let err = encode_message(opcode, &message).unwrap_err();
        assert!(matches!(
            err,
            Error::Codec(CodecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_register_request_round_trip() {
        let req = DeviceRegisterReq {
            device_serial_number: "1C27SBR0300184".into(),
            software_version: "1.0.19".into(),
            hardware_version: "3.1".into(),
            mac: "40:F4:20:AB:0E:11".into(),
            device_type: 9,
            customer_firmware_id: 1003,
        };
        let opcode = Opcode::from_name("DEVICE_REGISTER_REQ").unwrap();
        let bytes = encode_message(opcode, &Message::DeviceRegisterReq(req.clone())).unwrap();
        let decoded = decode_message(opcode, &bytes).unwrap().unwrap();
        assert_eq!(decoded, Message::DeviceRegisterReq(req));
    }
}
