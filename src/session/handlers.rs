//! Handlers for device-initiated traffic.
//!
//! Handlers are synchronous: they project the payload into the session's
//! device state and optionally return the reply to send back on the same
//! connection. The table is validated against the opcode registry at server
//! startup.

use std::time::{SystemTime, UNIX_EPOCH};

use super::Session;
use crate::error::{CodecError, Result};
use crate::opcode::Opcode;
use crate::protocol::schema::{
    ClientOnlineRsp, CommonResponse, DeviceTimeBody, DeviceTimeRsp, Message,
};
use crate::protocol::{Payload, PayloadData};

pub(super) type Handler = fn(&Session, &Payload) -> Result<Option<Payload>>;

pub(super) const HANDLERS: &[(&str, Handler)] = &[
    ("CLIENT_ONLINE_REQ", handle_client_online),
    ("CLIENT_HEARTBEAT_REQ", handle_heartbeat),
    ("CLIENT_OFFLINE_REQ", handle_client_offline),
    ("DEVICE_TIME_SYNC_REQ", handle_time_sync),
    ("DEVICE_VERSION_INFO_UPDATE_REQ", handle_version_update),
    ("DEVICE_CONFIG_UPDATE_REQ", handle_config_update),
    ("DEVICE_BATTERY_INFO_REP", handle_battery_report),
    ("DEVICE_ERROR_REPORT_REQ", handle_error_report),
    ("DEVICE_EVENT_REPORT_REQ", handle_event_report),
    ("DEVICE_EVENT_REPORT_CLEANTASK", handle_clean_task_report),
    ("DEVICE_EVENT_REPORT_CLEANMAP", handle_clean_map_report),
    ("DEVICE_STATUS_GETTING_RSP", handle_status_snapshot),
    ("DEVICE_MAPID_GET_GLOBAL_INFO_RSP", handle_map_snapshot),
    ("DEVICE_MAPID_WORK_STATUS_PUSH_REQ", handle_work_status_push),
    ("DEVICE_MAPID_PUSH_MAP_INFO", handle_map_push),
    ("DEVICE_MAPID_PUSH_POSITION_INFO", handle_position_push),
    (
        "DEVICE_MAPID_PUSH_CHARGE_POSITION_INFO",
        handle_charge_position_push,
    ),
    (
        "DEVICE_MAPID_PUSH_ALL_MEMORY_MAP_INFO",
        handle_memory_map_push,
    ),
];

/// Opcode names the session resolves outside the handler table: the startup
/// exchange and the generic error reply.
pub(super) const SESSION_OPCODES: &[&str] = &[
    "DEVICE_CONTROL_LOCK_REQ",
    "DEVICE_CONTROL_LOCK_RSP",
    "DEVICE_STATUS_GETTING_REQ",
    "DEVICE_MAPID_GET_GLOBAL_INFO_REQ",
    "DEVICE_GETTIME_REQ",
    "DEVICE_GETTIME_RSP",
    "DEVICE_WLAN_INFO_GETTING_REQ",
    "DEVICE_WLAN_INFO_GETTING_RSP",
    "COMMON_ERROR_REPLY",
];

pub(super) fn lookup(name: &str) -> Option<Handler> {
    HANDLERS
        .iter()
        .find(|(handled, _)| *handled == name)
        .map(|&(_, handler)| handler)
}

/// Verify every handler and every fixed session opcode names a real opcode,
/// and that no opcode is handled twice. Called once at server startup.
pub fn validate_handlers() -> Result<()> {
    for (index, (name, _)) in HANDLERS.iter().enumerate() {
        Opcode::from_name(name)?;
        if HANDLERS[..index].iter().any(|(seen, _)| seen == name) {
            return Err(CodecError::InvalidArgument(format!(
                "duplicate handler for {name}"
            ))
            .into());
        }
    }
    for name in SESSION_OPCODES {
        Opcode::from_name(name)?;
    }
    Ok(())
}

fn ok_reply(opcode_name: &'static str) -> Result<Option<Payload>> {
    Session::reply_payload(
        opcode_name,
        Message::CommonResponse(CommonResponse { result: 0 }),
    )
}

fn handle_client_online(_session: &Session, _payload: &Payload) -> Result<Option<Payload>> {
    Session::reply_payload(
        "CLIENT_ONLINE_RSP",
        Message::ClientOnlineRsp(ClientOnlineRsp {
            result: 0,
            reason: String::new(),
        }),
    )
}

fn handle_heartbeat(_session: &Session, _payload: &Payload) -> Result<Option<Payload>> {
    Session::empty_reply("CLIENT_HEARTBEAT_RSP")
}

fn handle_client_offline(_session: &Session, _payload: &Payload) -> Result<Option<Payload>> {
    ok_reply("CLIENT_OFFLINE_RSP")
}

fn handle_time_sync(session: &Session, _payload: &Payload) -> Result<Option<Payload>> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Session::reply_payload(
        "DEVICE_TIME_SYNC_RSP",
        Message::DeviceTimeRsp(DeviceTimeRsp {
            result: 0,
            body: Some(DeviceTimeBody {
                device_time: now,
                device_timezone: session.config.timezone_offset_secs,
            }),
        }),
    )
}

fn handle_version_update(session: &Session, payload: &Payload) -> Result<Option<Payload>> {
    if let PayloadData::Message(Message::VersionInfoUpdateReq(req)) = &payload.data {
        let versions = req.package_versions.clone();
        session.update_state(|state| state.versions = versions);
    }
    ok_reply("DEVICE_VERSION_INFO_UPDATE_RSP")
}

fn handle_config_update(_session: &Session, _payload: &Payload) -> Result<Option<Payload>> {
    ok_reply("DEVICE_CONFIG_UPDATE_RSP")
}

fn handle_battery_report(session: &Session, payload: &Payload) -> Result<Option<Payload>> {
    if let PayloadData::Message(Message::BatteryInfoRep(rep)) = &payload.data {
        let level = rep.battery_level;
        session.update_state(|state| state.battery = Some(level));
    }
    Ok(None)
}

fn handle_error_report(session: &Session, payload: &Payload) -> Result<Option<Payload>> {
    if let PayloadData::Message(Message::DeviceErrorReport(report)) = &payload.data {
        let fault_code = report.fault_code;
        session.update_state(|state| state.fault_code = Some(fault_code));
    }
    ok_reply("DEVICE_ERROR_REPORT_RSP")
}

fn handle_event_report(_session: &Session, _payload: &Payload) -> Result<Option<Payload>> {
    ok_reply("DEVICE_EVENT_REPORT_RSP")
}

fn handle_clean_task_report(session: &Session, payload: &Payload) -> Result<Option<Payload>> {
    if let PayloadData::Message(Message::CleanTaskReport(report)) = &payload.data {
        let report = report.clone();
        session.update_state(|state| state.last_clean_task = Some(report));
    }
    ok_reply("DEVICE_EVENT_REPORT_RSP")
}

fn handle_clean_map_report(_session: &Session, _payload: &Payload) -> Result<Option<Payload>> {
    ok_reply("DEVICE_EVENT_REPORT_RSP")
}

fn handle_status_snapshot(session: &Session, payload: &Payload) -> Result<Option<Payload>> {
    if let PayloadData::Message(Message::DeviceStatusRsp(rsp)) = &payload.data {
        if let Some(body) = &rsp.body {
            let body = body.clone();
            session.update_state(|state| {
                state.battery = Some(body.battery);
                state.status = Some(body);
            });
        }
    }
    Ok(None)
}

fn handle_work_status_push(session: &Session, payload: &Payload) -> Result<Option<Payload>> {
    if let PayloadData::Message(Message::DeviceStatusBody(body)) = &payload.data {
        let body = body.clone();
        session.update_state(|state| {
            state.battery = Some(body.battery);
            state.status = Some(body);
        });
    }
    ok_reply("DEVICE_MAPID_WORK_STATUS_PUSH_RSP")
}

fn project_map(session: &Session, payload: &Payload) {
    if let PayloadData::Map(map) = &payload.data {
        let status = map.status;
        let robot = map.robot;
        let charger = map.charger;
        session.update_state(|state| {
            if let Some(status) = status {
                state.battery = Some(status.battery_percent);
                state.fault_code = Some(status.fault_code);
            }
            if let Some(robot) = robot {
                state.pose = Some(robot);
            }
            if let Some(charger) = charger {
                state.charger = Some(charger);
            }
        });
    }
}

fn handle_map_snapshot(session: &Session, payload: &Payload) -> Result<Option<Payload>> {
    project_map(session, payload);
    Ok(None)
}

fn handle_map_push(session: &Session, payload: &Payload) -> Result<Option<Payload>> {
    project_map(session, payload);
    ok_reply("DEVICE_MAPID_PUSH_MAP_INFO_RSP")
}

fn handle_position_push(session: &Session, payload: &Payload) -> Result<Option<Payload>> {
    if let PayloadData::Pose(pose) = payload.data {
        session.update_state(|state| state.pose = Some(pose));
    }
    ok_reply("DEVICE_MAPID_PUSH_POSITION_INFO_RSP")
}

fn handle_charge_position_push(session: &Session, payload: &Payload) -> Result<Option<Payload>> {
    if let PayloadData::ChargePose(pose) = payload.data {
        session.update_state(|state| state.charger = Some(pose));
    }
    ok_reply("DEVICE_MAPID_PUSH_CHARGE_POSITION_INFO_RSP")
}

fn handle_memory_map_push(_session: &Session, _payload: &Payload) -> Result<Option<Payload>> {
    ok_reply("DEVICE_MAPID_PUSH_ALL_MEMORY_MAP_INFO_RSP")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_table_is_valid() {
        validate_handlers().unwrap();
    }

    #[test]
    fn test_session_opcodes_resolve() {
        for name in SESSION_OPCODES {
            Opcode::from_name(name).unwrap();
        }
    }

    #[test]
    fn test_lookup_misses_unhandled_opcodes() {
        assert!(lookup("DEVICE_AUTO_CLEAN_REQ").is_none());
        assert!(lookup("DEVICE_MAPID_PUSH_MAP_INFO").is_some());
    }
}
