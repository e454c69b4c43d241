//! Map payload behavior through the full payload codec.

use dustlink::binary::area::{CleanPlanInfo, CleanRoomInfo, MapPlanName};
use dustlink::binary::map::{
    MapGrid, MapGridHeader, MapInfo, MapStatusInfo, MASK_GRID, MASK_PLAN_LIST, MASK_ROBOT,
    MASK_ROOM_MATRIX, MASK_STATUS,
};
use dustlink::binary::pose::DevicePose;
use dustlink::binary::{deflate, ByteWriter};
use dustlink::error::{DomainError, Error};
use dustlink::opcode::Opcode;
use dustlink::protocol::{PayloadCodec, PayloadData};

fn push_opcode() -> Opcode {
    Opcode::from_name("DEVICE_MAPID_PUSH_MAP_INFO").unwrap()
}

fn sample_map() -> MapInfo {
    MapInfo {
        mask: MASK_STATUS | MASK_GRID | MASK_ROBOT,
        status: Some(MapStatusInfo {
            map_head_id: 7,
            has_history_map: 1,
            working_mode: 2,
            battery_percent: 66,
            charge_state: 0,
            clean_time: 541,
            clean_size: 23,
            fault_code: 0,
            alarm_status: 0,
            language: 2,
        }),
        grid: Some(MapGrid {
            head: MapGridHeader {
                map_head_id: 7,
                map_valid: 1,
                map_type: 0,
                size_x: 8,
                size_y: 8,
                min_x: -2.0,
                min_y: -2.0,
                max_x: 2.0,
                max_y: 2.0,
                resolution: 0.05,
            },
            grid: (0..64).map(|i| (i % 4) as u8).collect(),
        }),
        robot: Some(DevicePose {
            map_head_id: 7,
            pose_id: 1,
            update: 1,
            x: 0.25,
            y: -0.75,
            phi: 1.5,
        }),
        ..MapInfo::default()
    }
}

#[test]
fn test_map_push_round_trip_through_compression() {
    let map = sample_map();
    let bytes = PayloadCodec::encode(push_opcode(), &PayloadData::Map(map.clone())).unwrap();

    // Must be smaller than the raw struct thanks to zlib.
    assert!(bytes.len() < map.encode().unwrap().len());
    assert_eq!(
        PayloadCodec::decode(push_opcode(), &bytes).unwrap(),
        PayloadData::Map(map)
    );
}

#[test]
fn test_narrow_mask_firmware_payload_decodes() {
    // Older firmware writes a u16 mask.
    let mut writer = ByteWriter::new();
    writer.write_u16(MASK_ROBOT as u16);
    DevicePose {
        map_head_id: 1,
        pose_id: 9,
        update: 0,
        x: 1.0,
        y: 2.0,
        phi: 3.0,
    }
    .encode(&mut writer);
    let compressed = deflate(&writer.into_vec()).unwrap();

    match PayloadCodec::decode(push_opcode(), &compressed).unwrap() {
        PayloadData::Map(map) => {
            assert_eq!(map.mask, MASK_ROBOT);
            assert_eq!(map.robot.unwrap().pose_id, 9);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[test]
fn test_room_matrix_requires_plan_section() {
    let mut writer = ByteWriter::new();
    writer.write_u32(MASK_ROOM_MATRIX);
    writer.write_bytes(&[0, 1, 1, 0]);
    let compressed = deflate(&writer.into_vec()).unwrap();

    let err = PayloadCodec::decode(push_opcode(), &compressed).unwrap_err();
    assert!(matches!(
        err,
        Error::Domain(DomainError::RoomMatrixWithoutPlan)
    ));
}

#[test]
fn test_room_matrix_with_plan_round_trips() {
    let plan = CleanPlanInfo {
        current_map_id: 1,
        map_names: vec![MapPlanName {
            map_head_id: 1,
            map_name: "Flat".into(),
        }],
        rooms: vec![
            CleanRoomInfo {
                room_id: 1,
                room_name: "Kitchen".into(),
                room_state: 0,
                room_x: 0.0,
                room_y: 0.0,
            },
            CleanRoomInfo {
                room_id: 2,
                room_name: "Bedroom".into(),
                room_state: 0,
                room_x: 3.0,
                room_y: 1.0,
            },
            CleanRoomInfo {
                room_id: 3,
                room_name: "Hall".into(),
                room_state: 0,
                room_x: 1.5,
                room_y: -1.0,
            },
        ],
        plans: Vec::new(),
    };
    let map = MapInfo {
        mask: MASK_PLAN_LIST | MASK_ROOM_MATRIX,
        plan: Some(plan),
        room_matrix: Some(vec![0, 1, 0, 1, 0, 1, 0, 1, 0]),
        ..MapInfo::default()
    };

    let bytes = PayloadCodec::encode(push_opcode(), &PayloadData::Map(map.clone())).unwrap();
    assert_eq!(
        PayloadCodec::decode(push_opcode(), &bytes).unwrap(),
        PayloadData::Map(map)
    );
}

#[test]
fn test_trailing_bytes_after_sections_rejected() {
    let map = sample_map();
    let mut raw = map.encode().unwrap();
    raw.push(0xcc);
    let compressed = deflate(&raw).unwrap();

    let err = PayloadCodec::decode(push_opcode(), &compressed).unwrap_err();
    assert!(matches!(err, Error::Domain(DomainError::UnreadBytes(_))));
}

#[test]
fn test_uncompressed_map_payload_rejected() {
    // Raw (non-zlib) bytes must not pass for a map payload.
    let raw = sample_map().encode().unwrap();
    assert!(PayloadCodec::decode(push_opcode(), &raw).is_err());
}
