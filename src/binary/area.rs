//! Clean plan, room and area structures embedded in map payloads.

use super::{ByteReader, ByteWriter};
use crate::error::{CodecError, Result};

/// Saved map name entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPlanName {
    pub map_head_id: u32,
    pub map_name: String,
}

/// A room known to the current plan. `room_x`/`room_y` locate the room label
/// on the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRoomInfo {
    pub room_id: u32,
    pub room_name: String,
    pub room_state: u8,
    pub room_x: f32,
    pub room_y: f32,
}

/// A polygon the device treats as a restricted area or a clean area,
/// depending on `area_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanArea {
    pub area_id: u32,
    pub area_type: u32,
    pub vertices: Vec<(f32, f32)>,
}

impl CleanArea {
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let area_id = reader.read_u32()?;
        let area_type = reader.read_u32()?;
        let count = reader.read_u32()?;
        let mut vertices = Vec::new();
        for _ in 0..count {
            vertices.push((reader.read_f32()?, reader.read_f32()?));
        }
        Ok(Self {
            area_id,
            area_type,
            vertices,
        })
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.area_id);
        writer.write_u32(self.area_type);
        writer.write_u32(self.vertices.len() as u32);
        for &(x, y) in &self.vertices {
            writer.write_f32(x);
            writer.write_f32(y);
        }
    }
}

/// Per-room enable flag inside a plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomEnable {
    pub room_id: u8,
    pub enabled: u8,
}

/// A named cleaning plan over one map.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanPlan {
    pub plan_id: u32,
    pub plan_name: String,
    pub map_head_id: u32,
    pub areas: Vec<CleanArea>,
    pub room_enables: Vec<RoomEnable>,
}

impl CleanPlan {
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let plan_id = reader.read_u32()?;
        let plan_name = reader.read_string()?;
        let map_head_id = reader.read_u32()?;

        let area_count = reader.read_u32()?;
        let mut areas = Vec::new();
        for _ in 0..area_count {
            areas.push(CleanArea::decode(reader)?);
        }

        let enable_count = reader.read_u8()?;
        let mut room_enables = Vec::new();
        for _ in 0..enable_count {
            room_enables.push(RoomEnable {
                room_id: reader.read_u8()?,
                enabled: reader.read_u8()?,
            });
        }

        Ok(Self {
            plan_id,
            plan_name,
            map_head_id,
            areas,
            room_enables,
        })
    }

    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_u32(self.plan_id);
        writer.write_string(&self.plan_name)?;
        writer.write_u32(self.map_head_id);

        writer.write_u32(self.areas.len() as u32);
        for area in &self.areas {
            area.encode(writer);
        }

        writer.write_u8(narrow_count(self.room_enables.len(), "room enable list")?);
        for enable in &self.room_enables {
            writer.write_u8(enable.room_id);
            writer.write_u8(enable.enabled);
        }
        Ok(())
    }
}

/// Full plan block: saved map names, the room list of the current map and the
/// configured cleaning plans.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleanPlanInfo {
    pub current_map_id: u32,
    pub map_names: Vec<MapPlanName>,
    pub rooms: Vec<CleanRoomInfo>,
    pub plans: Vec<CleanPlan>,
}

impl CleanPlanInfo {
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let current_map_id = reader.read_u32()?;

        let name_count = reader.read_u8()?;
        let mut map_names = Vec::new();
        for _ in 0..name_count {
            map_names.push(MapPlanName {
                map_head_id: reader.read_u32()?,
                map_name: reader.read_string()?,
            });
        }

        let room_count = reader.read_u32()?;
        let mut rooms = Vec::new();
        for _ in 0..room_count {
            rooms.push(CleanRoomInfo {
                room_id: reader.read_u32()?,
                room_name: reader.read_string()?,
                room_state: reader.read_u8()?,
                room_x: reader.read_f32()?,
                room_y: reader.read_f32()?,
            });
        }

        let plan_count = reader.read_u8()?;
        let mut plans = Vec::new();
        for _ in 0..plan_count {
            plans.push(CleanPlan::decode(reader)?);
        }

        Ok(Self {
            current_map_id,
            map_names,
            rooms,
            plans,
        })
    }

    pub fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_u32(self.current_map_id);

        writer.write_u8(narrow_count(self.map_names.len(), "map name list")?);
        for name in &self.map_names {
            writer.write_u32(name.map_head_id);
            writer.write_string(&name.map_name)?;
        }

        writer.write_u32(self.rooms.len() as u32);
        for room in &self.rooms {
            writer.write_u32(room.room_id);
            writer.write_string(&room.room_name)?;
            writer.write_u8(room.room_state);
            writer.write_f32(room.room_x);
            writer.write_f32(room.room_y);
        }

        writer.write_u8(narrow_count(self.plans.len(), "plan list")?);
        for plan in &self.plans {
            plan.encode(writer)?;
        }
        Ok(())
    }
}

fn narrow_count(len: usize, what: &'static str) -> Result<u8> {
    u8::try_from(len).map_err(|_| {
        CodecError::InvalidArgument(format!("{what} has {len} entries, limit {}", u8::MAX)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan_info() -> CleanPlanInfo {
        CleanPlanInfo {
            current_map_id: 3,
            map_names: vec![MapPlanName {
                map_head_id: 3,
                map_name: "Ground floor".into(),
            }],
            rooms: vec![
                CleanRoomInfo {
                    room_id: 1,
                    room_name: "Kitchen".into(),
                    room_state: 0,
                    room_x: 1.5,
                    room_y: -2.0,
                },
                CleanRoomInfo {
                    room_id: 2,
                    room_name: "Hall".into(),
                    room_state: 1,
                    room_x: 0.0,
                    room_y: 0.25,
                },
            ],
            plans: vec![CleanPlan {
                plan_id: 11,
                plan_name: "Evening".into(),
                map_head_id: 3,
                areas: vec![CleanArea {
                    area_id: 1,
                    area_type: 2,
                    vertices: vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
                }],
                room_enables: vec![
                    RoomEnable {
                        room_id: 1,
                        enabled: 1,
                    },
                    RoomEnable {
                        room_id: 2,
                        enabled: 0,
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_plan_info_round_trip() {
        let info = sample_plan_info();
        let mut writer = ByteWriter::new();
        info.encode(&mut writer).unwrap();
        let buf = writer.into_vec();

        let mut reader = ByteReader::new(&buf);
        let decoded = CleanPlanInfo::decode(&mut reader).unwrap();
        assert_eq!(reader.remaining(), 0);
        assert_eq!(decoded, info);
    }

    #[test]
    fn test_truncated_plan_rejected() {
        let info = sample_plan_info();
        let mut writer = ByteWriter::new();
        info.encode(&mut writer).unwrap();
        let buf = writer.into_vec();

        let mut reader = ByteReader::new(&buf[..buf.len() - 3]);
        assert!(CleanPlanInfo::decode(&mut reader).is_err());
    }
}
