//! Map payload codec.
//!
//! A map payload is a bitmask followed by one section per set bit, in
//! ascending bit order. Older firmware writes the mask as a u16, newer
//! firmware as a u32; the decoder tries the wide form first and falls back
//! to the narrow form when the wide read does not consume the buffer
//! cleanly. Payloads arrive zlib-compressed; callers inflate before
//! decoding.

use super::area::{CleanArea, CleanPlanInfo};
use super::pose::{ChargePose, DevicePose};
use super::{ByteReader, ByteWriter};
use crate::error::{CodecError, DomainError, Result};

pub const MASK_STATUS: u32 = 0x0001;
pub const MASK_GRID: u32 = 0x0002;
pub const MASK_HISTORY: u32 = 0x0004;
pub const MASK_CHARGER: u32 = 0x0008;
pub const MASK_WALL_LIST: u32 = 0x0010;
pub const MASK_AREA_LIST: u32 = 0x0020;
pub const MASK_SPOT: u32 = 0x0040;
pub const MASK_ROBOT: u32 = 0x0080;
pub const MASK_PLAN_LIST: u32 = 0x0800;
pub const MASK_ROOM_MATRIX: u32 = 0x1000;
pub const MASK_ROOM_ENABLE: u32 = 0x2000;
pub const MASK_ROOM_SEGMENTS: u32 = 0x4000;

// Bits some firmware sets without shipping a section body. Accepted on
// decode, rejected on encode.
const TOLERATED_BITS: u32 = 0x0100 | 0x0200 | 0x0400;

const KNOWN_BITS: u32 = MASK_STATUS
    | MASK_GRID
    | MASK_HISTORY
    | MASK_CHARGER
    | MASK_WALL_LIST
    | MASK_AREA_LIST
    | MASK_SPOT
    | MASK_ROBOT
    | MASK_PLAN_LIST
    | MASK_ROOM_MATRIX
    | MASK_ROOM_ENABLE
    | MASK_ROOM_SEGMENTS
    | TOLERATED_BITS;

/// Summary block carried at the front of most map pushes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapStatusInfo {
    pub map_head_id: u32,
    pub has_history_map: u32,
    pub working_mode: u32,
    pub battery_percent: u32,
    pub charge_state: u8,
    pub clean_time: u32,
    pub clean_size: u32,
    pub fault_code: u32,
    pub alarm_status: u8,
    pub language: u8,
}

impl MapStatusInfo {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            map_head_id: reader.read_u32()?,
            has_history_map: reader.read_u32()?,
            working_mode: reader.read_u32()?,
            battery_percent: reader.read_u32()?,
            charge_state: reader.read_u8()?,
            clean_time: reader.read_u32()?,
            clean_size: reader.read_u32()?,
            fault_code: reader.read_u32()?,
            alarm_status: reader.read_u8()?,
            language: reader.read_u8()?,
        })
    }

    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.map_head_id);
        writer.write_u32(self.has_history_map);
        writer.write_u32(self.working_mode);
        writer.write_u32(self.battery_percent);
        writer.write_u8(self.charge_state);
        writer.write_u32(self.clean_time);
        writer.write_u32(self.clean_size);
        writer.write_u32(self.fault_code);
        writer.write_u8(self.alarm_status);
        writer.write_u8(self.language);
    }
}

/// Occupancy grid dimensions and world-frame extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapGridHeader {
    pub map_head_id: u32,
    pub map_valid: u32,
    pub map_type: u32,
    pub size_x: u32,
    pub size_y: u32,
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub resolution: f32,
}

impl MapGridHeader {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            map_head_id: reader.read_u32()?,
            map_valid: reader.read_u32()?,
            map_type: reader.read_u32()?,
            size_x: reader.read_u32()?,
            size_y: reader.read_u32()?,
            min_x: reader.read_f32()?,
            min_y: reader.read_f32()?,
            max_x: reader.read_f32()?,
            max_y: reader.read_f32()?,
            resolution: reader.read_f32()?,
        })
    }

    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.map_head_id);
        writer.write_u32(self.map_valid);
        writer.write_u32(self.map_type);
        writer.write_u32(self.size_x);
        writer.write_u32(self.size_y);
        writer.write_f32(self.min_x);
        writer.write_f32(self.min_y);
        writer.write_f32(self.max_x);
        writer.write_f32(self.max_y);
        writer.write_f32(self.resolution);
    }

    fn cell_count(&self) -> Result<usize> {
        (self.size_x as usize)
            .checked_mul(self.size_y as usize)
            .ok_or_else(|| {
                CodecError::InvalidArgument(format!(
                    "grid dimensions overflow: {}x{}",
                    self.size_x, self.size_y
                ))
                .into()
            })
    }
}

/// Occupancy grid: header plus one byte per cell, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct MapGrid {
    pub head: MapGridHeader,
    pub grid: Vec<u8>,
}

impl MapGrid {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let head = MapGridHeader::decode(reader)?;
        let grid = reader.read_bytes(head.cell_count()?)?;
        Ok(Self { head, grid })
    }

    fn encode(&self, writer: &mut ByteWriter) -> Result<()> {
        if self.grid.len() != self.head.cell_count()? {
            return Err(CodecError::InvalidArgument(format!(
                "grid has {} cells, header says {}x{}",
                self.grid.len(),
                self.head.size_x,
                self.head.size_y
            ))
            .into());
        }
        self.head.encode(writer);
        writer.write_bytes(&self.grid);
        Ok(())
    }
}

/// One point of the cleaning path history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    pub flag: u8,
    pub x: f32,
    pub y: f32,
}

/// Path the robot has driven during the current task.
#[derive(Debug, Clone, PartialEq)]
pub struct MapHistory {
    pub map_head_id: u32,
    pub points: Vec<HistoryPoint>,
}

impl MapHistory {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let map_head_id = reader.read_u32()?;
        let count = reader.read_u32()?;
        let mut points = Vec::new();
        for _ in 0..count {
            points.push(HistoryPoint {
                flag: reader.read_u8()?,
                x: reader.read_f32()?,
                y: reader.read_f32()?,
            });
        }
        Ok(Self {
            map_head_id,
            points,
        })
    }

    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.map_head_id);
        writer.write_u32(self.points.len() as u32);
        for point in &self.points {
            writer.write_u8(point.flag);
            writer.write_f32(point.x);
            writer.write_f32(point.y);
        }
    }
}

/// Wall or area polygons attached to a map.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaListInfo {
    pub map_head_id: u32,
    pub areas: Vec<CleanArea>,
}

impl AreaListInfo {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let map_head_id = reader.read_u32()?;
        let count = reader.read_u32()?;
        let mut areas = Vec::new();
        for _ in 0..count {
            areas.push(CleanArea::decode(reader)?);
        }
        Ok(Self { map_head_id, areas })
    }

    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.map_head_id);
        writer.write_u32(self.areas.len() as u32);
        for area in &self.areas {
            area.encode(writer);
        }
    }
}

/// Spot-clean target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotInfo {
    pub map_head_id: u32,
    pub ctrl_value: u32,
    pub x: f32,
    pub y: f32,
    pub phi: f32,
}

impl SpotInfo {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            map_head_id: reader.read_u32()?,
            ctrl_value: reader.read_u32()?,
            x: reader.read_f32()?,
            y: reader.read_f32()?,
            phi: reader.read_f32()?,
        })
    }

    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.map_head_id);
        writer.write_u32(self.ctrl_value);
        writer.write_f32(self.x);
        writer.write_f32(self.y);
        writer.write_f32(self.phi);
    }
}

// The room enable section carries 50 reserved bytes after the size field.
const ROOM_ENABLE_RESERVED: usize = 50;

/// Room enable flags section. Only the header survives; the flag bytes are
/// reserved on current firmware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomEnableInfo {
    pub map_head_id: u32,
    pub size: u8,
}

impl RoomEnableInfo {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let info = Self {
            map_head_id: reader.read_u32()?,
            size: reader.read_u8()?,
        };
        reader.skip(ROOM_ENABLE_RESERVED)?;
        Ok(info)
    }

    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.map_head_id);
        writer.write_u8(self.size);
        writer.write_bytes(&[0u8; ROOM_ENABLE_RESERVED]);
    }
}

/// One pixel of a room segmentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomPixel {
    pub x: i16,
    pub y: i16,
    pub mask: u8,
}

/// Pixel list of one segmented room.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSegment {
    pub room_id: u32,
    pub pixels: Vec<RoomPixel>,
}

impl RoomSegment {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let room_id = reader.read_u32()?;
        let count = reader.read_u32()?;
        let mut pixels = Vec::new();
        for _ in 0..count {
            pixels.push(RoomPixel {
                x: reader.read_i16()?,
                y: reader.read_i16()?,
                mask: reader.read_u8()?,
            });
        }
        Ok(Self { room_id, pixels })
    }

    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.room_id);
        writer.write_u32(self.pixels.len() as u32);
        for pixel in &self.pixels {
            writer.write_i16(pixel.x);
            writer.write_i16(pixel.y);
            writer.write_u8(pixel.mask);
        }
    }
}

/// A decoded map payload. Each option mirrors one mask bit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapInfo {
    pub mask: u32,
    pub status: Option<MapStatusInfo>,
    pub grid: Option<MapGrid>,
    pub history: Option<MapHistory>,
    pub charger: Option<ChargePose>,
    pub wall_list: Option<AreaListInfo>,
    pub area_list: Option<AreaListInfo>,
    pub spot: Option<SpotInfo>,
    pub robot: Option<DevicePose>,
    pub plan: Option<CleanPlanInfo>,
    /// Room connectivity matrix, row-major over the plan's room list.
    pub room_matrix: Option<Vec<u8>>,
    pub room_enable: Option<RoomEnableInfo>,
    pub room_segments: Option<Vec<RoomSegment>>,
}

impl MapInfo {
    /// Decode an inflated map payload, trying the wide mask first. When the
    /// narrow fallback fails too, the wide error is reported since that is
    /// the format current firmware writes.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        match Self::decode_wide(buf) {
            Ok(info) => Ok(info),
            Err(wide_err) => Self::decode_narrow(buf).map_err(|_| wide_err),
        }
    }

    fn decode_wide(buf: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(buf);
        let mask = reader.read_u32()?;
        Self::decode_sections(&mut reader, mask)
    }

    fn decode_narrow(buf: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(buf);
        let mask = u32::from(reader.read_u16()?);
        Self::decode_sections(&mut reader, mask)
    }

    fn decode_sections(reader: &mut ByteReader<'_>, mask: u32) -> Result<Self> {
        if mask & !KNOWN_BITS != 0 {
            return Err(
                CodecError::InvalidArgument(format!("unsupported map mask 0x{mask:08x}")).into(),
            );
        }

        let mut info = Self {
            mask,
            ..Self::default()
        };

        if mask & MASK_STATUS != 0 {
            info.status = Some(MapStatusInfo::decode(reader)?);
        }
        if mask & MASK_GRID != 0 {
            info.grid = Some(MapGrid::decode(reader)?);
        }
        if mask & MASK_HISTORY != 0 {
            info.history = Some(MapHistory::decode(reader)?);
        }
        if mask & MASK_CHARGER != 0 {
            info.charger = Some(ChargePose::decode(reader)?);
        }
        if mask & MASK_WALL_LIST != 0 {
            info.wall_list = Some(AreaListInfo::decode(reader)?);
        }
        if mask & MASK_AREA_LIST != 0 {
            info.area_list = Some(AreaListInfo::decode(reader)?);
        }
        if mask & MASK_SPOT != 0 {
            info.spot = Some(SpotInfo::decode(reader)?);
        }
        if mask & MASK_ROBOT != 0 {
            info.robot = Some(DevicePose::decode(reader)?);
        }
        if mask & MASK_PLAN_LIST != 0 {
            info.plan = Some(CleanPlanInfo::decode(reader)?);
        }
        if mask & MASK_ROOM_MATRIX != 0 {
            // The matrix dimension is the plan's room count.
            let rooms = match &info.plan {
                Some(plan) => plan.rooms.len(),
                None => return Err(DomainError::RoomMatrixWithoutPlan.into()),
            };
            info.room_matrix = Some(reader.read_bytes(rooms * rooms)?);
        }
        if mask & MASK_ROOM_ENABLE != 0 {
            info.room_enable = Some(RoomEnableInfo::decode(reader)?);
        }
        if mask & MASK_ROOM_SEGMENTS != 0 {
            let count = reader.read_u32()?;
            let mut segments = Vec::new();
            for _ in 0..count {
                segments.push(RoomSegment::decode(reader)?);
            }
            info.room_segments = Some(segments);
        }

        if reader.remaining() != 0 {
            return Err(DomainError::UnreadBytes(reader.remaining()).into());
        }
        Ok(info)
    }

    /// Encode an uncompressed map payload with a wide mask. Narrow-mask
    /// inputs re-encode wide.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.mask & TOLERATED_BITS != 0 {
            return Err(CodecError::NotImplemented(format!(
                "encoding of reserved map sections (mask 0x{:08x})",
                self.mask & TOLERATED_BITS
            ))
            .into());
        }
        if self.mask & !KNOWN_BITS != 0 {
            return Err(
                CodecError::InvalidArgument(format!("unsupported map mask 0x{:08x}", self.mask))
                    .into(),
            );
        }

        let mut writer = ByteWriter::new();
        writer.write_u32(self.mask);

        if let Some(status) = self.section(MASK_STATUS, &self.status)? {
            status.encode(&mut writer);
        }
        if let Some(grid) = self.section(MASK_GRID, &self.grid)? {
            grid.encode(&mut writer)?;
        }
        if let Some(history) = self.section(MASK_HISTORY, &self.history)? {
            history.encode(&mut writer);
        }
        if let Some(charger) = self.section(MASK_CHARGER, &self.charger)? {
            charger.encode(&mut writer);
        }
        if let Some(walls) = self.section(MASK_WALL_LIST, &self.wall_list)? {
            walls.encode(&mut writer);
        }
        if let Some(areas) = self.section(MASK_AREA_LIST, &self.area_list)? {
            areas.encode(&mut writer);
        }
        if let Some(spot) = self.section(MASK_SPOT, &self.spot)? {
            spot.encode(&mut writer);
        }
        if let Some(robot) = self.section(MASK_ROBOT, &self.robot)? {
            robot.encode(&mut writer);
        }
        if let Some(plan) = self.section(MASK_PLAN_LIST, &self.plan)? {
            plan.encode(&mut writer)?;
        }
        if let Some(matrix) = self.section(MASK_ROOM_MATRIX, &self.room_matrix)? {
            if self.mask & MASK_PLAN_LIST == 0 {
                return Err(DomainError::RoomMatrixWithoutPlan.into());
            }
            writer.write_bytes(matrix);
        }
        if let Some(enable) = self.section(MASK_ROOM_ENABLE, &self.room_enable)? {
            enable.encode(&mut writer);
        }
        if let Some(segments) = self.section(MASK_ROOM_SEGMENTS, &self.room_segments)? {
            writer.write_u32(segments.len() as u32);
            for segment in segments {
                segment.encode(&mut writer);
            }
        }

        Ok(writer.into_vec())
    }

    /// Cross-check one mask bit against its section field.
    fn section<'a, T>(&self, bit: u32, field: &'a Option<T>) -> Result<Option<&'a T>> {
        match (self.mask & bit != 0, field) {
            (true, Some(value)) => Ok(Some(value)),
            (false, None) => Ok(None),
            (true, None) => Err(CodecError::ArgumentNotProvided("map section for set mask bit").into()),
            (false, Some(_)) => Err(CodecError::InvalidArgument(format!(
                "map section present but mask bit 0x{bit:04x} unset"
            ))
            .into()),
        }
    }
}

/// Stored map archive: every remembered map with its grid and plan block.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryMapInfo {
    pub maps: Vec<MemoryMap>,
}

/// One remembered map.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryMap {
    pub head: MapGridHeader,
    pub grid: Vec<u8>,
    pub plan: CleanPlanInfo,
}

impl MemoryMapInfo {
    /// Decode an inflated stored-map payload.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(buf);
        let count = reader.read_u32()?;
        let mut maps = Vec::new();
        for _ in 0..count {
            let head = MapGridHeader::decode(&mut reader)?;
            let grid = reader.read_bytes(head.cell_count()?)?;
            let plan = CleanPlanInfo::decode(&mut reader)?;
            maps.push(MemoryMap { head, grid, plan });
        }
        if reader.remaining() != 0 {
            return Err(DomainError::UnreadBytes(reader.remaining()).into());
        }
        Ok(Self { maps })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = ByteWriter::new();
        writer.write_u32(self.maps.len() as u32);
        for map in &self.maps {
            if map.grid.len() != map.head.cell_count()? {
                return Err(CodecError::InvalidArgument(format!(
                    "stored map grid has {} cells, header says {}x{}",
                    map.grid.len(),
                    map.head.size_x,
                    map.head.size_y
                ))
                .into());
            }
            map.head.encode(&mut writer);
            writer.write_bytes(&map.grid);
            map.plan.encode(&mut writer)?;
        }
        Ok(writer.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::area::{CleanRoomInfo, MapPlanName};
    use crate::error::Error;

    fn sample_status() -> MapStatusInfo {
        MapStatusInfo {
            map_head_id: 1,
            has_history_map: 1,
            working_mode: 2,
            battery_percent: 84,
            charge_state: 0,
            clean_time: 312,
            clean_size: 18,
            fault_code: 0,
            alarm_status: 0,
            language: 2,
        }
    }

    fn sample_grid() -> MapGrid {
        MapGrid {
            head: MapGridHeader {
                map_head_id: 1,
                map_valid: 1,
                map_type: 0,
                size_x: 4,
                size_y: 3,
                min_x: -2.0,
                min_y: -1.5,
                max_x: 2.0,
                max_y: 1.5,
                resolution: 0.05,
            },
            grid: vec![0xff; 12],
        }
    }

    fn sample_plan() -> CleanPlanInfo {
        CleanPlanInfo {
            current_map_id: 1,
            map_names: vec![MapPlanName {
                map_head_id: 1,
                map_name: "Home".into(),
            }],
            rooms: vec![
                CleanRoomInfo {
                    room_id: 1,
                    room_name: "A".into(),
                    room_state: 0,
                    room_x: 0.0,
                    room_y: 0.0,
                },
                CleanRoomInfo {
                    room_id: 2,
                    room_name: "B".into(),
                    room_state: 0,
                    room_x: 1.0,
                    room_y: 1.0,
                },
            ],
            plans: Vec::new(),
        }
    }

    #[test]
    fn test_wide_mask_round_trip() {
        let info = MapInfo {
            mask: MASK_STATUS | MASK_GRID | MASK_ROBOT,
            status: Some(sample_status()),
            grid: Some(sample_grid()),
            robot: Some(DevicePose {
                map_head_id: 1,
                pose_id: 44,
                update: 1,
                x: 0.5,
                y: -0.5,
                phi: 3.0,
            }),
            ..MapInfo::default()
        };
        let buf = info.encode().unwrap();
        assert_eq!(MapInfo::decode(&buf).unwrap(), info);
    }

    #[test]
    fn test_narrow_mask_fallback() {
        // Same sections behind a u16 mask, as older firmware writes it.
        let mut writer = ByteWriter::new();
        writer.write_u16(MASK_ROBOT as u16);
        DevicePose {
            map_head_id: 1,
            pose_id: 2,
            update: 1,
            x: 3.0,
            y: 4.0,
            phi: 0.0,
        }
        .encode(&mut writer);
        let buf = writer.into_vec();

        let info = MapInfo::decode(&buf).unwrap();
        assert_eq!(info.mask, MASK_ROBOT);
        assert_eq!(info.robot.unwrap().pose_id, 2);
    }

    #[test]
    fn test_tolerated_bits_accepted_on_decode_only() {
        let mut writer = ByteWriter::new();
        writer.write_u32(MASK_STATUS | 0x0100);
        sample_status().encode(&mut writer);
        let buf = writer.into_vec();

        let info = MapInfo::decode(&buf).unwrap();
        assert_eq!(info.mask, MASK_STATUS | 0x0100);
        assert_eq!(info.status, Some(sample_status()));

        let err = info.encode().unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::NotImplemented(_))));
    }

    #[test]
    fn test_room_matrix_requires_plan() {
        let mut writer = ByteWriter::new();
        writer.write_u32(MASK_ROOM_MATRIX);
        writer.write_bytes(&[0, 1, 1, 0]);
        let err = MapInfo::decode(&writer.into_vec()).unwrap_err();
        assert!(matches!(
            err,
            Error::Domain(DomainError::RoomMatrixWithoutPlan)
        ));
    }

    #[test]
    fn test_room_matrix_sized_by_plan_rooms() {
        let plan = sample_plan();
        let info = MapInfo {
            mask: MASK_PLAN_LIST | MASK_ROOM_MATRIX,
            plan: Some(plan),
            room_matrix: Some(vec![0, 1, 1, 0]),
            ..MapInfo::default()
        };
        let buf = info.encode().unwrap();
        let decoded = MapInfo::decode(&buf).unwrap();
        assert_eq!(decoded.room_matrix, Some(vec![0, 1, 1, 0]));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut writer = ByteWriter::new();
        writer.write_u32(MASK_STATUS);
        sample_status().encode(&mut writer);
        writer.write_u8(0xaa);
        let err = MapInfo::decode(&writer.into_vec()).unwrap_err();
        assert!(matches!(err, Error::Domain(DomainError::UnreadBytes(_))));
    }

    #[test]
    fn test_unknown_mask_bit_rejected() {
        // 0x8000 is unknown under both mask widths.
        let mut writer = ByteWriter::new();
        writer.write_u32(0x8000);
        let err = MapInfo::decode(&writer.into_vec()).unwrap_err();
        assert!(matches!(err, Error::Codec(CodecError::InvalidArgument(_))));
    }

    #[test]
    fn test_section_without_mask_bit_rejected_on_encode() {
        let info = MapInfo {
            mask: 0,
            status: Some(sample_status()),
            ..MapInfo::default()
        };
        assert!(info.encode().is_err());
    }

    #[test]
    fn test_memory_map_round_trip() {
        let grid = sample_grid();
        let archive = MemoryMapInfo {
            maps: vec![MemoryMap {
                head: grid.head,
                grid: grid.grid,
                plan: sample_plan(),
            }],
        };
        let buf = archive.encode().unwrap();
        assert_eq!(MemoryMapInfo::decode(&buf).unwrap(), archive);
    }
}
