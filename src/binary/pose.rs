//! Robot and charger pose structs.

use super::{ByteReader, ByteWriter};
use crate::error::Result;

/// Current robot pose on a map. `update` is non-zero when the pose was
/// produced by live localization rather than replayed from history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePose {
    pub map_head_id: u32,
    pub pose_id: u32,
    pub update: u8,
    pub x: f32,
    pub y: f32,
    pub phi: f32,
}

impl DevicePose {
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            map_head_id: reader.read_u32()?,
            pose_id: reader.read_u32()?,
            update: reader.read_u8()?,
            x: reader.read_f32()?,
            y: reader.read_f32()?,
            phi: reader.read_f32()?,
        })
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.map_head_id);
        writer.write_u32(self.pose_id);
        writer.write_u8(self.update);
        writer.write_f32(self.x);
        writer.write_f32(self.y);
        writer.write_f32(self.phi);
    }
}

/// Charger dock pose on a map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargePose {
    pub pose_id: u32,
    pub x: f32,
    pub y: f32,
    pub phi: f32,
}

impl ChargePose {
    pub fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            pose_id: reader.read_u32()?,
            x: reader.read_f32()?,
            y: reader.read_f32()?,
            phi: reader.read_f32()?,
        })
    }

    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.pose_id);
        writer.write_f32(self.x);
        writer.write_f32(self.y);
        writer.write_f32(self.phi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_pose_matches_wire_capture() {
        // DEVICE_MAPID_PUSH_POSITION_INFO payload from a live device.
        let raw = [
            0x01, 0x00, 0x00, 0x00, // map_head_id = 1
            0x02, 0x00, 0x00, 0x00, // pose_id = 2
            0x01, // update
            0x00, 0x00, 0x40, 0x40, // x = 3.0
            0x00, 0x00, 0x80, 0x40, // y = 4.0
            0x00, 0x00, 0x00, 0x00, // phi = 0.0
        ];
        let mut reader = ByteReader::new(&raw);
        let pose = DevicePose::decode(&mut reader).unwrap();
        assert_eq!(reader.remaining(), 0);
        assert_eq!(
            pose,
            DevicePose {
                map_head_id: 1,
                pose_id: 2,
                update: 1,
                x: 3.0,
                y: 4.0,
                phi: 0.0,
            }
        );

        let mut writer = ByteWriter::new();
        pose.encode(&mut writer);
        assert_eq!(writer.into_vec(), raw);
    }

    #[test]
    fn test_charge_pose_round_trip() {
        let pose = ChargePose {
            pose_id: 9,
            x: -1.25,
            y: 0.5,
            phi: 1.5707964,
        };
        let mut writer = ByteWriter::new();
        pose.encode(&mut writer);
        let buf = writer.into_vec();
        assert_eq!(buf.len(), 16);

        let mut reader = ByteReader::new(&buf);
        assert_eq!(ChargePose::decode(&mut reader).unwrap(), pose);
    }
}
