use num_enum::FromPrimitive;

use crate::wire::{WireReader, WireResult, WireWriter};

/// Facility categories. Unrecognized ordinals decode to
/// [`FacilityType::Unknown`] rather than failing.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
pub enum FacilityType {
    MeetingRoom = 0,
    StandardClassroom = 1,
    LectureTheater = 2,
    StudyPod = 3,
    FootballCourt = 4,
    BadmintonCourt = 5,

    #[num_enum(default)]
    Unknown = -1,
}

/// A bookable facility. The catalog is loaded once at startup and is
/// read-mostly thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    pub id: i32,
    pub name: String,
    pub kind: FacilityType,
}

impl Facility {
    pub fn new(id: i32, name: impl Into<String>, kind: FacilityType) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
        }
    }

    pub fn encode(&self) -> WireResult<Vec<u8>> {
        let mut writer = WireWriter::new();
        writer.begin_object(3)?;
        writer.put_str("id")?;
        writer.put_i32(self.id);
        writer.put_str("name")?;
        writer.put_str(&self.name)?;
        writer.put_str("type")?;
        writer.put_enum(self.kind as i32);
        Ok(writer.into_bytes())
    }

    pub fn decode(bytes: &[u8]) -> WireResult<Self> {
        let mut reader = WireReader::new(bytes);
        let facility = Self::read(&mut reader)?;
        reader.finish()?;
        Ok(facility)
    }

    /// Decodes a facility from the middle of a larger buffer.
    pub fn read(reader: &mut WireReader<'_>) -> WireResult<Self> {
        reader.begin_object(3)?;
        reader.expect_field("id")?;
        let id = reader.read_i32()?;
        reader.expect_field("name")?;
        let name = reader.read_string()?;
        reader.expect_field("type")?;
        let kind = FacilityType::from(reader.read_enum_ordinal()?);
        Ok(Self { id, name, kind })
    }
}
