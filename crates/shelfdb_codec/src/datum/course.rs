//! Course variant and its fixed layout.

use crate::error::CodecResult;
use crate::fields;
use crate::RecordCodec;
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Maximum number of enrolled students per course.
pub const STUDENTS_CAP: usize = 20;

const TITLE_WIDTH: usize = 256;

/// A course with a textbook and enrolled students.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CourseDatum {
    /// Stable identifier; doubles as the store key.
    pub course_id: u32,
    /// Item id of the assigned textbook.
    pub textbook_id: u64,
    /// Course title, at most 256 bytes.
    pub title: String,
    /// Course end date as days since the Unix epoch.
    pub end_date: i64,
    /// Enrolled student ids. Unused slots stay zero.
    pub students: [u32; STUDENTS_CAP],
}

impl CourseDatum {
    /// Serialized size of the entry section.
    pub const SIZE: usize = 4 // course_id
        + 8 // textbook_id
        + TITLE_WIDTH
        + 8 // end_date
        + STUDENTS_CAP * 4;
}

/// Codec for [`CourseDatum`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct CourseCodec;

impl RecordCodec for CourseCodec {
    type Entry = CourseDatum;

    fn entry_size(&self) -> usize {
        CourseDatum::SIZE
    }

    fn encode_entry(&self, entry: &CourseDatum, buf: &mut BytesMut) -> CodecResult<()> {
        buf.put_u32(entry.course_id);
        buf.put_u64(entry.textbook_id);
        fields::put_fixed_str(buf, &entry.title, TITLE_WIDTH);
        buf.put_i64(entry.end_date);
        fields::put_u32_array(buf, &entry.students);
        Ok(())
    }

    fn decode_entry(&self, buf: &mut &[u8]) -> CodecResult<CourseDatum> {
        let course_id = buf.get_u32();
        let textbook_id = buf.get_u64();
        let title = fields::get_fixed_str(buf, TITLE_WIDTH)?;
        let end_date = buf.get_i64();
        let students = fields::get_u32_array(buf);

        Ok(CourseDatum {
            course_id,
            textbook_id,
            title,
            end_date,
            students,
        })
    }
}
