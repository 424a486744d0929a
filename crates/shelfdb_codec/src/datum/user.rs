//! User variant and its fixed layout.

use crate::error::{CodecError, CodecResult};
use crate::fields;
use crate::RecordCodec;
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Maximum number of items a user can hold at once.
pub const POSSESSIONS_CAP: usize = 10;
/// Maximum number of textbooks tracked for a student.
pub const TEXTBOOKS_CAP: usize = 5;
/// Maximum number of courses a faculty member teaches.
pub const TEACHING_CAP: usize = 5;
/// Maximum number of previously assigned books tracked for faculty.
pub const PREVIOUS_BOOKS_CAP: usize = 10;

const EMAIL_WIDTH: usize = 256;
const USERNAME_WIDTH: usize = 64;
const PASSWORD_HASH_WIDTH: usize = 64;

/// Role tag stored with every user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserRole {
    /// A student; carries a textbook list.
    #[default]
    Student,
    /// Faculty; carries teaching and previous-book lists.
    Faculty,
    /// Library staff.
    Staff,
    /// A visitor without borrowing history.
    Visitor,
    /// Management.
    Management,
}

impl UserRole {
    /// Returns the on-disk tag byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Student => 0,
            Self::Faculty => 1,
            Self::Staff => 2,
            Self::Visitor => 3,
            Self::Management => 4,
        }
    }

    /// Parses a tag byte.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownRole`] for an unassigned value.
    pub const fn from_byte(value: u8) -> CodecResult<Self> {
        match value {
            0 => Ok(Self::Student),
            1 => Ok(Self::Faculty),
            2 => Ok(Self::Staff),
            3 => Ok(Self::Visitor),
            4 => Ok(Self::Management),
            _ => Err(CodecError::UnknownRole { value }),
        }
    }
}

/// A library user.
///
/// The possession list applies to every role; the textbook list is
/// meaningful for students, teaching and previous-book lists for faculty.
/// Unused list slots stay zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserDatum {
    /// Role tag.
    pub role: UserRole,
    /// Stable identifier; doubles as the store key.
    pub user_id: u32,
    /// Contact email, at most 256 bytes.
    pub email: String,
    /// Display name, at most 64 bytes.
    pub username: String,
    /// Hash of the user's password, at most 64 bytes.
    pub password_hash: String,
    /// Item ids currently held by the user.
    pub possessions: [u64; POSSESSIONS_CAP],
    /// Whether the account has been validated.
    pub validated: bool,
    /// Textbook item ids (students).
    pub textbooks: [u64; TEXTBOOKS_CAP],
    /// Course ids taught (faculty).
    pub teaching: [u32; TEACHING_CAP],
    /// Previously assigned book ids (faculty).
    pub previous_books: [u64; PREVIOUS_BOOKS_CAP],
}

impl UserDatum {
    /// Serialized size of the entry section.
    pub const SIZE: usize = 1 // role
        + 4 // user_id
        + EMAIL_WIDTH
        + USERNAME_WIDTH
        + PASSWORD_HASH_WIDTH
        + POSSESSIONS_CAP * 8
        + 1 // validated
        + TEXTBOOKS_CAP * 8
        + TEACHING_CAP * 4
        + PREVIOUS_BOOKS_CAP * 8;
}

/// Codec for [`UserDatum`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserCodec;

impl RecordCodec for UserCodec {
    type Entry = UserDatum;

    fn entry_size(&self) -> usize {
        UserDatum::SIZE
    }

    fn encode_entry(&self, entry: &UserDatum, buf: &mut BytesMut) -> CodecResult<()> {
        buf.put_u8(entry.role.as_byte());
        buf.put_u32(entry.user_id);
        fields::put_fixed_str(buf, &entry.email, EMAIL_WIDTH);
        fields::put_fixed_str(buf, &entry.username, USERNAME_WIDTH);
        fields::put_fixed_str(buf, &entry.password_hash, PASSWORD_HASH_WIDTH);
        fields::put_u64_array(buf, &entry.possessions);
        fields::put_bool(buf, entry.validated);
        fields::put_u64_array(buf, &entry.textbooks);
        fields::put_u32_array(buf, &entry.teaching);
        fields::put_u64_array(buf, &entry.previous_books);
        Ok(())
    }

    fn decode_entry(&self, buf: &mut &[u8]) -> CodecResult<UserDatum> {
        let role = UserRole::from_byte(buf.get_u8())?;
        let user_id = buf.get_u32();
        let email = fields::get_fixed_str(buf, EMAIL_WIDTH)?;
        let username = fields::get_fixed_str(buf, USERNAME_WIDTH)?;
        let password_hash = fields::get_fixed_str(buf, PASSWORD_HASH_WIDTH)?;
        let possessions = fields::get_u64_array(buf);
        let validated = fields::get_bool(buf);
        let textbooks = fields::get_u64_array(buf);
        let teaching = fields::get_u32_array(buf);
        let previous_books = fields::get_u64_array(buf);

        Ok(UserDatum {
            role,
            user_id,
            email,
            username,
            password_hash,
            possessions,
            validated,
            textbooks,
            teaching,
            previous_books,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Record, Timestamp, RECORD_HEADER_SIZE};

    fn sample_user() -> UserDatum {
        UserDatum {
            role: UserRole::Faculty,
            user_id: 17,
            email: "a.turing@library.edu".to_string(),
            username: "aturing".to_string(),
            password_hash: "d131dd02c5e6eec4".to_string(),
            possessions: [3, 9, 0, 0, 0, 0, 0, 0, 0, 0],
            validated: true,
            textbooks: [0; TEXTBOOKS_CAP],
            teaching: [101, 204, 0, 0, 0],
            previous_books: [44, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        }
    }

    #[test]
    fn entry_size_matches_field_sum() {
        assert_eq!(UserDatum::SIZE, 610);
        assert_eq!(UserCodec.record_size(), RECORD_HEADER_SIZE + 610);
    }

    #[test]
    fn roundtrip() {
        let record = Record::with_timestamp("17", sample_user(), Timestamp::new(1_700_000_000, 42));
        let block = UserCodec.encode(&record).unwrap();
        assert_eq!(block.len(), UserCodec.record_size());
        assert_eq!(UserCodec.decode(&block).unwrap(), record);
    }

    #[test]
    fn role_tags_are_stable() {
        for role in [
            UserRole::Student,
            UserRole::Faculty,
            UserRole::Staff,
            UserRole::Visitor,
            UserRole::Management,
        ] {
            assert_eq!(UserRole::from_byte(role.as_byte()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_byte_is_rejected() {
        assert_eq!(
            UserRole::from_byte(9),
            Err(CodecError::UnknownRole { value: 9 })
        );
    }

    #[test]
    fn non_numeric_key_is_rejected() {
        let record = Record::new("alice", sample_user());
        assert!(matches!(
            UserCodec.encode(&record),
            Err(CodecError::InvalidKey { .. })
        ));
    }
}
