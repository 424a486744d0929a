//! External payload representation and conversion into entity variants.
//!
//! The query router accepts structured payloads produced by outside
//! collaborators: a tagged object whose `kind` selects the target
//! variant. Nothing else is accepted; an unknown tag fails JSON
//! deserialization and list overflow fails conversion.

use serde::{Deserialize, Serialize};
use shelfdb_codec::datum::{
    ContractDatum, CourseDatum, Datum, ItemDatum, UserDatum, UserRole, POSSESSIONS_CAP,
    PREVIOUS_BOOKS_CAP, STUDENTS_CAP, TEACHING_CAP, TEXTBOOKS_CAP,
};
use thiserror::Error;

/// Errors produced while converting an external payload into a datum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// A reference list exceeds its declared fixed capacity.
    ///
    /// Surfaced instead of silently dropping the overflow: the binary
    /// layout caps these lists, and losing entries without a signal
    /// corrupts borrowing state.
    #[error("{field} holds {len} entries, capacity is {capacity}")]
    CapacityExceeded {
        /// The overflowing list field.
        field: &'static str,
        /// The declared capacity.
        capacity: usize,
        /// The offered length.
        len: usize,
    },
}

/// A user payload, shared by every user-like kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUser {
    /// Stable user identifier.
    pub id: u32,
    /// Contact email.
    #[serde(default)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub username: String,
    /// Password hash.
    #[serde(default)]
    pub password_hash: String,
    /// Item ids currently held. At most 10.
    #[serde(default)]
    pub possessions: Vec<u64>,
    /// Whether the account has been validated.
    #[serde(default)]
    pub validated: bool,
    /// Textbook item ids (students). At most 5.
    #[serde(default)]
    pub textbooks: Vec<u64>,
    /// Course ids taught (faculty). At most 5.
    #[serde(default)]
    pub teaching: Vec<u32>,
    /// Previously assigned book ids (faculty). At most 10.
    #[serde(default)]
    pub previous_books: Vec<u64>,
}

/// An item payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalItem {
    /// Stable item identifier.
    pub id: u64,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Author.
    #[serde(default)]
    pub author: String,
    /// Whether the item is available for checkout.
    #[serde(default)]
    pub enabled: bool,
    /// Copies currently available.
    #[serde(default)]
    pub copies_available: u32,
    /// Whether the item has been reported lost.
    #[serde(default)]
    pub lost: bool,
    /// Shelf location.
    #[serde(default)]
    pub location: String,
}

/// A course payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCourse {
    /// Stable course identifier.
    pub id: u32,
    /// Item id of the assigned textbook.
    #[serde(default)]
    pub textbook_id: u64,
    /// Course title.
    #[serde(default)]
    pub title: String,
    /// Course end date as days since the Unix epoch.
    #[serde(default)]
    pub end_date: i64,
    /// Enrolled student ids. At most 20.
    #[serde(default)]
    pub students: Vec<u32>,
}

/// A checkout-contract payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalContract {
    /// Stable contract identifier.
    pub id: u32,
    /// The borrowing user.
    pub user_id: u32,
    /// The borrowed item.
    pub item_id: u64,
    /// Whether the contract is in force.
    #[serde(default)]
    pub enabled: bool,
}

/// The tagged external representation handed to the query router.
///
/// The `kind` field selects the target variant; user-like kinds carry
/// their role in the tag itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExternalPayload {
    /// A student user.
    Student(ExternalUser),
    /// A faculty user.
    Faculty(ExternalUser),
    /// A staff user.
    Staff(ExternalUser),
    /// A visitor.
    Visitor(ExternalUser),
    /// A management user.
    Management(ExternalUser),
    /// An item.
    Item(ExternalItem),
    /// A course.
    Course(ExternalCourse),
    /// A checkout contract.
    Contract(ExternalContract),
}

/// Copies a list into a fixed array, zero-padding the tail.
fn fill<T: Copy + Default, const N: usize>(
    field: &'static str,
    values: &[T],
) -> Result<[T; N], ConvertError> {
    if values.len() > N {
        return Err(ConvertError::CapacityExceeded {
            field,
            capacity: N,
            len: values.len(),
        });
    }
    let mut out = [T::default(); N];
    out[..values.len()].copy_from_slice(values);
    Ok(out)
}

fn convert_user(user: ExternalUser, role: UserRole) -> Result<UserDatum, ConvertError> {
    Ok(UserDatum {
        role,
        user_id: user.id,
        email: user.email,
        username: user.username,
        password_hash: user.password_hash,
        possessions: fill::<_, POSSESSIONS_CAP>("possessions", &user.possessions)?,
        validated: user.validated,
        textbooks: fill::<_, TEXTBOOKS_CAP>("textbooks", &user.textbooks)?,
        teaching: fill::<_, TEACHING_CAP>("teaching", &user.teaching)?,
        previous_books: fill::<_, PREVIOUS_BOOKS_CAP>("previous_books", &user.previous_books)?,
    })
}

impl TryFrom<ExternalPayload> for Datum {
    type Error = ConvertError;

    fn try_from(payload: ExternalPayload) -> Result<Self, Self::Error> {
        match payload {
            ExternalPayload::Student(user) => {
                Ok(Self::User(convert_user(user, UserRole::Student)?))
            }
            ExternalPayload::Faculty(user) => {
                Ok(Self::User(convert_user(user, UserRole::Faculty)?))
            }
            ExternalPayload::Staff(user) => Ok(Self::User(convert_user(user, UserRole::Staff)?)),
            ExternalPayload::Visitor(user) => {
                Ok(Self::User(convert_user(user, UserRole::Visitor)?))
            }
            ExternalPayload::Management(user) => {
                Ok(Self::User(convert_user(user, UserRole::Management)?))
            }
            ExternalPayload::Item(item) => Ok(Self::Item(ItemDatum {
                item_id: item.id,
                title: item.title,
                author: item.author,
                enabled: item.enabled,
                copies_available: item.copies_available,
                lost: item.lost,
                location: item.location,
            })),
            ExternalPayload::Course(course) => Ok(Self::Course(CourseDatum {
                course_id: course.id,
                textbook_id: course.textbook_id,
                title: course.title,
                end_date: course.end_date,
                students: fill::<_, STUDENTS_CAP>("students", &course.students)?,
            })),
            ExternalPayload::Contract(contract) => Ok(Self::Contract(ContractDatum {
                contract_id: contract.id,
                user_id: contract.user_id,
                item_id: contract.item_id,
                enabled: contract.enabled,
            })),
        }
    }
}
