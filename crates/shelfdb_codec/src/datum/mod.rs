//! Entity variants ("datums") persisted by the stores.
//!
//! The set of payload shapes is closed: one enum, exhaustively matched
//! wherever a variant is selected. Each variant has a stable integer
//! identifier used as its store key and a fixed serialized size.

mod contract;
mod course;
mod item;
mod user;

pub use contract::{ContractCodec, ContractDatum};
pub use course::{CourseCodec, CourseDatum, STUDENTS_CAP};
pub use item::{ItemCodec, ItemDatum};
pub use user::{
    UserCodec, UserDatum, UserRole, POSSESSIONS_CAP, PREVIOUS_BOOKS_CAP, TEACHING_CAP,
    TEXTBOOKS_CAP,
};

use serde::{Deserialize, Serialize};

/// The closed set of entity variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Datum {
    /// A library user (student, faculty, staff, visitor or management).
    User(UserDatum),
    /// A physical item in the collection.
    Item(ItemDatum),
    /// A course with enrolled students and a textbook.
    Course(CourseDatum),
    /// A checkout contract binding a user to an item.
    Contract(ContractDatum),
}

impl Datum {
    /// Returns the stable identifier used as this datum's store key.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::User(user) => user.user_id.to_string(),
            Self::Item(item) => item.item_id.to_string(),
            Self::Course(course) => course.course_id.to_string(),
            Self::Contract(contract) => contract.contract_id.to_string(),
        }
    }

    /// Returns the variant name, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Item(_) => "item",
            Self::Course(_) => "course",
            Self::Contract(_) => "contract",
        }
    }
}

impl From<UserDatum> for Datum {
    fn from(value: UserDatum) -> Self {
        Self::User(value)
    }
}

impl From<ItemDatum> for Datum {
    fn from(value: ItemDatum) -> Self {
        Self::Item(value)
    }
}

impl From<CourseDatum> for Datum {
    fn from(value: CourseDatum) -> Self {
        Self::Course(value)
    }
}

impl From<ContractDatum> for Datum {
    fn from(value: ContractDatum) -> Self {
        Self::Contract(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_follows_variant_identifier() {
        let item = ItemDatum {
            item_id: 88,
            ..ItemDatum::default()
        };
        assert_eq!(Datum::from(item).id(), "88");

        let course = CourseDatum {
            course_id: 12,
            ..CourseDatum::default()
        };
        assert_eq!(Datum::from(course).id(), "12");
    }

    #[test]
    fn kind_names_variant() {
        let user = UserDatum::default();
        assert_eq!(Datum::from(user).kind(), "user");
    }
}
