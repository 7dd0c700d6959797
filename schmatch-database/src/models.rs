use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use serde::Serialize;

use crate::schema::{matches, resources, slots};

/// Which pool a resource belongs to. Matches pair a left resource with a
/// right one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Only the literal `left` selects the left side.
    #[must_use]
    pub fn from_form_value(value: &str) -> Self {
        if value == "left" {
            Self::Left
        } else {
            Self::Right
        }
    }

    #[must_use]
    pub const fn from_left(left: bool) -> Self {
        if left {
            Self::Left
        } else {
            Self::Right
        }
    }

    #[must_use]
    pub const fn is_left(self) -> bool {
        matches!(self, Self::Left)
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = resources)]
#[diesel(check_for_backend(Sqlite))]
pub struct Resource {
    pub id: i32,
    pub name: String,
    pub left: bool,
}

impl Resource {
    #[must_use]
    pub const fn side(&self) -> Side {
        Side::from_left(self.left)
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = resources)]
pub struct NewResource<'a> {
    pub name: &'a str,
    pub left: bool,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = slots)]
#[diesel(check_for_backend(Sqlite))]
pub struct Slot {
    pub id: i32,
    pub name: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = slots)]
pub struct NewSlot<'a> {
    pub name: &'a str,
}

/// A binding within one slot. At least one of the resource ids is set; when
/// one is missing the description stands in for it.
#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = matches)]
#[diesel(check_for_backend(Sqlite))]
pub struct Match {
    pub id: i32,
    pub slot_id: i32,
    pub left_resource_id: Option<i32>,
    pub right_resource_id: Option<i32>,
    pub description: Option<String>,
}

impl Match {
    /// The resource bound on the given side.
    #[must_use]
    pub const fn resource_id(&self, side: Side) -> Option<i32> {
        match side {
            Side::Left => self.left_resource_id,
            Side::Right => self.right_resource_id,
        }
    }
}

#[derive(Insertable, Debug, PartialEq, Eq)]
#[diesel(table_name = matches)]
#[diesel(treat_none_as_default_value = false)]
pub struct NewMatch<'a> {
    pub slot_id: i32,
    pub left_resource_id: Option<i32>,
    pub right_resource_id: Option<i32>,
    pub description: Option<&'a str>,
}

/// What a resource is bound to in one slot of a submitted schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScheduleChoice {
    /// Paired with the resource of the given id on the opposite side.
    Resource(i32),
    /// Unpaired, described by free text.
    Description(String),
}

impl<'a> NewMatch<'a> {
    #[must_use]
    pub fn new(resource: &Resource, slot_id: i32, choice: &'a ScheduleChoice) -> Self {
        let (counterpart, description) = match choice {
            ScheduleChoice::Resource(id) => (Some(*id), None),
            ScheduleChoice::Description(text) => (None, Some(text.as_str())),
        };
        let (left_resource_id, right_resource_id) = match resource.side() {
            Side::Left => (Some(resource.id), counterpart),
            Side::Right => (counterpart, Some(resource.id)),
        };
        Self {
            slot_id,
            left_resource_id,
            right_resource_id,
            description,
        }
    }
}
