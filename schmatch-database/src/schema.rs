diesel::table! {
    resources (id) {
        id -> Integer,
        name -> Text,
        left -> Bool,
    }
}

diesel::table! {
    slots (id) {
        id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    matches (id) {
        id -> Integer,
        slot_id -> Integer,
        left_resource_id -> Nullable<Integer>,
        right_resource_id -> Nullable<Integer>,
        description -> Nullable<Text>,
    }
}

diesel::joinable!(matches -> slots (slot_id));

diesel::allow_tables_to_appear_in_same_query!(matches, resources, slots);

/// Statements creating the tables above. Uniqueness per (slot, resource) is
/// kept in named indexes instead of table constraints.
pub(crate) const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS resources (
    id INTEGER PRIMARY KEY NOT NULL,
    name VARCHAR(256) NOT NULL,
    "left" BOOLEAN NOT NULL
);

CREATE TABLE IF NOT EXISTS slots (
    id INTEGER PRIMARY KEY NOT NULL,
    name VARCHAR(256) NOT NULL
);

CREATE TABLE IF NOT EXISTS matches (
    id INTEGER PRIMARY KEY NOT NULL,
    slot_id INTEGER NOT NULL REFERENCES slots (id),
    left_resource_id INTEGER REFERENCES resources (id),
    right_resource_id INTEGER REFERENCES resources (id),
    description VARCHAR(256),
    CHECK (left_resource_id IS NOT NULL OR right_resource_id IS NOT NULL)
);

CREATE UNIQUE INDEX IF NOT EXISTS matches_slot_left_index
    ON matches (slot_id, left_resource_id);

CREATE UNIQUE INDEX IF NOT EXISTS matches_slot_right_index
    ON matches (slot_id, right_resource_id);
"#;

pub(crate) const DROP_TABLES: &str = r"
DROP TABLE IF EXISTS matches;
DROP TABLE IF EXISTS slots;
DROP TABLE IF EXISTS resources;
";
