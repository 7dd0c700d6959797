use std::collections::BTreeMap;

use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::models::{
    Match, NewMatch, NewResource, NewSlot, Resource, ScheduleChoice, Side, Slot,
};
use crate::schema::{matches, resources, slots};

/// For each slot id, the match the resource takes part in there, if any.
pub type Schedule = BTreeMap<i32, Option<Match>>;

pub fn insert_slot(connection: &mut SqliteConnection, name: &str) -> Result<Slot, DatabaseError> {
    let slot = diesel::insert_into(slots::table)
        .values(NewSlot { name })
        .returning(Slot::as_returning())
        .get_result(connection)?;
    info!(id = slot.id, name = %slot.name, "created slot");
    Ok(slot)
}

pub fn all_slots(connection: &mut SqliteConnection) -> Result<Vec<Slot>, DatabaseError> {
    Ok(slots::table
        .order(slots::id)
        .select(Slot::as_select())
        .load(connection)?)
}

pub fn insert_resource(
    connection: &mut SqliteConnection,
    name: &str,
    side: Side,
) -> Result<Resource, DatabaseError> {
    let resource = diesel::insert_into(resources::table)
        .values(NewResource {
            name,
            left: side.is_left(),
        })
        .returning(Resource::as_returning())
        .get_result(connection)?;
    info!(
        id = resource.id,
        name = %resource.name,
        left = resource.left,
        "created resource"
    );
    Ok(resource)
}

pub fn all_resources(connection: &mut SqliteConnection) -> Result<Vec<Resource>, DatabaseError> {
    Ok(resources::table
        .order(resources::id)
        .select(Resource::as_select())
        .load(connection)?)
}

pub fn find_resource(
    connection: &mut SqliteConnection,
    id: i32,
) -> Result<Option<Resource>, DatabaseError> {
    Ok(resources::table
        .find(id)
        .select(Resource::as_select())
        .first(connection)
        .optional()?)
}

/// All matches the resource takes part in, on its own side.
pub fn matches_of(
    connection: &mut SqliteConnection,
    resource: &Resource,
) -> Result<Vec<Match>, DatabaseError> {
    let query = matches::table.order(matches::slot_id);
    Ok(match resource.side() {
        Side::Left => query
            .filter(matches::left_resource_id.eq(resource.id))
            .select(Match::as_select())
            .load(connection)?,
        Side::Right => query
            .filter(matches::right_resource_id.eq(resource.id))
            .select(Match::as_select())
            .load(connection)?,
    })
}

/// Maps every slot to the match of `resource` in it. Slots without one map to
/// `None`. Two matches of the same resource in one slot abort with
/// [`DatabaseError::DoubleBooked`].
pub fn get_schedule(
    connection: &mut SqliteConnection,
    resource: &Resource,
    slots: &[Slot],
) -> Result<Schedule, DatabaseError> {
    let mut schedule: Schedule = slots.iter().map(|slot| (slot.id, None)).collect();
    for found in matches_of(connection, resource)? {
        let Some(entry) = schedule.get_mut(&found.slot_id) else {
            continue;
        };
        if entry.is_some() {
            return Err(DatabaseError::DoubleBooked {
                resource_id: resource.id,
                slot_id: found.slot_id,
            });
        }
        *entry = Some(found);
    }
    Ok(schedule)
}

/// Resources of `side` that are not bound in `slot`.
pub fn get_availability(
    connection: &mut SqliteConnection,
    slot: &Slot,
    side: Side,
) -> Result<Vec<Resource>, DatabaseError> {
    let in_slot = matches::table.filter(matches::slot_id.eq(slot.id));
    let bound: Vec<Option<i32>> = match side {
        Side::Left => in_slot.select(matches::left_resource_id).load(connection)?,
        Side::Right => in_slot.select(matches::right_resource_id).load(connection)?,
    };
    let bound: Vec<i32> = bound.into_iter().flatten().collect();

    Ok(resources::table
        .filter(resources::left.eq(side.is_left()))
        .filter(resources::id.ne_all(bound))
        .order(resources::id)
        .select(Resource::as_select())
        .load(connection)?)
}

/// Removes every match the resource takes part in.
pub fn delete_schedule(
    connection: &mut SqliteConnection,
    resource: &Resource,
) -> Result<usize, DatabaseError> {
    let deleted = match resource.side() {
        Side::Left => diesel::delete(
            matches::table.filter(matches::left_resource_id.eq(resource.id)),
        )
        .execute(connection)?,
        Side::Right => diesel::delete(
            matches::table.filter(matches::right_resource_id.eq(resource.id)),
        )
        .execute(connection)?,
    };
    Ok(deleted)
}

/// Replaces the whole schedule of `resource` in one transaction. Slots
/// missing from `choices` end up without a match.
pub fn replace_schedule(
    connection: &mut SqliteConnection,
    resource: &Resource,
    choices: &BTreeMap<i32, ScheduleChoice>,
) -> Result<(), DatabaseError> {
    connection.immediate_transaction::<_, DatabaseError, _>(|connection| {
        let deleted = delete_schedule(connection, resource)?;
        debug!(resource_id = resource.id, deleted, "cleared schedule");
        for (slot_id, choice) in choices {
            diesel::insert_into(matches::table)
                .values(NewMatch::new(resource, *slot_id, choice))
                .execute(connection)?;
        }
        Ok(())
    })?;
    info!(resource_id = resource.id, matches = choices.len(), "replaced schedule");
    Ok(())
}
