use std::collections::{BTreeMap, HashMap, HashSet};

use bytes::Bytes;
use http::Response;
use http_body_util::Full;
use schmatch_database::error::DatabaseError;
use schmatch_database::models::{Resource, ScheduleChoice, Side, Slot};
use schmatch_database::queries::{
    all_resources, all_slots, find_resource, get_availability, get_schedule, replace_schedule,
};
use schmatch_database::SqliteConnection;
use serde::Serialize;

use crate::database::with_connection;
use crate::error::AppError;
use crate::routes::read_form;
use crate::templating::render;
use crate::AppState;

const SLOT_FIELD_PREFIX: &str = "slot_";
const DESCRIPTION_FIELD_PREFIX: &str = "description_";
const NO_MATCH: &str = "none";
const CUSTOM_MATCH: &str = "custom";

#[derive(Serialize)]
pub struct ScheduleTemplate {
    page_title: String,
    resource: Resource,
    side: Side,
    counterpart_side: Side,
    rows: Vec<ScheduleRow>,
}

#[derive(Serialize)]
pub struct ScheduleRow {
    slot: Slot,
    none_selected: bool,
    custom_selected: bool,
    description: String,
    options: Vec<ScheduleOption>,
}

#[derive(Serialize)]
pub struct ScheduleOption {
    id: i32,
    name: String,
    selected: bool,
}

fn load_schedule(
    connection: &mut SqliteConnection,
    resource_id: i32,
) -> Result<Option<ScheduleTemplate>, DatabaseError> {
    let Some(resource) = find_resource(connection, resource_id)? else {
        return Ok(None);
    };
    let slots = all_slots(connection)?;
    let mut schedule = get_schedule(connection, &resource, &slots)?;

    let side = resource.side();
    let counterpart_side = side.opposite();
    let names: HashMap<i32, String> = all_resources(connection)?
        .into_iter()
        .map(|candidate| (candidate.id, candidate.name))
        .collect();

    let mut rows = Vec::with_capacity(slots.len());
    for slot in slots {
        let current = schedule.remove(&slot.id).flatten();
        let bound = current
            .as_ref()
            .and_then(|found| found.resource_id(counterpart_side));

        let mut options: Vec<ScheduleOption> =
            get_availability(connection, &slot, counterpart_side)?
                .into_iter()
                .map(|available| ScheduleOption {
                    id: available.id,
                    name: available.name,
                    selected: false,
                })
                .collect();
        // the current counterpart is bound in this slot, so it is not available
        if let Some(bound) = bound {
            if let Some(option) = options.iter_mut().find(|option| option.id == bound) {
                option.selected = true;
            } else {
                options.push(ScheduleOption {
                    id: bound,
                    name: names
                        .get(&bound)
                        .cloned()
                        .unwrap_or_else(|| format!("#{bound}")),
                    selected: true,
                });
                options.sort_by_key(|option| option.id);
            }
        }

        let custom_selected = current.is_some() && bound.is_none();
        rows.push(ScheduleRow {
            none_selected: current.is_none(),
            custom_selected,
            description: current
                .and_then(|found| found.description)
                .filter(|_| custom_selected)
                .unwrap_or_default(),
            options,
            slot,
        });
    }

    Ok(Some(ScheduleTemplate {
        page_title: format!("Schedule for {}", resource.name),
        resource,
        side,
        counterpart_side,
        rows,
    }))
}

/// Reads the `slot_{id}` fields of a submitted schedule. `none` and missing
/// fields leave the slot empty, `custom` takes the text of `description_{id}`
/// and anything else must be the id of the resource to pair with.
pub fn parse_schedule_form(
    fields: &[(String, String)],
) -> Result<BTreeMap<i32, ScheduleChoice>, AppError> {
    let descriptions: HashMap<&str, &str> = fields
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(DESCRIPTION_FIELD_PREFIX)
                .map(|slot| (slot, value.as_str()))
        })
        .collect();

    let mut choices = BTreeMap::new();
    for (key, value) in fields {
        let Some(slot) = key.strip_prefix(SLOT_FIELD_PREFIX) else {
            continue;
        };
        let Ok(slot_id) = slot.parse::<i32>() else {
            continue;
        };
        let choice = match value.as_str() {
            NO_MATCH => continue,
            CUSTOM_MATCH => ScheduleChoice::Description(
                descriptions.get(slot).copied().unwrap_or_default().to_owned(),
            ),
            target => ScheduleChoice::Resource(
                target
                    .parse()
                    .map_err(|_| AppError::InvalidResourceId(target.to_owned()))?,
            ),
        };
        choices.insert(slot_id, choice);
    }
    Ok(choices)
}

pub async fn show(state: &AppState, resource_id: i32) -> Result<Response<Full<Bytes>>, AppError> {
    let template = with_connection(state.pool(), move |connection| {
        load_schedule(connection, resource_id)
    })
    .await?
    .ok_or(AppError::ResourceNotFound(resource_id))?;
    render(state.templates(), "schedule", &template)
}

pub async fn update(
    state: &AppState,
    resource_id: i32,
    body: Bytes,
) -> Result<Response<Full<Bytes>>, AppError> {
    let fields: Vec<(String, String)> = read_form(&body)?;
    let choices = parse_schedule_form(&fields)?;

    let found = with_connection(state.pool(), move |connection| {
        let Some(resource) = find_resource(connection, resource_id)? else {
            return Ok(false);
        };
        let slot_ids: HashSet<i32> = all_slots(connection)?
            .into_iter()
            .map(|slot| slot.id)
            .collect();
        let choices = choices
            .into_iter()
            .filter(|(slot_id, _)| slot_ids.contains(slot_id))
            .collect();
        replace_schedule(connection, &resource, &choices)?;
        Ok(true)
    })
    .await?;
    if !found {
        return Err(AppError::ResourceNotFound(resource_id));
    }

    show(state, resource_id).await
}
