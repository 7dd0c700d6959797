use bytes::Bytes;
use http::Response;
use http_body_util::Full;
use schmatch_database::models::Slot;
use schmatch_database::queries::{all_slots, insert_slot};
use serde::{Deserialize, Serialize};

use crate::database::with_connection;
use crate::error::AppError;
use crate::routes::read_form;
use crate::templating::render;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateSlotPayload {
    name: String,
}

#[derive(Serialize)]
pub struct SlotsTemplate {
    page_title: &'static str,
    slots: Vec<Slot>,
}

pub async fn list(state: &AppState) -> Result<Response<Full<Bytes>>, AppError> {
    let slots = with_connection(state.pool(), all_slots).await?;
    render(
        state.templates(),
        "slots",
        &SlotsTemplate {
            page_title: "Slots",
            slots,
        },
    )
}

pub async fn create(state: &AppState, body: Bytes) -> Result<Response<Full<Bytes>>, AppError> {
    let payload: CreateSlotPayload = read_form(&body)?;
    with_connection(state.pool(), move |connection| {
        insert_slot(connection, &payload.name)
    })
    .await?;
    list(state).await
}
