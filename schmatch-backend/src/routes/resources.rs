use bytes::Bytes;
use http::Response;
use http_body_util::Full;
use schmatch_database::models::{Resource, Side};
use schmatch_database::queries::{all_resources, insert_resource};
use serde::{Deserialize, Serialize};

use crate::database::with_connection;
use crate::error::AppError;
use crate::routes::read_form;
use crate::templating::render;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateResourcePayload {
    name: String,
    /// `left`, anything else is the right side
    side: String,
}

#[derive(Serialize)]
pub struct ResourcesTemplate {
    page_title: &'static str,
    resources: Vec<Resource>,
}

pub async fn list(state: &AppState) -> Result<Response<Full<Bytes>>, AppError> {
    let resources = with_connection(state.pool(), all_resources).await?;
    render(
        state.templates(),
        "resources",
        &ResourcesTemplate {
            page_title: "Resources",
            resources,
        },
    )
}

pub async fn create(state: &AppState, body: Bytes) -> Result<Response<Full<Bytes>>, AppError> {
    let payload: CreateResourcePayload = read_form(&body)?;
    let side = Side::from_form_value(&payload.side);
    with_connection(state.pool(), move |connection| {
        insert_resource(connection, &payload.name, side)
    })
    .await?;
    list(state).await
}
