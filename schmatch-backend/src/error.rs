use core::convert::Infallible;

use bytes::Bytes;
use handlebars::Handlebars;
use http::{Response, StatusCode};
use http_body_util::Full;
use schmatch_config::ConfigError;
use schmatch_database::error::{DatabaseError, DatabaseErrorKind};
use serde::Serialize;
use tracing::error;

use crate::templating::html_response;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("webserver error: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("form submission error: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
    #[error("template error: {0}")]
    Template(#[from] handlebars::TemplateError),
    #[error("rendering error: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("not a resource id: {0:?}")]
    InvalidResourceId(String),
    #[error("there is no resource with id {0}")]
    ResourceNotFound(i32),
    #[error("page not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
}

impl From<Infallible> for AppError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

#[derive(Serialize)]
pub struct ErrorTemplate {
    page_title: &'static str,
    status: u16,
    error: String,
}

impl AppError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Form(_) | Self::InvalidResourceId(_) => StatusCode::BAD_REQUEST,
            Self::ResourceNotFound(_) | Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Database(database_error) => match database_error.violation() {
                Some(DatabaseErrorKind::UniqueViolation) => StatusCode::CONFLICT,
                // a submitted resource id that does not exist
                Some(DatabaseErrorKind::ForeignKeyViolation | DatabaseErrorKind::CheckViolation) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Io(_)
            | Self::Hyper(_)
            | Self::Join(_)
            | Self::Config(_)
            | Self::Template(_)
            | Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self, templates: &Handlebars<'_>) -> Response<Full<Bytes>> {
        let status = self.status_code();
        let template = ErrorTemplate {
            page_title: status.canonical_reason().unwrap_or("Error"),
            status: status.as_u16(),
            error: self.to_string(),
        };
        match templates.render("error", &template) {
            Ok(body) => html_response(status, body),
            Err(render_error) => {
                // the templates may be what is broken
                error!("failed to render error page: {render_error}");
                let mut response = Response::new(Full::new(Bytes::from(template.error)));
                *response.status_mut() = status;
                response
            }
        }
    }
}
