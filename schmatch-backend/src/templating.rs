use bytes::Bytes;
use handlebars::Handlebars;
use headers::{ContentType, HeaderMapExt as _};
use http::{Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;

use crate::error::AppError;

const BASE: &str = include_str!("../templates/base.hbs");

const TEMPLATES: [(&str, &str); 4] = [
    ("resources", include_str!("../templates/resources.hbs")),
    ("slots", include_str!("../templates/slots.hbs")),
    ("schedule", include_str!("../templates/schedule.hbs")),
    ("error", include_str!("../templates/error.hbs")),
];

/// Registers all pages. Each page wraps its content in the `base` layout
/// using `{{#> base}}`.
pub fn templates() -> Result<Handlebars<'static>, AppError> {
    let mut handlebars = Handlebars::new();
    handlebars.register_partial("base", BASE)?;
    for (name, source) in TEMPLATES {
        handlebars.register_template_string(name, source)?;
    }
    Ok(handlebars)
}

pub fn html_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().typed_insert(ContentType::html());
    response
}

pub fn render<T: Serialize>(
    templates: &Handlebars<'_>,
    name: &str,
    data: &T,
) -> Result<Response<Full<Bytes>>, AppError> {
    Ok(html_response(StatusCode::OK, templates.render(name, data)?))
}
