pub mod resources;
pub mod schedules;
pub mod slots;
pub mod static_files;

use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Decodes an `application/x-www-form-urlencoded` body. Missing fields are a
/// client error.
pub fn read_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    Ok(serde_urlencoded::from_bytes(body)?)
}
