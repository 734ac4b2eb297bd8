//! The `{ "data": ... }` envelope every successful API response uses.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// 201 with the created resource in the envelope.
pub type Created<T> = (StatusCode, Json<DataResponse<T>>);

pub fn created<T: Serialize>(data: T) -> Created<T> {
    (StatusCode::CREATED, Json(DataResponse { data }))
}
