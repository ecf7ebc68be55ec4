//! Decoding of GET query strings and POST bodies into wire requests.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use seisgate_core::{parse_json, WireRequest};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

const MISSING_QUERY: &str = "GET request to specified endpoint requires a 'query' parameter";

/// Query string of a GET request: the URL-escaped JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    pub query: Option<String>,
}

/// Decode the `query` parameter of a GET request.
pub fn parse_query<R: WireRequest>(
    params: Result<Query<QueryParams>, QueryRejection>,
) -> ApiResult<R> {
    let Query(params) = params.map_err(|rejection| ApiError::invalid_argument(rejection.body_text()))?;
    let query = params
        .query
        .ok_or_else(|| ApiError::invalid_argument(MISSING_QUERY))?;

    serde_json::from_str(&query).map_err(|e| {
        ApiError::invalid_argument(format!(
            "Please ensure that the supplied query is valid and conforms to the expected request schema: {}",
            e
        ))
    })
}

/// Decode the JSON body of a POST request.
pub fn parse_body<R: WireRequest>(body: &Bytes) -> ApiResult<R> {
    Ok(parse_json(body)?)
}
