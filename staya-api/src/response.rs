use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use staya_shared::PageInfo;

/// The `{ success, data, ... }` body every endpoint answers with.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<PageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            count: None,
            pagination: None,
            token: None,
            message: None,
            data: Some(data),
            status: StatusCode::OK,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(data)
        }
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    /// A listing page: `count` is the number of items on this page.
    pub fn page(items: Vec<T>, pagination: PageInfo) -> Self {
        Self {
            count: Some(items.len()),
            pagination: Some(pagination),
            ..Self::ok(items)
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_empty_fields() {
        let body = serde_json::to_value(Envelope::ok(serde_json::json!({"id": 1})).with_token("t".into())).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["token"], "t");
        assert!(body.get("pagination").is_none());
        assert!(body.get("status").is_none());

        let info = staya_shared::PageRequest::new(Some(1), Some(2)).info(3);
        let body = serde_json::to_value(Envelope::page(vec![1, 2], info)).unwrap();
        assert_eq!(body["count"], 2);
        assert_eq!(body["pagination"]["pages"], 2);
    }
}
