// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Messages pushed by the backend over the IoT WebSocket

use serde::Deserialize;
use serde_json::Value;

pub const CONNECT_SUCCESS: &str = "CONNECT_SUCCESS";

/// Shelf block of a location message; only `id` is required
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfInfo {
    pub id: i64,
    #[serde(default)]
    pub shelf_number: Option<i64>,
    #[serde(default)]
    pub line_number: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IotMessage {
    ConnectSuccess,
    /// A returned book should go on this shelf
    ShelfLocation {
        shelf: ShelfInfo,
        book_id: Option<i64>,
    },
    /// Valid JSON that is neither of the above
    Unrecognized(Value),
}

impl IotMessage {
    /// Parse one text frame; non-JSON input is an error
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;

        if value.get("type").and_then(Value::as_str) == Some(CONNECT_SUCCESS) {
            return Ok(IotMessage::ConnectSuccess);
        }

        let shelf = value
            .get("shelf")
            .filter(|s| s.get("id").is_some())
            .and_then(|s| ShelfInfo::deserialize(s).ok());

        match shelf {
            Some(shelf) => Ok(IotMessage::ShelfLocation {
                shelf,
                book_id: value.get("bookId").and_then(Value::as_i64),
            }),
            None => Ok(IotMessage::Unrecognized(value)),
        }
    }
}
