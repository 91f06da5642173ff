//! TheTVDB response types.

use serde::Deserialize;
use serde_json::{Map, Value};

/// A series as returned by TheTVDB: an opaque JSON object.
///
/// Only `seriesName` is interpreted by the client.
pub type SeriesRecord = Map<String, Value>;

/// Returns the `seriesName` field when it is a string.
#[must_use]
pub fn series_name(record: &SeriesRecord) -> Option<&str> {
    record.get("seriesName").and_then(Value::as_str)
}

/// Body of `/login` and `/refresh_token`.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    /// JWT bearer token.
    pub token: String,
}

/// Body of the data endpoints (`/search/series`, `/series/{id}`).
#[derive(Debug, Deserialize)]
pub(crate) struct DataResponse<T> {
    /// Payload; missing or `null` reads as `None`.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_series_name_reads_string() {
        // Arrange
        let record: SeriesRecord =
            serde_json::from_str(r#"{"id":121361,"seriesName":"Game of Thrones"}"#).unwrap();

        // Act & Assert
        assert_eq!(series_name(&record), Some("Game of Thrones"));
    }

    #[test]
    fn test_series_name_missing_or_null() {
        // Arrange
        let missing: SeriesRecord = serde_json::from_str(r#"{"id":1}"#).unwrap();
        let null: SeriesRecord = serde_json::from_str(r#"{"id":1,"seriesName":null}"#).unwrap();

        // Act & Assert
        assert_eq!(series_name(&missing), None);
        assert_eq!(series_name(&null), None);
    }

    #[test]
    fn test_parse_token_response() {
        // Arrange
        let json = r#"{"token":"a valid tvdb token"}"#;

        // Act
        let response: TokenResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(response.token, "a valid tvdb token");
    }

    #[test]
    fn test_parse_search_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/tvdb/search_game_of_thrones.json");

        // Act
        let response: DataResponse<Vec<SeriesRecord>> = serde_json::from_str(json).unwrap();

        // Assert
        let data = response.data.unwrap();
        assert_eq!(data.len(), 5);
        assert_eq!(series_name(&data[1]), Some("Game of Thrones"));
    }

    #[test]
    fn test_parse_data_null_or_missing() {
        // Arrange & Act
        let null: DataResponse<SeriesRecord> = serde_json::from_str(r#"{"data":null}"#).unwrap();
        let missing: DataResponse<SeriesRecord> =
            serde_json::from_str(r#"{"Error":"Resource not found"}"#).unwrap();

        // Assert
        assert!(null.data.is_none());
        assert!(missing.data.is_none());
    }
}
