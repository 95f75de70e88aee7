use serde::{Deserialize, Serialize};

pub const REGION_INFO_PATH: &str = "/api/region-info";
pub const GENERAL_INFO_PATH: &str = "/api/general-info";
/// Correlation id attached to every info-service response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Shown when the generator answers without any text.
pub const FALLBACK_INFO: &str = "Oops! Something went wrong while retrieving the information.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfoRequest {
    pub region: String,
}

/// Reply body of the region lookup. Exactly one field is set by the server,
/// but clients must tolerate either being absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfoResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RegionInfoResponse {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            info: Some(text.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            info: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralInfo {
    pub info: String,
}

#[cfg(test)]
mod tests {
    use super::RegionInfoResponse;

    #[test]
    fn response_omits_absent_fields() {
        let json = serde_json::to_string(&RegionInfoResponse::info("Capital region"))
            .expect("serialize info");
        assert_eq!(json, r#"{"info":"Capital region"}"#);

        let json = serde_json::to_string(&RegionInfoResponse::error("please try again"))
            .expect("serialize error");
        assert_eq!(json, r#"{"error":"please try again"}"#);
    }

    #[test]
    fn response_tolerates_missing_and_extra_fields() {
        let parsed: RegionInfoResponse =
            serde_json::from_str(r#"{"detail": "ignored"}"#).expect("parse empty body");
        assert_eq!(parsed, RegionInfoResponse::default());
    }
}
