use log::{debug, info, warn};
use reqwest::blocking::{multipart, Client};

use super::{AnalysisError, AnalysisResult, AnalysisService, ErrorBody, UploadImage};
use crate::config::AppConfig;

/// Multipart upload to `<server_url>/analyze-foot`.
pub struct HttpAnalysisClient {
    client: Client,
    url: String,
}

impl HttpAnalysisClient {
    pub fn new(config: &AppConfig) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            url: config.analyze_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn form(image: &UploadImage) -> Result<multipart::Form, AnalysisError> {
        let bytes = std::fs::read(image.path())?;
        let part = multipart::Part::bytes(bytes)
            .file_name(image.file_name())
            .mime_str(&image.mime_type())?;
        Ok(multipart::Form::new().part("file", part))
    }
}

/// Interprets a reply: 2xx bodies decode into a result, everything else is an
/// error carrying the server's `error` message when it sent one.
pub(crate) fn parse_reply(status: u16, body: &str) -> Result<AnalysisResult, AnalysisError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error);
        return Err(AnalysisError::Status { status, message });
    }
    Ok(serde_json::from_str(body)?)
}

impl AnalysisService for HttpAnalysisClient {
    fn analyze(&self, image: &UploadImage) -> Result<AnalysisResult, AnalysisError> {
        info!("uploading {} to {}", image.path().display(), self.url);
        let form = Self::form(image)?;
        let response = self.client.post(&self.url).multipart(form).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        debug!("analysis reply {status}: {body}");

        let result = parse_reply(status, &body);
        match &result {
            Ok(result) => {
                if let Some(path) = &result.debug_image_path {
                    debug!("server debug image: {path}");
                }
            }
            Err(err) => warn!("analysis rejected: {err}"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_success_body() {
        let body = r#"{"foot_length_mm": 251.3, "foot_width_mm": 97.1, "mm_per_pixel": 0.2563,
                       "a4_debug_image_path": "C:/temp/a4_debug_result.jpg", "models": []}"#;
        let result = parse_reply(200, body).unwrap();
        assert_eq!(result.foot_length_mm, Some(251.3));
        assert_eq!(result.foot_width_mm, Some(97.1));
        assert_eq!(result.mm_per_pixel, Some(0.2563));
        assert_eq!(
            result.debug_image_path.as_deref(),
            Some("C:/temp/a4_debug_result.jpg")
        );
    }

    #[test]
    fn parse_server_error_keeps_message() {
        let err = parse_reply(500, r#"{"error": "A4 outline not found"}"#).unwrap_err();
        match err {
            AnalysisError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message.as_deref(), Some("A4 outline not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_non_json_error_body() {
        let err = parse_reply(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, AnalysisError::Status { status: 502, message: None }));
    }

    #[test]
    fn parse_malformed_success_body() {
        let err = parse_reply(200, "not json").unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }

    #[test]
    fn missing_fields_are_absent_not_errors() {
        let result = parse_reply(200, r#"{"foot_length_mm": 240}"#).unwrap();
        assert_eq!(result.foot_width_mm, None);
        assert_eq!(result.display_lines()[1], "Foot width: n/a mm");
    }

    #[test]
    fn url_joins_endpoint() {
        let config = AppConfig {
            server_url: "http://10.0.2.2:8000/".to_string(),
            ..AppConfig::default()
        };
        let client = HttpAnalysisClient::new(&config).unwrap();
        assert_eq!(client.url(), "http://10.0.2.2:8000/analyze-foot");
    }

    #[test]
    fn unreadable_file_fails_before_network() {
        let client = HttpAnalysisClient::new(&AppConfig::default()).unwrap();
        let err = client
            .analyze(&UploadImage::new("/definitely/not/here/foot.jpg"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}
