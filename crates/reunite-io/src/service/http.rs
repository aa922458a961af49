//! JSON-over-HTTP analysis service.
//!
//! Images travel base64-encoded inside the JSON body:
//!
//! - `POST {base}/age-transform` with `{ image, targetAge, direction }`,
//!   answered by `{ imageUrl }` or `{ imageData, mimeType }`.
//! - `POST {base}/facial-match` with `{ reference, target }`, answered
//!   by `{ similarity, matchPoints }`.
//!
//! Rejections may carry a JSON `{ "message": ... }` or `{ "error": ... }`
//! body, which is shown to the user verbatim.

use std::future::Future;
use std::pin::pin;
use std::rc::Rc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::future::{Either, select};
use gloo_timers::future::TimeoutFuture;
use reunite_analysis::{
    AgeTransformResponse, AnalysisService, Direction, FacialMatchResponse, ImageMime, MatchPoint,
    ResultImage, ServiceError, SourceBlob, TargetAge,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Longest plain-text rejection body shown to the user.
const MAX_PLAIN_MESSAGE_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    client: reqwest::Client,
    base_url: String,
    timeout_ms: u32,
}

impl HttpAnalysisService {
    /// `base_url` must not end with a slash; [`ServiceConfig`] takes
    /// care of that.
    ///
    /// [`ServiceConfig`]: crate::config::ServiceConfig
    #[must_use]
    pub fn new(base_url: String, timeout_ms: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            timeout_ms,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    #[allow(clippy::future_not_send)]
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let exchange = async {
            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(transport_error)?;
            let status = response.status().as_u16();
            let text = response.text().await.map_err(transport_error)?;
            let reply: Result<R, ServiceError> = decode_reply(status, &text);
            if let Err(ref e) = reply {
                tracing::warn!(%url, status, error = %e, "analysis service rejected request");
            }
            reply
        };
        race_timeout(exchange, TimeoutFuture::new(self.timeout_ms)).await
    }
}

#[async_trait(?Send)]
impl AnalysisService for HttpAnalysisService {
    async fn request_age_transform(
        &self,
        asset: &SourceBlob,
        target_age: TargetAge,
        direction: Direction,
    ) -> Result<AgeTransformResponse, ServiceError> {
        let body = AgeTransformBody {
            image: ImagePayload::from_blob(asset),
            target_age: target_age.get(),
            direction,
        };
        let reply: AgeTransformReply = self.post("age-transform", &body).await?;
        Ok(reply.into_response())
    }

    async fn request_facial_match(
        &self,
        reference: &SourceBlob,
        target: &SourceBlob,
    ) -> Result<FacialMatchResponse, ServiceError> {
        let body = FacialMatchBody {
            reference: ImagePayload::from_blob(reference),
            target: ImagePayload::from_blob(target),
        };
        let reply: FacialMatchReply = self.post("facial-match", &body).await?;
        Ok(reply.into_response())
    }
}

/// Race `exchange` against `timer`; the timer firing first is a
/// [`ServiceError::Timeout`].
#[allow(clippy::future_not_send)]
async fn race_timeout<T>(
    exchange: impl Future<Output = Result<T, ServiceError>>,
    timer: impl Future<Output = ()>,
) -> Result<T, ServiceError> {
    let exchange = pin!(exchange);
    let timer = pin!(timer);
    match select(exchange, timer).await {
        Either::Left((outcome, _)) => outcome,
        Either::Right(((), _)) => Err(ServiceError::Timeout),
    }
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Network(err.to_string())
    }
}

/// Map an HTTP status and body to the decoded reply or a
/// [`ServiceError::ServerRejected`].
///
/// A 2xx body that is not JSON of the expected shape is a rejection
/// without a message.
fn decode_reply<R: DeserializeOwned>(status: u16, body: &str) -> Result<R, ServiceError> {
    if !(200..300).contains(&status) {
        return Err(ServiceError::ServerRejected {
            status: Some(status),
            message: rejection_message(body),
        });
    }
    serde_json::from_str(body).map_err(|e| {
        tracing::debug!(error = %e, "unreadable analysis response");
        ServiceError::ServerRejected {
            status: Some(status),
            message: String::new(),
        }
    })
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

/// Extract a user-facing message from a rejection body.
///
/// Empty when the body has nothing worth showing; the caller then falls
/// back to a generic message.
fn rejection_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message.trim().to_owned();
    }
    let text = body.trim();
    if text.is_empty() || text.len() > MAX_PLAIN_MESSAGE_LEN || text.starts_with('<') || text.starts_with('{') {
        String::new()
    } else {
        text.to_owned()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagePayload<'a> {
    file_name: &'a str,
    mime_type: &'static str,
    data: String,
}

impl<'a> ImagePayload<'a> {
    fn from_blob(blob: &'a SourceBlob) -> Self {
        Self {
            file_name: blob.name(),
            mime_type: blob.mime().as_str(),
            data: STANDARD.encode(blob.bytes()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgeTransformBody<'a> {
    image: ImagePayload<'a>,
    target_age: u32,
    direction: Direction,
}

#[derive(Debug, Serialize)]
struct FacialMatchBody<'a> {
    reference: ImagePayload<'a>,
    target: ImagePayload<'a>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AgeTransformReply {
    image_url: Option<String>,
    image_data: Option<String>,
    mime_type: Option<String>,
}

impl AgeTransformReply {
    /// A reply with neither a usable URL nor decodable data becomes a
    /// response without an image, which normalization rejects.
    fn into_response(self) -> AgeTransformResponse {
        if let Some(url) = self.image_url.filter(|url| !url.trim().is_empty()) {
            return AgeTransformResponse {
                image: Some(ResultImage::Remote { url }),
            };
        }
        let image = self.image_data.and_then(|data| match STANDARD.decode(data.trim()) {
            Ok(bytes) => Some(ResultImage::Inline {
                bytes: Rc::from(bytes),
                mime: self
                    .mime_type
                    .as_deref()
                    .and_then(ImageMime::parse)
                    .unwrap_or(ImageMime::Jpeg),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "age transform image is not valid base64");
                None
            }
        });
        AgeTransformResponse { image }
    }
}

/// Facial match answer as sent. Every field may be missing; a missing
/// or null similarity is rejected by normalization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FacialMatchReply {
    similarity: Option<f64>,
    match_points: Option<Vec<MatchPoint>>,
}

impl FacialMatchReply {
    fn into_response(self) -> FacialMatchResponse {
        FacialMatchResponse {
            similarity: self.similarity,
            match_points: self.match_points.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn age_transform_body_shape() {
        let subject = SourceBlob::new("kid.png", ImageMime::Png, vec![1, 2, 3]);
        let body = AgeTransformBody {
            image: ImagePayload::from_blob(&subject),
            target_age: 40,
            direction: Direction::Regression,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "image": { "fileName": "kid.png", "mimeType": "image/png", "data": "AQID" },
                "targetAge": 40,
                "direction": "regression",
            })
        );
    }

    #[test]
    fn facial_match_reply_decodes() {
        let reply: FacialMatchReply = decode_reply(
            200,
            r#"{"similarity":0.72,"matchPoints":[{"x":1.5,"y":2,"label":"Eyes"}]}"#,
        )
        .unwrap();
        let response = reply.into_response();
        assert_eq!(response.similarity, Some(0.72));
        assert_eq!(response.match_points.len(), 1);
        assert_eq!(response.match_points[0].label, "Eyes");
    }

    #[test]
    fn facial_match_reply_without_score_still_decodes() {
        let cases = [
            ("{}", None),
            (r#"{"similarity":null}"#, None),
            (r#"{"score":0.8}"#, None),
            (r#"{"similarity":0.5,"matchPoints":null}"#, Some(0.5)),
        ];
        for (body, similarity) in cases {
            let reply: FacialMatchReply = decode_reply(200, body).unwrap();
            let response = reply.into_response();
            assert_eq!(response.similarity, similarity, "{body}");
            assert!(response.match_points.is_empty(), "{body}");
        }
    }

    #[test]
    fn client_and_server_errors_become_rejections() {
        let cases = [
            (400, r#"{"message":"No face detected"}"#, "No face detected"),
            (422, r#"{"error":"Image too blurry"}"#, "Image too blurry"),
            (404, "", ""),
            (500, "<html><body>Internal Server Error</body></html>", ""),
            (503, "Service Unavailable", "Service Unavailable"),
            (502, r#"{"message":"  upstream model offline "}"#, "upstream model offline"),
        ];
        for (status, body, message) in cases {
            let err = decode_reply::<FacialMatchReply>(status, body).unwrap_err();
            assert_eq!(
                err,
                ServiceError::ServerRejected {
                    status: Some(status),
                    message: message.into(),
                },
                "status {status}"
            );
        }
    }

    #[test]
    fn rejection_without_message_gets_generic_text() {
        let err = decode_reply::<AgeTransformReply>(500, "").unwrap_err();
        assert_eq!(err.user_message(), "The analysis service rejected the request.");
        let err = decode_reply::<AgeTransformReply>(400, r#"{"message":"No face detected"}"#)
            .unwrap_err();
        assert_eq!(err.user_message(), "No face detected");
    }

    #[test]
    fn success_status_with_non_json_body_is_rejected() {
        let err = decode_reply::<FacialMatchReply>(200, "<html>ok</html>").unwrap_err();
        assert_eq!(
            err,
            ServiceError::ServerRejected {
                status: Some(200),
                message: String::new(),
            }
        );
    }

    #[test]
    fn reply_that_beats_the_timer_is_returned() {
        let outcome = futures::executor::block_on(race_timeout(
            async { Ok::<_, ServiceError>(7) },
            futures::future::pending::<()>(),
        ));
        assert_eq!(outcome, Ok(7));

        let outcome = futures::executor::block_on(race_timeout(
            async { Err::<u8, _>(ServiceError::Network("connection reset".into())) },
            futures::future::pending::<()>(),
        ));
        assert_eq!(outcome, Err(ServiceError::Network("connection reset".into())));
    }

    #[test]
    fn timer_firing_first_is_a_timeout() {
        let outcome = futures::executor::block_on(race_timeout(
            futures::future::pending::<Result<u8, ServiceError>>(),
            futures::future::ready(()),
        ));
        assert_eq!(outcome, Err(ServiceError::Timeout));
    }

    #[test]
    fn age_reply_prefers_url() {
        let reply: AgeTransformReply =
            serde_json::from_str(r#"{"imageUrl":"https://cdn.example.org/a.jpg","imageData":"AQID"}"#)
                .unwrap();
        assert_eq!(
            reply.into_response().image,
            Some(ResultImage::Remote {
                url: "https://cdn.example.org/a.jpg".into()
            })
        );
    }

    #[test]
    fn age_reply_inline_data() {
        let reply: AgeTransformReply =
            serde_json::from_str(r#"{"imageData":"AQID","mimeType":"image/png"}"#).unwrap();
        let Some(ResultImage::Inline { bytes, mime }) = reply.into_response().image else {
            panic!("expected inline image");
        };
        assert_eq!(&*bytes, &[1, 2, 3]);
        assert_eq!(mime, ImageMime::Png);
    }

    #[test]
    fn age_reply_without_image() {
        let reply: AgeTransformReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply.into_response().image, None);

        let reply: AgeTransformReply =
            serde_json::from_str(r#"{"imageData":"not base64!!"}"#).unwrap();
        assert_eq!(reply.into_response().image, None);
    }

    #[test]
    fn rejection_messages() {
        assert_eq!(rejection_message(r#"{"message":"No face detected"}"#), "No face detected");
        assert_eq!(rejection_message(r#"{"error":"Image too blurry"}"#), "Image too blurry");
        assert_eq!(rejection_message("Quota exceeded\n"), "Quota exceeded");
        assert_eq!(rejection_message("<html><body>502</body></html>"), "");
        assert_eq!(rejection_message(r#"{"detail":"nope"}"#), "");
        assert_eq!(rejection_message(&"x".repeat(500)), "");
    }
}
