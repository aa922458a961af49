//! Canned analysis answers after a fixed delay.
//!
//! Stands in for a real inference backend during demos and local
//! development. Answers do not depend on the submitted images.

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;
use reunite_analysis::{
    AgeTransformResponse, AnalysisService, Direction, FacialMatchResponse, MatchPoint,
    ResultImage, ServiceError, SourceBlob, TargetAge,
};

/// Portrait returned for every age transform.
pub const SAMPLE_PORTRAIT_URL: &str = "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?ixlib=rb-1.2.1&auto=format&fit=crop&w=500&q=60";

/// Similarity reported for every facial match.
pub const SAMPLE_SIMILARITY: f64 = 0.85;

#[derive(Debug, Clone, Copy)]
pub struct SimulatedAnalysisService {
    latency_ms: u32,
}

impl SimulatedAnalysisService {
    #[must_use]
    pub const fn new(latency_ms: u32) -> Self {
        Self { latency_ms }
    }

    async fn wait(&self) {
        if self.latency_ms > 0 {
            TimeoutFuture::new(self.latency_ms).await;
        }
    }
}

fn sample_age_transform() -> AgeTransformResponse {
    AgeTransformResponse {
        image: Some(ResultImage::Remote {
            url: SAMPLE_PORTRAIT_URL.to_owned(),
        }),
    }
}

fn sample_facial_match() -> FacialMatchResponse {
    let point = |x: f64, y: f64, label: &str| MatchPoint {
        x,
        y,
        label: label.to_owned(),
    };
    FacialMatchResponse {
        similarity: Some(SAMPLE_SIMILARITY),
        match_points: vec![
            point(100.0, 150.0, "Eyes"),
            point(200.0, 200.0, "Nose"),
            point(300.0, 250.0, "Mouth"),
        ],
    }
}

#[async_trait(?Send)]
impl AnalysisService for SimulatedAnalysisService {
    async fn request_age_transform(
        &self,
        asset: &SourceBlob,
        target_age: TargetAge,
        direction: Direction,
    ) -> Result<AgeTransformResponse, ServiceError> {
        tracing::debug!(name = asset.name(), %target_age, %direction, "simulating age transform");
        self.wait().await;
        Ok(sample_age_transform())
    }

    async fn request_facial_match(
        &self,
        reference: &SourceBlob,
        target: &SourceBlob,
    ) -> Result<FacialMatchResponse, ServiceError> {
        tracing::debug!(
            reference = reference.name(),
            target = target.name(),
            "simulating facial match"
        );
        self.wait().await;
        Ok(sample_facial_match())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reunite_analysis::Confidence;

    #[test]
    fn sample_match_is_high_confidence_with_three_landmarks() {
        let response = sample_facial_match();
        assert_eq!(
            response.similarity.map(Confidence::from_similarity),
            Some(Confidence::High)
        );
        let labels: Vec<&str> = response
            .match_points
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(labels, ["Eyes", "Nose", "Mouth"]);
    }

    #[test]
    fn sample_age_transform_links_portrait() {
        let response = sample_age_transform();
        assert!(matches!(
            response.image,
            Some(ResultImage::Remote { ref url }) if url == SAMPLE_PORTRAIT_URL
        ));
    }
}
