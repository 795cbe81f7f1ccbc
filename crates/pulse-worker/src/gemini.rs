//! Gemini AI client for viral clip selection.
//!
//! The transcript is sent to Gemini, which answers with a JSON array of clip
//! proposals. Models are tried in order until one answers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pulse_models::{ClipProposal, TranscriptSegment};

use crate::error::{WorkerError, WorkerResult};

/// Models tried in order.
pub const GEMINI_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-pro", "gemini-2.0-flash"];

/// Gemini REST endpoint.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Maximum transcript characters sent to the model.
pub const MAX_CONTEXT_CHARS: usize = 30_000;

/// Proposes clip ranges from a transcript.
#[async_trait]
pub trait ClipSelector: Send + Sync {
    async fn select(
        &self,
        segments: &[TranscriptSegment],
        max_duration: u32,
    ) -> WorkerResult<Vec<ClipProposal>>;
}

/// Ask `selector` for proposals, degrading to the single placeholder proposal
/// when it fails.
pub async fn select_or_placeholder(
    selector: &dyn ClipSelector,
    segments: &[TranscriptSegment],
    max_duration: u32,
) -> Vec<ClipProposal> {
    match selector.select(segments, max_duration).await {
        Ok(proposals) => proposals,
        Err(e) => {
            warn!(error = %e, "Clip selection failed, using placeholder proposal");
            vec![ClipProposal::placeholder()]
        }
    }
}

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    client: Client,
    models: Vec<String>,
    base_url: String,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(api_key: impl Into<String>) -> WorkerResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WorkerError::config_error("GEMINI_API_KEY not set"));
        }

        Ok(Self {
            api_key,
            client: Client::new(),
            models: GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Create a client from `GEMINI_API_KEY`.
    pub fn from_env() -> WorkerResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| WorkerError::config_error("GEMINI_API_KEY not set"))?;
        Self::new(api_key)
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Point the client at another endpoint (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Call Gemini API.
    async fn call_gemini_api(&self, model: &str, prompt: &str) -> WorkerResult<Vec<ClipProposal>> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            model,
            self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| WorkerError::ai_failed(format!("Gemini API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(WorkerError::ai_failed(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            WorkerError::ai_failed(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| WorkerError::ai_failed("No content in Gemini response"))?;

        parse_proposals(text)
    }
}

#[async_trait]
impl ClipSelector for GeminiClient {
    async fn select(
        &self,
        segments: &[TranscriptSegment],
        max_duration: u32,
    ) -> WorkerResult<Vec<ClipProposal>> {
        let prompt = build_prompt(segments, max_duration);
        let mut last_error = None;

        for model in &self.models {
            info!("Attempting Gemini API with model: {}", model);
            match self.call_gemini_api(model, &prompt).await {
                Ok(proposals) => {
                    info!(model = %model, proposals = proposals.len(), "Got clip proposals");
                    return Ok(proposals);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| WorkerError::ai_failed("All Gemini models failed")))
    }
}

/// One line per segment, `ID:i [start-end] text`, cut to the context limit.
pub fn format_transcript(segments: &[TranscriptSegment]) -> String {
    let mut context = String::new();
    for (i, seg) in segments.iter().enumerate() {
        context.push_str(&format!(
            "ID:{} [{:.2}-{:.2}] {}\n",
            i, seg.start, seg.end, seg.text
        ));
    }
    match context.char_indices().nth(MAX_CONTEXT_CHARS) {
        Some((cut, _)) => context[..cut].to_string(),
        None => context,
    }
}

/// Build prompt for Gemini.
pub fn build_prompt(segments: &[TranscriptSegment], max_duration: u32) -> String {
    let transcript = format_transcript(segments);
    format!(
        r##"Analyze the following video transcript segments (ID, time range, text) and identify 3 potential viral clips.

CRITICAL CONSTRAINT: Each clip MUST be roughly 10 to {max_duration} seconds long. Do not select clips longer than {max_duration} seconds.

Transcript:
{transcript}

Return valid JSON only:
[
  {{
    "start_time": 10.5,
    "end_time": 25.0,
    "viral_score": 9,
    "summary": "Brief summary",
    "hashtags": "#viral #fyp",
    "quote": "Most quotable line of the clip"
  }}
]
"##
    )
}

/// Parse the model's reply, tolerating Markdown code fences.
pub fn parse_proposals(text: &str) -> WorkerResult<Vec<ClipProposal>> {
    let cleaned = text.replace("```json", "").replace("```", "");
    serde_json::from_str(cleaned.trim())
        .map_err(|e| WorkerError::ai_failed(format!("Failed to parse proposals JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSelector;

    #[async_trait]
    impl ClipSelector for FailingSelector {
        async fn select(
            &self,
            _segments: &[TranscriptSegment],
            _max_duration: u32,
        ) -> WorkerResult<Vec<ClipProposal>> {
            Err(WorkerError::ai_failed("offline"))
        }
    }

    #[test]
    fn test_format_transcript() {
        let segments = vec![
            TranscriptSegment::new(0.0, 5.0, "hello"),
            TranscriptSegment::new(5.0, 12.25, "world"),
        ];
        assert_eq!(
            format_transcript(&segments),
            "ID:0 [0.00-5.00] hello\nID:1 [5.00-12.25] world\n"
        );
    }

    #[test]
    fn test_context_truncated() {
        let segments: Vec<_> = (0..2000)
            .map(|i| TranscriptSegment::new(i as f64, i as f64 + 1.0, "some words spoken here"))
            .collect();
        assert_eq!(format_transcript(&segments).chars().count(), MAX_CONTEXT_CHARS);
    }

    #[test]
    fn test_prompt_mentions_max_duration() {
        let prompt = build_prompt(&[TranscriptSegment::new(0.0, 1.0, "hi")], 15);
        assert!(prompt.contains("10 to 15 seconds"));
        assert!(prompt.contains("ID:0 [0.00-1.00] hi"));
    }

    #[test]
    fn test_prompt_keeps_json_example_intact() {
        let prompt = build_prompt(&[], 15);
        assert!(prompt.contains(r##""hashtags": "#viral #fyp""##));
        assert!(prompt.contains(r#""quote": "Most quotable line of the clip""#));
        assert!(prompt.trim_end().ends_with(']'));
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "```json\n[{\"start_time\": 3, \"end_time\": 10, \"viral_score\": 8, \"summary\": \"s\", \"hashtags\": \"#a\"}]\n```";
        let proposals = parse_proposals(reply).unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].time_range(), Some((3.0, 10.0)));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_proposals("I cannot help with that").is_err());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(GeminiClient::new("  ").is_err());
    }

    #[test]
    fn test_placeholder_on_failure() {
        let proposals = tokio_test::block_on(select_or_placeholder(&FailingSelector, &[], 15));
        assert_eq!(proposals, vec![ClipProposal::placeholder()]);
    }

    mod http {
        use super::*;
        use serde_json::json;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn reply(text: &str) -> serde_json::Value {
            json!({
                "candidates": [
                    {"content": {"parts": [{"text": text}], "role": "model"}}
                ]
            })
        }

        fn client(server: &MockServer, models: &[&str]) -> GeminiClient {
            GeminiClient::new("test-key")
                .unwrap()
                .with_base_url(server.uri())
                .with_models(models.iter().map(|m| m.to_string()).collect())
        }

        #[tokio::test]
        async fn test_falls_back_to_next_model() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/models/model-a:generateContent"))
                .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
                .expect(1)
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path("/models/model-b:generateContent"))
                .and(query_param("key", "test-key"))
                .respond_with(ResponseTemplate::new(200).set_body_json(reply(
                    "```json\n[{\"start_time\": 12, \"end_time\": 24.5, \"viral_score\": 8.5, \"summary\": \"Reveal\", \"hashtags\": \"#viral\"}]\n```",
                )))
                .expect(1)
                .mount(&server)
                .await;

            let segments = vec![TranscriptSegment::new(0.0, 30.0, "hello")];
            let proposals = client(&server, &["model-a", "model-b"])
                .select(&segments, 15)
                .await
                .unwrap();

            assert_eq!(proposals.len(), 1);
            assert_eq!(proposals[0].time_range(), Some((12.0, 24.5)));
            assert_eq!(proposals[0].summary, "Reveal");
        }

        #[tokio::test]
        async fn test_empty_candidates_is_an_error() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/models/model-a:generateContent"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
                .mount(&server)
                .await;

            let result = client(&server, &["model-a"]).select(&[], 15).await;
            assert!(matches!(result, Err(WorkerError::AiFailed(_))));
        }

        #[tokio::test]
        async fn test_all_models_failing_degrades_to_placeholder() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(503))
                .expect(2)
                .mount(&server)
                .await;

            let gemini = client(&server, &["model-a", "model-b"]);
            let proposals = select_or_placeholder(&gemini, &[], 15).await;
            assert_eq!(proposals, vec![ClipProposal::placeholder()]);
        }
    }
}
