#![forbid(unsafe_code)]

use std::env;
use std::io::Read;
use std::time::Duration;

use base64::Engine as _;
use serde_json::Value;
use solace_contracts::voice::{AudioPayload, SpeechFormat, TranscriptBundle};
use solace_contracts::wellness::MoodLabel;
use solace_contracts::ContractViolation;

const MAX_SPEECH_RESPONSE_BYTES: u64 = 32 * 1024 * 1024;

/// One structured exchange with the generative oracle: a natural-language
/// instruction plus a JSON input document. The oracle is expected to answer
/// with a single JSON object; anything else counts as an empty response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleCall {
    pub instruction: String,
    pub input: Value,
}

impl OracleCall {
    pub fn v1(instruction: impl Into<String>, input: Value) -> Result<Self, ContractViolation> {
        let call = Self {
            instruction: instruction.into(),
            input,
        };
        if call.instruction.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "oracle_call.instruction",
                reason: "must not be empty",
            });
        }
        Ok(call)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleCallError {
    pub provider: &'static str,
    pub error_kind: &'static str,
    pub http_status: Option<u16>,
}

impl OracleCallError {
    fn new(provider: &'static str, error_kind: &'static str, http_status: Option<u16>) -> Self {
        Self {
            provider,
            error_kind,
            http_status,
        }
    }

    pub fn safe_detail(&self) -> String {
        match self.http_status {
            Some(status) => format!(
                "provider={} error={} status={}",
                self.provider, self.error_kind, status
            ),
            None => format!("provider={} error={}", self.provider, self.error_kind),
        }
    }
}

/// The external generative capability every flow depends on. `Ok(None)` means
/// the oracle answered but produced nothing usable; that is the one failure
/// class callers must absorb into their own fallbacks.
pub trait Oracle {
    fn generate(&self, call: &OracleCall) -> Result<Option<Value>, OracleCallError>;

    fn transcribe_and_detect_mood(
        &self,
        audio: &AudioPayload,
    ) -> Result<Option<TranscriptBundle>, OracleCallError>;

    /// Raw PCM frames for the given text, in the requested layout.
    fn synthesize_speech(
        &self,
        text: &str,
        format: &SpeechFormat,
    ) -> Result<Option<Vec<u8>>, OracleCallError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleProviderConfig {
    pub api_key: Option<String>,
    pub generate_url: String,
    pub speech_url: String,
    pub text_model: String,
    pub speech_model: String,
    pub speech_voice: String,
    pub user_agent: String,
    pub timeout_ms: u32,
}

impl OracleProviderConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("SOLACE_ORACLE_API_KEY").ok().filter(|v| !v.trim().is_empty()),
            generate_url: env::var("SOLACE_ORACLE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/responses".to_string()),
            speech_url: env::var("SOLACE_ORACLE_SPEECH_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/audio/speech".to_string()),
            text_model: env::var("SOLACE_ORACLE_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            speech_model: env::var("SOLACE_ORACLE_SPEECH_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini-tts".to_string()),
            speech_voice: env::var("SOLACE_ORACLE_SPEECH_VOICE")
                .unwrap_or_else(|_| "alloy".to_string()),
            user_agent: env::var("SOLACE_ORACLE_HTTP_USER_AGENT")
                .unwrap_or_else(|_| "solace-oracle/1.0".to_string()),
            timeout_ms: env::var("SOLACE_ORACLE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|v| (1_000..=120_000).contains(v))
                .unwrap_or(30_000),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Live oracle over a blocking HTTP transport. Every method is a single
/// request/response call; latency and failure are the caller's problem.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    config: OracleProviderConfig,
}

impl HttpOracle {
    pub fn new(config: OracleProviderConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(OracleProviderConfig::from_env())
    }

    pub fn config(&self) -> &OracleProviderConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, OracleCallError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| OracleCallError::new("oracle", "missing_api_key", None))
    }

    fn generate_payload(&self, input_text: String) -> Value {
        serde_json::json!({
            "model": self.config.text_model,
            "input": input_text,
            "temperature": 0,
            "max_output_tokens": 800,
        })
    }
}

impl Oracle for HttpOracle {
    fn generate(&self, call: &OracleCall) -> Result<Option<Value>, OracleCallError> {
        let api_key = self.api_key()?;
        let agent = build_http_agent(self.config.timeout_ms, &self.config.user_agent)
            .map_err(|_| OracleCallError::new("oracle", "config_invalid", None))?;
        let input_text = format!(
            "{}\n\nInput document (JSON):\n{}\n\nAnswer with a single JSON object and nothing else.",
            call.instruction, call.input
        );
        let payload = self.generate_payload(input_text);
        let response = post_json(&agent, &self.config.generate_url, api_key, &payload)?;
        Ok(extract_output_text(&response).and_then(|text| parse_json_object(&text)))
    }

    fn transcribe_and_detect_mood(
        &self,
        audio: &AudioPayload,
    ) -> Result<Option<TranscriptBundle>, OracleCallError> {
        let api_key = self.api_key()?;
        let agent = build_http_agent(self.config.timeout_ms, &self.config.user_agent)
            .map_err(|_| OracleCallError::new("oracle", "config_invalid", None))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&audio.data);
        let payload = serde_json::json!({
            "model": self.config.text_model,
            "input": [{
                "role": "user",
                "content": [
                    { "type": "input_text", "text": TRANSCRIBE_AND_MOOD_INSTRUCTION },
                    {
                        "type": "input_audio",
                        "audio": { "media_type": audio.media_type.as_str(), "data": encoded },
                    },
                ],
            }],
            "temperature": 0,
            "max_output_tokens": 800,
        });
        let response = post_json(&agent, &self.config.generate_url, api_key, &payload)?;
        let Some(value) = extract_output_text(&response).and_then(|text| parse_json_object(&text))
        else {
            return Ok(None);
        };
        Ok(parse_transcript_bundle(&value))
    }

    fn synthesize_speech(
        &self,
        text: &str,
        format: &SpeechFormat,
    ) -> Result<Option<Vec<u8>>, OracleCallError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let api_key = self.api_key()?;
        let agent = build_http_agent(self.config.timeout_ms, &self.config.user_agent)
            .map_err(|_| OracleCallError::new("oracle", "config_invalid", None))?;
        let payload = serde_json::json!({
            "model": self.config.speech_model,
            "voice": self.config.speech_voice,
            "input": text,
            "response_format": "pcm",
            "sample_rate": format.sample_rate_hz.0,
        });
        let response = agent
            .post(&self.config.speech_url)
            .set("Content-Type", "application/json")
            .set("Authorization", &format!("Bearer {api_key}"))
            .send_json(payload)
            .map_err(oracle_error_from_ureq)?;
        let mut pcm = Vec::new();
        response
            .into_reader()
            .take(MAX_SPEECH_RESPONSE_BYTES)
            .read_to_end(&mut pcm)
            .map_err(|_| OracleCallError::new("oracle", "body_read", None))?;
        if pcm.is_empty() {
            return Ok(None);
        }
        Ok(Some(pcm))
    }
}

const TRANSCRIBE_AND_MOOD_INSTRUCTION: &str = "Transcribe the attached audio verbatim and judge \
the speaker's mood from vocal cues (tone, pitch, pace, volume, trembling, sighing, pauses) \
together with the words. A mismatch between calm words and a strained voice must be judged by \
the voice. If the voice indicates extreme distress, use the label 'Extreme Sadness - Crisis'. \
Answer with a single JSON object: {\"transcript\": string, \"mood\": string}.";

fn parse_transcript_bundle(value: &Value) -> Option<TranscriptBundle> {
    let transcript = value.get("transcript")?.as_str()?;
    let mood = value.get("mood")?.as_str()?;
    let mood = MoodLabel::new(mood).ok()?;
    TranscriptBundle::v1(transcript, mood).ok()
}

/// Pull the assistant text out of a responses-API reply. Two shapes are
/// accepted: a flat `output_text` field and the structured `output` array.
pub fn extract_output_text(response: &Value) -> Option<String> {
    if let Some(text) = response.get("output_text").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            return Some(text.to_string());
        }
    }
    let output = response.get("output")?.as_array()?;
    for item in output {
        let Some(content) = item.get("content").and_then(Value::as_array) else {
            continue;
        };
        for part in content {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                if !text.trim().is_empty() {
                    return Some(text.to_string());
                }
            }
        }
    }
    None
}

/// Parse oracle text into a JSON object, tolerating markdown code fences.
pub fn parse_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    let candidate = if trimmed.starts_with("```") {
        let inner = trimmed.trim_start_matches("```json").trim_start_matches("```");
        inner.trim_end_matches("```").trim()
    } else {
        trimmed
    };
    let value: Value = serde_json::from_str(candidate).ok()?;
    value.is_object().then_some(value)
}

pub(crate) fn build_http_agent(timeout_ms: u32, user_agent: &str) -> Result<ureq::Agent, String> {
    if timeout_ms == 0 {
        return Err("timeout must be > 0".to_string());
    }
    let timeout = Duration::from_millis(u64::from(timeout_ms).max(100));
    Ok(ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .timeout_write(timeout)
        .user_agent(user_agent)
        .build())
}

fn post_json(
    agent: &ureq::Agent,
    endpoint: &str,
    api_key: &str,
    payload: &Value,
) -> Result<Value, OracleCallError> {
    let response = agent
        .post(endpoint)
        .set("Content-Type", "application/json")
        .set("Authorization", &format!("Bearer {api_key}"))
        .set("Accept", "application/json")
        .send_json(payload.clone())
        .map_err(oracle_error_from_ureq)?;
    serde_json::from_reader(response.into_reader())
        .map_err(|_| OracleCallError::new("oracle", "json_parse", None))
}

fn oracle_error_from_ureq(err: ureq::Error) -> OracleCallError {
    match err {
        ureq::Error::Status(status, _) => {
            OracleCallError::new("oracle", "status", Some(status))
        }
        ureq::Error::Transport(_) => OracleCallError::new("oracle", "transport", None),
    }
}
