//! Gemini oracle — streams `streamGenerateContent` over SSE.
//!
//! Fixed generation config per the classification contract: temperature
//! 1.0, top_p 0.95, 8192 output tokens, all harm-category safety
//! thresholds OFF. The reply arrives as `data: {...}` SSE lines, each
//! carrying candidate content parts; every text part is yielded as one
//! stream fragment.

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use crate::classifier::{Oracle, OracleRequest, TokenStream};
use crate::config::OracleConfig;
use crate::error::ClassifierError;

const GENERATION_TEMPERATURE: f64 = 1.0;
const GENERATION_TOP_P: f64 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 8192;

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

/// Oracle implementation over the Gemini REST API.
pub struct GeminiOracle {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
}

impl GeminiOracle {
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.model
        )
    }

    fn request_body(request: &OracleRequest) -> Value {
        let mut parts = vec![json!({ "text": request.prompt })];
        for image in &request.images {
            parts.push(json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": image.data_base64,
                }
            }));
        }

        let safety_settings: Vec<Value> = SAFETY_CATEGORIES
            .iter()
            .map(|category| json!({ "category": category, "threshold": "OFF" }))
            .collect();

        json!({
            "contents": [{ "role": "user", "parts": parts }],
            "systemInstruction": { "parts": [{ "text": request.system_instruction }] },
            "generationConfig": {
                "temperature": GENERATION_TEMPERATURE,
                "topP": GENERATION_TOP_P,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            },
            "safetySettings": safety_settings,
        })
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn generate(&self, request: OracleRequest) -> Result<TokenStream, ClassifierError> {
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&Self::request_body(&request))
            .send()
            .await
            .map_err(|e| ClassifierError::RequestFailed {
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::RequestFailed {
                reason: format!("oracle returned {status}: {body}"),
            });
        }

        let mut bytes = resp.bytes_stream();
        let stream = try_stream! {
            let mut buf = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| ClassifierError::Stream {
                    reason: e.to_string(),
                })?;
                buf.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buf.find('\n') {
                    let line: String = buf.drain(..=pos).collect();
                    for text in parse_sse_line(line.trim()) {
                        yield text;
                    }
                }
            }
            // Trailing data without a final newline.
            for text in parse_sse_line(buf.trim()) {
                yield text;
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Extract candidate text parts from one SSE line.
fn parse_sse_line(line: &str) -> Vec<String> {
    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
        return Vec::new();
    };
    if data.is_empty() || data == "[DONE]" {
        return Vec::new();
    }
    let Ok(chunk) = serde_json::from_str::<Value>(data) else {
        return Vec::new();
    };

    let mut texts = Vec::new();
    if let Some(candidates) = chunk["candidates"].as_array() {
        for candidate in candidates {
            if let Some(parts) = candidate["content"]["parts"].as_array() {
                for part in parts {
                    if let Some(text) = part["text"].as_str() {
                        texts.push(text.to_string());
                    }
                }
            }
        }
    }
    texts
}
