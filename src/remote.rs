//! Remote generation backend: an HTTP client for an external
//! text-generation service, plus the whitespace tokenizer it pairs with.
//!
//! The engine's chunking math only needs a stable encode/decode round trip;
//! the hash-vocabulary tokenizer interns whitespace-separated words and is
//! deliberately model-agnostic. The real subword vocabulary lives behind the
//! HTTP endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ModelConfig;
use crate::error::{Result, SumAiError};
use crate::interfaces::{Generator, ModelParts, Tokenizer};
use crate::types::GenerationSettings;

/// Word-level tokenizer with a growable interned vocabulary.
pub struct HashVocabTokenizer {
    vocab: RwLock<Vocab>,
    max_input_length: usize,
}

#[derive(Default)]
struct Vocab {
    to_id: HashMap<String, u32>,
    to_token: Vec<String>,
}

impl HashVocabTokenizer {
    pub fn new(max_input_length: usize) -> Self {
        Self {
            vocab: RwLock::new(Vocab::default()),
            max_input_length,
        }
    }
}

impl Default for HashVocabTokenizer {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Tokenizer for HashVocabTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        let mut vocab = self.vocab.write();
        text.split_whitespace()
            .map(|word| match vocab.to_id.get(word) {
                Some(&id) => id,
                None => {
                    let id = vocab.to_token.len() as u32;
                    vocab.to_id.insert(word.to_string(), id);
                    vocab.to_token.push(word.to_string());
                    id
                }
            })
            .collect()
    }

    fn decode(&self, ids: &[u32]) -> String {
        let vocab = self.vocab.read();
        ids.iter()
            .filter_map(|&id| vocab.to_token.get(id as usize).map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn max_input_length(&self) -> usize {
        self.max_input_length
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Serialize)]
struct GenerateParameters {
    min_new_tokens: u32,
    max_new_tokens: u32,
    num_beams: u32,
    length_penalty: f32,
    repetition_penalty: f32,
    no_repeat_ngram_size: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    generated_text: String,
}

/// Generation client for a text-generation HTTP endpoint.
pub struct HttpGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    tokenizer: Arc<dyn Tokenizer>,
}

impl HttpGenerator {
    pub fn new(config: &ModelConfig, tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
        let base_url = config
            .endpoint
            .clone()
            .ok_or_else(|| SumAiError::ModelUnavailable("no generation endpoint configured".into()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            tokenizer,
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, input_ids: &[u32], settings: &GenerationSettings) -> Result<Vec<u32>> {
        let inputs = self.tokenizer.decode(input_ids);
        let body = GenerateRequest {
            inputs: &inputs,
            parameters: GenerateParameters {
                min_new_tokens: settings.min_new_tokens,
                max_new_tokens: settings.max_new_tokens,
                num_beams: settings.num_beams,
                length_penalty: settings.length_penalty,
                repetition_penalty: settings.repetition_penalty,
                no_repeat_ngram_size: settings.no_repeat_ngram_size,
            },
        };

        let url = format!("{}/generate", self.base_url);
        debug!(url = %url, input_tokens = input_ids.len(), "sending generation request");
        let response = self.request(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SumAiError::Http(format!(
                "generation endpoint returned {}",
                response.status()
            )));
        }
        let parsed: GenerateResponse = response.json().await?;
        Ok(self.tokenizer.encode(parsed.generated_text.trim()))
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Build the model parts from configuration: a shared tokenizer and an HTTP
/// generator against the configured endpoint.
pub fn build_model_parts(config: &ModelConfig, max_input_length: usize) -> Result<ModelParts> {
    let tokenizer: Arc<dyn Tokenizer> = Arc::new(HashVocabTokenizer::new(max_input_length));
    let generator = HttpGenerator::new(config, tokenizer.clone())?;
    Ok(ModelParts {
        tokenizer,
        generator: Arc::new(generator),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips_words() {
        let tokenizer = HashVocabTokenizer::default();
        let ids = tokenizer.encode("the quick brown fox the fox");
        assert_eq!(ids.len(), 6);
        assert_eq!(ids[0], ids[4]);
        assert_eq!(ids[3], ids[5]);
        assert_eq!(tokenizer.decode(&ids), "the quick brown fox the fox");
    }

    #[test]
    fn decode_of_a_subrange_reconstructs_that_span() {
        let tokenizer = HashVocabTokenizer::default();
        let ids = tokenizer.encode("one two three four five");
        assert_eq!(tokenizer.decode(&ids[1..4]), "two three four");
    }

    #[test]
    fn unknown_ids_are_dropped_on_decode() {
        let tokenizer = HashVocabTokenizer::default();
        assert_eq!(tokenizer.decode(&[99]), "");
    }

    #[test]
    fn missing_endpoint_is_model_unavailable() {
        let config = ModelConfig::default();
        let err = build_model_parts(&config, 1024).unwrap_err();
        assert_eq!(err.category(), "model_unavailable");
    }
}
