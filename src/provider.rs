//! OpenAI-compatible content generator
//!
//! Implements [`ContentGenerator`] over a chat completion endpoint that supports
//! JSON responses. Prompt wording lives here; the scheduler only sees typed
//! requests and responses.

use crate::config::ProviderConfig;
use crate::error::GenerationError;
use crate::generation::{
    ClassificationRequest, ContentGenerator, LeafContent, LeafRequest, PlanContext, ProposedChild,
    ProposedKind,
};
use crate::tree::LeafType;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are an expert curriculum designer. You build voice-first \
learning courses as trees of containers (topics that need further subdivision) and leaves \
(content units). Always answer with a single JSON object.";

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ClassificationResponse {
    children: Vec<RawChild>,
}

#[derive(Deserialize)]
struct RawChild {
    title: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, rename = "leafType")]
    leaf_type: Option<String>,
}

fn map_http_error(error: reqwest::Error) -> GenerationError {
    if let Some(status) = error.status() {
        map_status(status.as_u16(), error.to_string())
    } else if error.is_timeout() {
        GenerationError::RequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        GenerationError::RequestFailed(format!("Connection error: {}", error))
    } else {
        GenerationError::RequestFailed(format!("HTTP error: {}", error))
    }
}

fn map_status(status: u16, detail: String) -> GenerationError {
    match status {
        401 | 403 => GenerationError::AuthFailed(format!("Authentication failed: {}", detail)),
        429 => GenerationError::RateLimited(format!("Rate limit exceeded: {}", detail)),
        404 => GenerationError::ModelNotFound(format!("Model not found: {}", detail)),
        _ => GenerationError::RequestFailed(format!(
            "Request failed with status {}: {}",
            status, detail
        )),
    }
}

pub struct HttpContentGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl HttpContentGenerator {
    pub fn from_config(config: &ProviderConfig) -> Result<Self, GenerationError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            GenerationError::AuthFailed(format!(
                "No API key configured; set provider.api_key or {}",
                config.api_key_env
            ))
        })?;
        let client = Client::builder()
            .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                GenerationError::RequestFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
        })
    }

    async fn complete_json<T: DeserializeOwned>(&self, prompt: String) -> Result<T, GenerationError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            response_format: json!({ "type": "json_object" }),
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status, error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Unparseable(format!("Failed to parse response: {}", e)))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Unparseable("No choices in response".to_string()))?;
        debug!(model = %self.model, bytes = content.len(), "Completion received");

        serde_json::from_str(&content)
            .map_err(|e| GenerationError::Unparseable(format!("Invalid JSON content: {}", e)))
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn classify_children(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Vec<ProposedChild>, GenerationError> {
        let response: ClassificationResponse =
            self.complete_json(classification_prompt(request)).await?;
        parse_children(response)
    }

    async fn generate_leaf_content(
        &self,
        request: &LeafRequest,
    ) -> Result<LeafContent, GenerationError> {
        self.complete_json(leaf_prompt(request)).await
    }
}

fn parse_children(response: ClassificationResponse) -> Result<Vec<ProposedChild>, GenerationError> {
    response
        .children
        .into_iter()
        .map(|child| {
            let kind = match child.kind.as_str() {
                "container" => ProposedKind::Container,
                "leaf" => ProposedKind::Leaf,
                other => {
                    return Err(GenerationError::Unparseable(format!(
                        "Unknown child type `{}` for `{}`",
                        other, child.title
                    )))
                }
            };
            Ok(ProposedChild {
                title: child.title,
                kind,
                // Unknown leaf types are normalised by the scheduler.
                leaf_type: child.leaf_type.and_then(|value| value.parse().ok()),
            })
        })
        .collect()
}

fn plan_section(plan: &PlanContext) -> String {
    let instructions = plan
        .instructions
        .iter()
        .map(|instruction| format!("- {}", instruction))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "## Course\nTitle: {}\nDescription: {}\nMaximum depth: {}\nInstructions:\n{}\n",
        plan.title, plan.description, plan.max_depth, instructions
    )
}

fn leaf_type_section(leaf_types: &[LeafType]) -> String {
    let mut section = String::from("## Leaf types\n");
    for leaf_type in leaf_types {
        let line = match leaf_type {
            LeafType::Text => {
                "- text: generic content; use it whenever unsure what a content unit should be"
            }
            LeafType::LanguageVocabulary => {
                "- language_vocabulary: a vocabulary unit with the full declination of one lemma"
            }
            LeafType::Code => "- code: a programming concept explained around a short snippet",
        };
        section.push_str(line);
        section.push('\n');
    }
    section
}

fn classification_prompt(request: &ClassificationRequest) -> String {
    let task = if request.leaves_only {
        format!(
            "Level {} is the maximum depth: every item must be a leaf.",
            request.target_level
        )
    } else {
        "Each item is a container if its topic is broad and needs further subdivision, \
         or a leaf if it is specific enough for direct learning content."
            .to_string()
    };
    format!(
        "{plan}\n## Structure\n{structure}\n\n## Task\nSource node position: {path}\n\
         Source node title: {title}\nSource node level: {source}\nTarget node level: {target}\n\
         Break the source node's topic down into the items of level {target}. {task}\n\
         Follow the course instructions above all else.\n\n{leaf_types}\n\
         Answer as {{\"children\": [{{\"title\": string, \"type\": \"container\" | \"leaf\", \
         \"leafType\": string | null}}]}}",
        plan = plan_section(&request.plan),
        structure = request.structure,
        path = request.breadcrumb,
        title = request.title,
        source = request.source_level,
        target = request.target_level,
        task = task,
        leaf_types = leaf_type_section(&request.plan.allowed_leaf_types),
    )
}

fn leaf_prompt(request: &LeafRequest) -> String {
    let extra = match request.leaf_type {
        LeafType::Text => "\"textCategory\": string",
        LeafType::LanguageVocabulary => {
            "\"targetLanguage\": string, \"readingTextRegularTranslated\": string, \
             \"readingTextShortTranslated\": string, \"readingTextLongTranslated\": string"
        }
        LeafType::Code => "\"programmingLanguage\": string, \"codeContext\": string",
    };
    format!(
        "{plan}\n## Task\nCreate {leaf_type} content for a voice-based learning experience.\n\
         Node path: {path}\nNode title: {title}\nParent: {parent}\n\
         Write clear, engaging text suitable for listening, plus quiz questions that test \
         comprehension.\n\nAnswer as {{\"description\": string, \"readingTextRegular\": string, \
         \"readingTextShort\": string, \"readingTextLong\": string, \"quizQuestions\": [string], \
         {extra}}}",
        plan = plan_section(&request.plan),
        leaf_type = request.leaf_type,
        path = request.breadcrumb,
        title = request.title,
        parent = request.ancestor_path.last().map(String::as_str).unwrap_or(""),
        extra = extra,
    )
}
