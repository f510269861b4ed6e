//! LLM gateway: the single outbound call to the chat-completion provider,
//! plus the classification / entity-extraction wrappers and the heuristic
//! confidence scorer.
//!
//! Failure policy: provider outages degrade to fixed fallback answers instead
//! of failing the request, and malformed extraction replies fold to empty
//! entity lists. Both degradations are logged at `warn`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use lexqa_core::config::LlmConfig;
use lexqa_core::{EntityMap, QuestionCategory};

/// Fallback answer when the provider replies with a non-success status.
pub const FALLBACK_UNAVAILABLE: &str = "抱歉，服务暂时不可用，请稍后再试。";

/// Fallback answer for transport errors and unusable reply bodies.
pub const FALLBACK_ERROR: &str = "抱歉，生成答案时出现错误，请稍后再试。";

/// Narrow seam over the text-completion provider.
///
/// Production uses [`LlmClient`]; tests substitute a canned implementation.
/// `classify` and `extract_entities` are provided on top of `complete` so
/// every implementation shares the same prompt and parse behavior.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// One synchronous completion. Never fails: upstream errors come back as
    /// one of the fallback strings.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> String;

    /// Classify a question into one of the five category labels.
    async fn classify(&self, question: &str) -> QuestionCategory {
        let prompt = format!(
            "请对以下法律问题进行分类，只返回类别名称（法条查询、概念定义、程序咨询、案例分析、其他）：\n{}",
            question
        );
        let reply = self.complete(&build_system_prompt(None), &prompt).await;
        QuestionCategory::from_reply(&reply)
    }

    /// Extract the four fixed entity categories from a question.
    async fn extract_entities(&self, question: &str) -> EntityMap {
        let prompt = format!(
            "请从以下法律问题中识别实体，包括：法条名称、罪名、机构名称、法律概念等。\
             返回JSON格式：{{\"laws\":[],\"crimes\":[],\"organizations\":[],\"concepts\":[]}}\n问题：{}",
            question
        );
        let reply = self.complete(&build_system_prompt(None), &prompt).await;
        parse_entities(&reply)
    }
}

/// Build the answering system prompt, optionally carrying retrieved context.
pub fn build_system_prompt(context: Option<&str>) -> String {
    let mut prompt = String::new();
    prompt.push_str("你是一位专业的法律咨询AI助手，具有丰富的法律知识和司法实践经验。");
    prompt.push_str("你的任务是回答用户的法律问题，提供准确、专业、易懂的法律建议。");
    prompt.push_str("\n\n");
    prompt.push_str("回答要求：");
    prompt.push_str("1. 回答要准确、专业，基于中国法律法规；");
    prompt.push_str("2. 语言要通俗易懂，避免过于专业的术语；");
    prompt.push_str("3. 如果涉及具体法条，要明确指出法条名称和条号；");
    prompt.push_str("4. 如果是案例分析，要提供相关案例参考；");
    prompt.push_str("5. 如果问题不够明确，要主动询问以获取更多信息。");
    prompt.push_str("\n\n");

    if let Some(context) = context.filter(|c| !c.is_empty()) {
        prompt.push_str("相关知识上下文：\n");
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }

    prompt.push_str("请根据以上要求回答用户的问题。");
    prompt
}

/// Parse an extraction reply. Malformed JSON is swallowed and yields an
/// all-empty map; replies wrapped in prose are salvaged by slicing the
/// outermost braces.
pub fn parse_entities(reply: &str) -> EntityMap {
    let trimmed = reply.trim();
    if let Ok(map) = serde_json::from_str::<EntityMap>(trimmed) {
        return map;
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(map) = serde_json::from_str::<EntityMap>(&trimmed[start..=end]) {
                return map;
            }
        }
    }

    warn!("failed to parse entity extraction reply, defaulting to empty lists");
    EntityMap::default()
}

/// Heuristic answer-quality estimate in [0, 1].
///
/// Base 0.5, +0.2 for answers longer than 100 chars, +0.2 for a paired
/// 《...》 citation, +0.1 when both 第 and 条 appear, capped at 1.0. Not a
/// calibrated probability.
pub fn score_confidence(_question: &str, answer: &str) -> f64 {
    let mut score: f64 = 0.5;

    if answer.chars().count() > 100 {
        score += 0.2;
    }

    if answer.contains('《') && answer.contains('》') {
        score += 0.2;
    }

    if answer.contains('第') && answer.contains('条') {
        score += 0.1;
    }

    score.min(1.0)
}

// ==================== Wire types ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: String,
}

// ==================== Production client ====================

/// Reqwest-backed gateway against an OpenAI-style chat-completion endpoint.
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, lexqa_core::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout.max(1)))
            .timeout(Duration::from_secs(config.request_timeout.max(1)))
            .build()
            .map_err(|e| {
                lexqa_core::Error::Internal(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl LlmGateway for LlmClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> String {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = match self
            .client
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("LLM request failed: {}", err);
                return FALLBACK_ERROR.to_string();
            }
        };

        if !response.status().is_success() {
            warn!("LLM provider returned status {}", response.status());
            return FALLBACK_UNAVAILABLE.to_string();
        }

        match response.json::<ChatCompletionResponse>().await {
            Ok(parsed) => match parsed.choices.into_iter().next() {
                Some(choice) => choice.message.content,
                None => {
                    warn!("LLM reply contained no choices");
                    FALLBACK_ERROR.to_string()
                }
            },
            Err(err) => {
                warn!("failed to decode LLM reply: {}", err);
                FALLBACK_ERROR.to_string()
            }
        }
    }
}
