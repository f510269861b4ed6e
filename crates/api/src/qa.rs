//! Question-answering orchestrator and its HTTP endpoints.
//!
//! `QaService::process_question` runs the full pipeline: classify the
//! question, extract entities, retrieve knowledge context, generate the
//! answer with that context, score it, look up related statutes and cases,
//! and persist the interaction. Retrieval failures never abort the pipeline;
//! they degrade to an empty context.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use lexqa_core::{EntityMap, QuestionCategory};

use crate::auth::{bearer_user_id, require_user};
use crate::database::{LegalArticle, LegalCase, QuestionAnswer, Repository};
use crate::llm::{build_system_prompt, score_confidence, LlmGateway};
use crate::response::{ApiResponse, Paged};
use crate::state::AppState;
use crate::{ApiError, ApiResult};

const MAX_CONTEXT_KNOWLEDGE: i64 = 3;
const MAX_CONTEXT_ARTICLES: i64 = 3;
const MAX_RELATED_LAWS: usize = 5;
const MAX_RELATED_CASES: i64 = 3;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// QA API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ask", post(ask))
        .route("/history", get(history))
        .route("/conversation/:session_id", get(conversation))
        .route("/feedback", post(feedback))
        .route("/search", get(search))
}

/// Session ids are minted per conversation: `session_<epoch-millis>_<n>`.
pub fn generate_session_id() -> String {
    format!(
        "session_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        fastrand::u32(0..1000)
    )
}

/// Everything the pipeline produced for one question.
///
/// Related laws and cases are citation strings (statute title plus article
/// number, case title), the same shape that is persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QaOutcome {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub question_type: QuestionCategory,
    pub confidence_score: f64,
    pub entities: EntityMap,
    pub related_laws: Vec<String>,
    pub related_cases: Vec<String>,
    pub session_id: String,
}

/// The QA pipeline over the repository and the LLM gateway.
#[derive(Clone)]
pub struct QaService {
    repo: Repository,
    llm: Arc<dyn LlmGateway>,
}

impl QaService {
    pub fn new(repo: Repository, llm: Arc<dyn LlmGateway>) -> Self {
        Self { repo, llm }
    }

    /// Run one question through the full pipeline and persist the result.
    pub async fn process_question(
        &self,
        user_id: Option<i64>,
        question: &str,
        session_id: Option<String>,
    ) -> ApiResult<QaOutcome> {
        let session_id = session_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(generate_session_id);

        let category = self.llm.classify(question).await;
        let entities = self.llm.extract_entities(question).await;

        let context = self.retrieve_context(question, &entities).await;
        let system_prompt = build_system_prompt(context.as_deref());
        let answer = self.llm.complete(&system_prompt, question).await;

        let confidence_score = score_confidence(question, &answer);
        let related_laws: Vec<String> = self
            .find_related_laws(question, &entities)
            .await
            .iter()
            .map(|a| format!("{}{}", a.title, a.article_number))
            .collect();
        let related_cases: Vec<String> = self
            .find_related_cases(question, category)
            .await
            .into_iter()
            .map(|c| c.title)
            .collect();

        let record = QuestionAnswer {
            id: 0,
            user_id,
            question: question.to_string(),
            answer: answer.clone(),
            question_type: category.label().to_string(),
            confidence_score,
            entities: serde_json::to_string(&entities)?,
            related_laws: serde_json::to_string(&related_laws)?,
            related_cases: serde_json::to_string(&related_cases)?,
            session_id: session_id.clone(),
            is_feedback: false,
            feedback_type: None,
            create_time: chrono::Utc::now().timestamp(),
        };

        let id = self.repo.insert_question_answer(&record).await?;
        info!(
            "answered question id={} category={} confidence={:.2}",
            id, category, confidence_score
        );

        Ok(QaOutcome {
            id,
            question: question.to_string(),
            answer,
            question_type: category,
            confidence_score,
            entities,
            related_laws,
            related_cases,
            session_id,
        })
    }

    /// Assemble the retrieval context handed to the answering prompt:
    /// similar prior Q&As, statute text for extracted law names, and
    /// definitions for extracted concepts. `None` when nothing matched.
    async fn retrieve_context(&self, question: &str, entities: &EntityMap) -> Option<String> {
        let mut context = String::new();

        match self.repo.search_knowledge(question, MAX_CONTEXT_KNOWLEDGE).await {
            Ok(entries) if !entries.is_empty() => {
                context.push_str("相关问答：\n");
                for entry in &entries {
                    context.push_str(&format!("问：{}\n答：{}\n", entry.question, entry.answer));
                }
                context.push('\n');
            }
            Ok(_) => {}
            Err(err) => warn!("knowledge retrieval failed: {}", err),
        }

        let mut article_lines = String::new();
        for law in &entities.laws {
            match self.repo.search_articles(law, MAX_CONTEXT_ARTICLES).await {
                Ok(articles) => {
                    for article in &articles {
                        article_lines.push_str(&format!(
                            "{}{}：{}\n",
                            article.title, article.article_number, article.content
                        ));
                    }
                }
                Err(err) => warn!("article retrieval for {} failed: {}", law, err),
            }
        }
        if !article_lines.is_empty() {
            context.push_str("相关法条：\n");
            context.push_str(&article_lines);
            context.push('\n');
        }

        let mut concept_lines = String::new();
        for name in &entities.concepts {
            match self.repo.find_concept_by_name(name).await {
                Ok(Some(concept)) => {
                    concept_lines
                        .push_str(&format!("{}：{}\n", concept.name, concept.definition));
                }
                Ok(None) => {}
                Err(err) => warn!("concept lookup for {} failed: {}", name, err),
            }
        }
        if !concept_lines.is_empty() {
            context.push_str("概念定义：\n");
            context.push_str(&concept_lines);
        }

        let context = context.trim_end().to_string();
        if context.is_empty() {
            None
        } else {
            Some(context)
        }
    }

    /// Statutes cited for the answer: searched per extracted law name,
    /// deduplicated, capped. Falls back to a raw-question search when no
    /// law names were extracted or none matched.
    async fn find_related_laws(&self, question: &str, entities: &EntityMap) -> Vec<LegalArticle> {
        let mut seen = HashSet::new();
        let mut laws = Vec::new();

        for law in &entities.laws {
            let articles = match self.repo.search_articles(law, MAX_RELATED_LAWS as i64).await {
                Ok(articles) => articles,
                Err(err) => {
                    warn!("related-law search for {} failed: {}", law, err);
                    continue;
                }
            };
            for article in articles {
                if laws.len() >= MAX_RELATED_LAWS {
                    return laws;
                }
                if seen.insert(article.id) {
                    laws.push(article);
                }
            }
        }

        if laws.is_empty() {
            match self.repo.search_articles(question, MAX_RELATED_LAWS as i64).await {
                Ok(articles) => laws = articles,
                Err(err) => warn!("related-law fallback search failed: {}", err),
            }
        }

        laws
    }

    /// Cases similar to the question, falling back to cases of the question's
    /// category when the keyword search comes up empty.
    async fn find_related_cases(
        &self,
        question: &str,
        category: QuestionCategory,
    ) -> Vec<LegalCase> {
        match self.repo.search_cases(question, MAX_RELATED_CASES).await {
            Ok(cases) if !cases.is_empty() => return cases,
            Ok(_) => {}
            Err(err) => warn!("related-case search failed: {}", err),
        }

        match self
            .repo
            .cases_by_type(category.label(), MAX_RELATED_CASES)
            .await
        {
            Ok(cases) => cases,
            Err(err) => {
                warn!("related-case fallback failed: {}", err);
                Vec::new()
            }
        }
    }
}

// ==================== Handlers ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub question: String,
    pub session_id: Option<String>,
}

async fn ask(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AskRequest>,
) -> ApiResult<Json<ApiResponse<QaOutcome>>> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ApiError::InvalidRequest("问题不能为空".to_string()));
    }

    // Anonymous asking is allowed; a bad token just means no history entry
    // ties back to an account.
    let user_id = bearer_user_id(&headers, state.auth.token_secret());

    let outcome = state
        .qa
        .process_question(user_id, question, req.session_id)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

fn page_bounds(params: &PageParams) -> (i64, i64) {
    let page = params.page.unwrap_or(0).max(0);
    let size = params
        .size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, size)
}

async fn history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<ApiResponse<Paged<QuestionAnswer>>>> {
    let user_id = require_user(&headers, state.auth.token_secret())?;
    let (page, size) = page_bounds(&params);

    let records = state.repo.list_by_user(user_id, size, page * size).await?;
    let total = state.repo.count_by_user(user_id).await?;

    Ok(Json(ApiResponse::success(Paged {
        records,
        total,
        page,
        size,
    })))
}

async fn conversation(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<QuestionAnswer>>>> {
    let records = state.repo.list_by_session(&session_id).await?;
    Ok(Json(ApiResponse::success(records)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub qa_id: i64,
    pub feedback_type: String,
}

async fn feedback(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FeedbackRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if req.feedback_type.trim().is_empty() {
        return Err(ApiError::InvalidRequest("反馈类型不能为空".to_string()));
    }

    let touched = state
        .repo
        .set_feedback(req.qa_id, &req.feedback_type)
        .await?;
    if touched == 0 {
        return Err(ApiError::NotFound("问答记录不存在".to_string()));
    }

    Ok(Json(ApiResponse::success_with("反馈成功", ())))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keyword: String,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<ApiResponse<Paged<QuestionAnswer>>>> {
    let keyword = params.keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::InvalidRequest("搜索关键词不能为空".to_string()));
    }

    let (page, size) = page_bounds(&PageParams {
        page: params.page,
        size: params.size,
    });

    let records = state
        .repo
        .search_questions(keyword, size, page * size)
        .await?;
    let total = state.repo.count_question_matches(keyword).await?;

    Ok(Json(ApiResponse::success(Paged {
        records,
        total,
        page,
        size,
    })))
}
