//! Shared domain types for the LexQA question-answering pipeline.

use serde::{Deserialize, Serialize};

/// Closed set of question categories produced by classification.
///
/// The wire and storage representation is the Chinese label itself, matching
/// what the classifier prompt asks the model to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionCategory {
    /// 法条查询 — statute/article lookup.
    #[serde(rename = "法条查询")]
    ArticleLookup,

    /// 概念定义 — legal concept definition.
    #[serde(rename = "概念定义")]
    ConceptDefinition,

    /// 程序咨询 — procedural consulting.
    #[serde(rename = "程序咨询")]
    ProcedureConsulting,

    /// 案例分析 — case analysis.
    #[serde(rename = "案例分析")]
    CaseAnalysis,

    /// 其他 — anything that does not match the labels above.
    #[serde(rename = "其他")]
    Other,
}

impl QuestionCategory {
    /// The label text used in prompts, storage, and API responses.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionCategory::ArticleLookup => "法条查询",
            QuestionCategory::ConceptDefinition => "概念定义",
            QuestionCategory::ProcedureConsulting => "程序咨询",
            QuestionCategory::CaseAnalysis => "案例分析",
            QuestionCategory::Other => "其他",
        }
    }

    /// Parse a free-text classifier reply by substring match.
    ///
    /// The first known label found wins; anything else folds to [`Other`],
    /// so the result is always one of the five labels.
    ///
    /// [`Other`]: QuestionCategory::Other
    pub fn from_reply(reply: &str) -> Self {
        if reply.contains("法条查询") {
            QuestionCategory::ArticleLookup
        } else if reply.contains("概念定义") {
            QuestionCategory::ConceptDefinition
        } else if reply.contains("程序咨询") {
            QuestionCategory::ProcedureConsulting
        } else if reply.contains("案例分析") {
            QuestionCategory::CaseAnalysis
        } else {
            QuestionCategory::Other
        }
    }
}

impl std::fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Entities extracted from a question, keyed by the four fixed categories.
///
/// All four keys are always present; extraction failures yield empty lists
/// rather than missing keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMap {
    #[serde(default)]
    pub laws: Vec<String>,

    #[serde(default)]
    pub crimes: Vec<String>,

    #[serde(default)]
    pub organizations: Vec<String>,

    #[serde(default)]
    pub concepts: Vec<String>,
}

impl EntityMap {
    /// True when no entity was extracted in any category.
    pub fn is_empty(&self) -> bool {
        self.laws.is_empty()
            && self.crimes.is_empty()
            && self.organizations.is_empty()
            && self.concepts.is_empty()
    }
}
