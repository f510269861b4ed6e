use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, FromRow, Result as SqlxResult};

/// Registered account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Salted hash, never serialized out of the API.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nickname: Option<String>,
    pub user_type: i64,
    pub created_at: i64,
}

/// One question/answer interaction.
///
/// `entities`, `related_laws`, and `related_cases` are stored as serialized
/// JSON text; the orchestrator owns their shapes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    pub id: i64,
    pub user_id: Option<i64>,
    pub question: String,
    pub answer: String,
    pub question_type: String,
    pub confidence_score: f64,
    pub entities: String,
    pub related_laws: String,
    pub related_cases: String,
    pub session_id: String,
    pub is_feedback: bool,
    pub feedback_type: Option<String>,
    pub create_time: i64,
}

/// Prior answered question reused as retrieval context.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub keywords: Option<String>,
    pub relevance_score: f64,
}

/// Statute article.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LegalArticle {
    pub id: i64,
    pub title: String,
    pub article_number: String,
    pub content: String,
}

/// Court case.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LegalCase {
    pub id: i64,
    pub title: String,
    pub case_type: String,
    pub content: String,
}

/// Legal concept with its definition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LegalConcept {
    pub id: i64,
    pub name: String,
    pub definition: String,
}

/// Data access over the LexQA schema.
///
/// Keyword search is substring matching (`LIKE %kw%`); result-set caps are
/// the caller's responsibility and arrive here as explicit limits.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // User methods

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        phone: Option<&str>,
        nickname: Option<&str>,
        created_at: i64,
    ) -> SqlxResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, email, phone, nickname, user_type, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .bind(phone)
        .bind(nickname)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_user(&self, id: i64) -> SqlxResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, email, phone, nickname, user_type, created_at
            FROM users WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_user_by_username(&self, username: &str) -> SqlxResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, email, phone, nickname, user_type, created_at
            FROM users WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn username_exists(&self, username: &str) -> SqlxResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    // QuestionAnswer methods

    pub async fn insert_question_answer(&self, qa: &QuestionAnswer) -> SqlxResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO question_answers
                (user_id, question, answer, question_type, confidence_score, entities,
                 related_laws, related_cases, session_id, is_feedback, feedback_type, create_time)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(qa.user_id)
        .bind(&qa.question)
        .bind(&qa.answer)
        .bind(&qa.question_type)
        .bind(qa.confidence_score)
        .bind(&qa.entities)
        .bind(&qa.related_laws)
        .bind(&qa.related_cases)
        .bind(&qa.session_id)
        .bind(qa.is_feedback)
        .bind(&qa.feedback_type)
        .bind(qa.create_time)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_question_answer(&self, id: i64) -> SqlxResult<Option<QuestionAnswer>> {
        sqlx::query_as::<_, QuestionAnswer>(
            r#"
            SELECT id, user_id, question, answer, question_type, confidence_score, entities,
                   related_laws, related_cases, session_id, is_feedback, feedback_type, create_time
            FROM question_answers WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Newest-first history page for one user.
    pub async fn list_by_user(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> SqlxResult<Vec<QuestionAnswer>> {
        sqlx::query_as::<_, QuestionAnswer>(
            r#"
            SELECT id, user_id, question, answer, question_type, confidence_score, entities,
                   related_laws, related_cases, session_id, is_feedback, feedback_type, create_time
            FROM question_answers WHERE user_id = ?1
            ORDER BY create_time DESC, id DESC LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_by_user(&self, user_id: i64) -> SqlxResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM question_answers WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Conversation order: oldest first.
    pub async fn list_by_session(&self, session_id: &str) -> SqlxResult<Vec<QuestionAnswer>> {
        sqlx::query_as::<_, QuestionAnswer>(
            r#"
            SELECT id, user_id, question, answer, question_type, confidence_score, entities,
                   related_laws, related_cases, session_id, is_feedback, feedback_type, create_time
            FROM question_answers WHERE session_id = ?1
            ORDER BY create_time ASC, id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Mark a record as having feedback. Returns the number of rows touched,
    /// so callers can distinguish a missing record. Overwrites any previous
    /// feedback.
    pub async fn set_feedback(&self, id: i64, feedback_type: &str) -> SqlxResult<u64> {
        let result = sqlx::query(
            "UPDATE question_answers SET is_feedback = 1, feedback_type = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(feedback_type)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn search_questions(
        &self,
        keyword: &str,
        limit: i64,
        offset: i64,
    ) -> SqlxResult<Vec<QuestionAnswer>> {
        let pattern = format!("%{}%", keyword);
        sqlx::query_as::<_, QuestionAnswer>(
            r#"
            SELECT id, user_id, question, answer, question_type, confidence_score, entities,
                   related_laws, related_cases, session_id, is_feedback, feedback_type, create_time
            FROM question_answers WHERE question LIKE ?1
            ORDER BY create_time DESC, id DESC LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn count_question_matches(&self, keyword: &str) -> SqlxResult<i64> {
        let pattern = format!("%{}%", keyword);
        sqlx::query_scalar("SELECT COUNT(*) FROM question_answers WHERE question LIKE ?1")
            .bind(pattern)
            .fetch_one(&self.pool)
            .await
    }

    // KnowledgeBase methods

    /// Prior Q&As whose question or keywords contain the keyword, most
    /// relevant first.
    pub async fn search_knowledge(
        &self,
        keyword: &str,
        limit: i64,
    ) -> SqlxResult<Vec<KnowledgeEntry>> {
        let pattern = format!("%{}%", keyword);
        sqlx::query_as::<_, KnowledgeEntry>(
            r#"
            SELECT id, question, answer, keywords, relevance_score
            FROM knowledge_base
            WHERE question LIKE ?1 OR keywords LIKE ?1
            ORDER BY relevance_score DESC LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn insert_knowledge(&self, entry: &KnowledgeEntry) -> SqlxResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO knowledge_base (question, answer, keywords, relevance_score)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&entry.question)
        .bind(&entry.answer)
        .bind(&entry.keywords)
        .bind(entry.relevance_score)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    // LegalArticle methods

    pub async fn search_articles(&self, keyword: &str, limit: i64) -> SqlxResult<Vec<LegalArticle>> {
        let pattern = format!("%{}%", keyword);
        sqlx::query_as::<_, LegalArticle>(
            r#"
            SELECT id, title, article_number, content
            FROM legal_articles
            WHERE title LIKE ?1 OR content LIKE ?1
            ORDER BY id LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn insert_article(&self, article: &LegalArticle) -> SqlxResult<i64> {
        let result = sqlx::query(
            "INSERT INTO legal_articles (title, article_number, content) VALUES (?1, ?2, ?3)",
        )
        .bind(&article.title)
        .bind(&article.article_number)
        .bind(&article.content)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    // LegalCase methods

    pub async fn search_cases(&self, keyword: &str, limit: i64) -> SqlxResult<Vec<LegalCase>> {
        let pattern = format!("%{}%", keyword);
        sqlx::query_as::<_, LegalCase>(
            r#"
            SELECT id, title, case_type, content
            FROM legal_cases
            WHERE title LIKE ?1 OR content LIKE ?1
            ORDER BY id LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn cases_by_type(&self, case_type: &str, limit: i64) -> SqlxResult<Vec<LegalCase>> {
        sqlx::query_as::<_, LegalCase>(
            r#"
            SELECT id, title, case_type, content
            FROM legal_cases WHERE case_type = ?1 ORDER BY id LIMIT ?2
            "#,
        )
        .bind(case_type)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn insert_case(&self, case: &LegalCase) -> SqlxResult<i64> {
        let result =
            sqlx::query("INSERT INTO legal_cases (title, case_type, content) VALUES (?1, ?2, ?3)")
                .bind(&case.title)
                .bind(&case.case_type)
                .bind(&case.content)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    // LegalConcept methods

    pub async fn find_concept_by_name(&self, name: &str) -> SqlxResult<Option<LegalConcept>> {
        sqlx::query_as::<_, LegalConcept>(
            "SELECT id, name, definition FROM legal_concepts WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn insert_concept(&self, concept: &LegalConcept) -> SqlxResult<i64> {
        let result = sqlx::query("INSERT INTO legal_concepts (name, definition) VALUES (?1, ?2)")
            .bind(&concept.name)
            .bind(&concept.definition)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }
}
