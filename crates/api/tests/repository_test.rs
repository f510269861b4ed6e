use sqlx::sqlite::SqlitePoolOptions;

use lexqa_api::database::{
    KnowledgeEntry, LegalArticle, LegalCase, LegalConcept, QuestionAnswer, Repository, MIGRATOR,
};

async fn setup_test_repo() -> Result<Repository, Box<dyn std::error::Error>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    MIGRATOR.run(&pool).await?;
    Ok(Repository::new(pool))
}

fn sample_qa(user_id: Option<i64>, session_id: &str, create_time: i64) -> QuestionAnswer {
    QuestionAnswer {
        id: 0,
        user_id,
        question: "什么是正当防卫".to_string(),
        answer: "正当防卫是指……".to_string(),
        question_type: "概念定义".to_string(),
        confidence_score: 0.7,
        entities: "{}".to_string(),
        related_laws: "[]".to_string(),
        related_cases: "[]".to_string(),
        session_id: session_id.to_string(),
        is_feedback: false,
        feedback_type: None,
        create_time,
    }
}

#[tokio::test]
async fn test_user_crud() -> Result<(), Box<dyn std::error::Error>> {
    let repo = setup_test_repo().await?;

    let id = repo
        .create_user("alice", "salt$hash", Some("a@example.com"), None, None, 100)
        .await?;
    assert!(id > 0);

    let user = repo.get_user(id).await?.expect("user should exist");
    assert_eq!(user.username, "alice");
    assert_eq!(user.email.as_deref(), Some("a@example.com"));
    assert_eq!(user.user_type, 0);

    let by_name = repo
        .find_user_by_username("alice")
        .await?
        .expect("lookup by username");
    assert_eq!(by_name.id, id);

    assert!(repo.username_exists("alice").await?);
    assert!(!repo.username_exists("bob").await?);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_username_rejected_by_schema() -> Result<(), Box<dyn std::error::Error>> {
    let repo = setup_test_repo().await?;

    repo.create_user("alice", "h1", None, None, None, 1).await?;
    let result = repo.create_user("alice", "h2", None, None, None, 2).await;
    assert!(result.is_err());

    Ok(())
}

#[tokio::test]
async fn test_question_answer_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let repo = setup_test_repo().await?;

    let id = repo
        .insert_question_answer(&sample_qa(None, "session_1_0", 10))
        .await?;
    assert!(id > 0);

    let record = repo
        .get_question_answer(id)
        .await?
        .expect("record should exist");
    assert_eq!(record.question, "什么是正当防卫");
    assert!(record.user_id.is_none());
    assert!(!record.is_feedback);

    Ok(())
}

#[tokio::test]
async fn test_history_is_newest_first_and_paged() -> Result<(), Box<dyn std::error::Error>> {
    let repo = setup_test_repo().await?;

    for i in 0..15 {
        repo.insert_question_answer(&sample_qa(Some(7), "s", 100 + i))
            .await?;
    }
    // Another user's records never show up.
    repo.insert_question_answer(&sample_qa(Some(8), "s", 999))
        .await?;

    assert_eq!(repo.count_by_user(7).await?, 15);

    let first_page = repo.list_by_user(7, 10, 0).await?;
    assert_eq!(first_page.len(), 10);
    assert_eq!(first_page[0].create_time, 114);
    assert!(first_page.windows(2).all(|w| w[0].create_time >= w[1].create_time));

    let second_page = repo.list_by_user(7, 10, 10).await?;
    assert_eq!(second_page.len(), 5);
    assert_eq!(second_page[4].create_time, 100);

    Ok(())
}

#[tokio::test]
async fn test_history_ties_break_by_id() -> Result<(), Box<dyn std::error::Error>> {
    let repo = setup_test_repo().await?;

    let first = repo
        .insert_question_answer(&sample_qa(Some(1), "s", 50))
        .await?;
    let second = repo
        .insert_question_answer(&sample_qa(Some(1), "s", 50))
        .await?;

    let page = repo.list_by_user(1, 10, 0).await?;
    assert_eq!(page[0].id, second);
    assert_eq!(page[1].id, first);

    Ok(())
}

#[tokio::test]
async fn test_conversation_is_oldest_first() -> Result<(), Box<dyn std::error::Error>> {
    let repo = setup_test_repo().await?;

    repo.insert_question_answer(&sample_qa(None, "session_a", 30))
        .await?;
    repo.insert_question_answer(&sample_qa(None, "session_a", 10))
        .await?;
    repo.insert_question_answer(&sample_qa(None, "session_b", 20))
        .await?;

    let records = repo.list_by_session("session_a").await?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].create_time, 10);
    assert_eq!(records[1].create_time, 30);

    Ok(())
}

#[tokio::test]
async fn test_feedback_update() -> Result<(), Box<dyn std::error::Error>> {
    let repo = setup_test_repo().await?;

    let id = repo
        .insert_question_answer(&sample_qa(None, "s", 1))
        .await?;

    assert_eq!(repo.set_feedback(id, "helpful").await?, 1);
    let record = repo.get_question_answer(id).await?.unwrap();
    assert!(record.is_feedback);
    assert_eq!(record.feedback_type.as_deref(), Some("helpful"));

    // Overwrite is allowed.
    assert_eq!(repo.set_feedback(id, "unhelpful").await?, 1);
    let record = repo.get_question_answer(id).await?.unwrap();
    assert_eq!(record.feedback_type.as_deref(), Some("unhelpful"));

    // Missing record touches zero rows.
    assert_eq!(repo.set_feedback(id + 100, "helpful").await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_question_search() -> Result<(), Box<dyn std::error::Error>> {
    let repo = setup_test_repo().await?;

    let mut qa = sample_qa(None, "s", 1);
    qa.question = "盗窃罪的量刑标准是什么".to_string();
    repo.insert_question_answer(&qa).await?;
    repo.insert_question_answer(&sample_qa(None, "s", 2))
        .await?;

    let matches = repo.search_questions("盗窃", 10, 0).await?;
    assert_eq!(matches.len(), 1);
    assert_eq!(repo.count_question_matches("盗窃").await?, 1);
    assert_eq!(repo.count_question_matches("没有的词").await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_knowledge_search_orders_by_relevance() -> Result<(), Box<dyn std::error::Error>> {
    let repo = setup_test_repo().await?;

    repo.insert_knowledge(&KnowledgeEntry {
        id: 0,
        question: "正当防卫的条件".to_string(),
        answer: "答案甲".to_string(),
        keywords: Some("正当防卫,防卫".to_string()),
        relevance_score: 0.3,
    })
    .await?;
    repo.insert_knowledge(&KnowledgeEntry {
        id: 0,
        question: "什么情况属于正当防卫".to_string(),
        answer: "答案乙".to_string(),
        keywords: None,
        relevance_score: 0.9,
    })
    .await?;

    let entries = repo.search_knowledge("正当防卫", 10).await?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].answer, "答案乙");

    // Keyword column also matches.
    let by_keyword = repo.search_knowledge("防卫", 10).await?;
    assert_eq!(by_keyword.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_article_and_case_search() -> Result<(), Box<dyn std::error::Error>> {
    let repo = setup_test_repo().await?;

    repo.insert_article(&LegalArticle {
        id: 0,
        title: "《中华人民共和国刑法》".to_string(),
        article_number: "第二十条".to_string(),
        content: "为了使国家、公共利益……".to_string(),
    })
    .await?;

    let articles = repo.search_articles("刑法", 5).await?;
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].article_number, "第二十条");

    repo.insert_case(&LegalCase {
        id: 0,
        title: "某正当防卫案".to_string(),
        case_type: "案例分析".to_string(),
        content: "案情……".to_string(),
    })
    .await?;

    assert_eq!(repo.search_cases("正当防卫", 3).await?.len(), 1);
    assert_eq!(repo.cases_by_type("案例分析", 3).await?.len(), 1);
    assert!(repo.cases_by_type("其他", 3).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_concept_lookup_is_exact() -> Result<(), Box<dyn std::error::Error>> {
    let repo = setup_test_repo().await?;

    repo.insert_concept(&LegalConcept {
        id: 0,
        name: "正当防卫".to_string(),
        definition: "为使合法权益免受正在进行的不法侵害……".to_string(),
    })
    .await?;

    assert!(repo.find_concept_by_name("正当防卫").await?.is_some());
    assert!(repo.find_concept_by_name("正当").await?.is_none());

    Ok(())
}
