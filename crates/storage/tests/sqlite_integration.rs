use chrono::Duration;
use quiz_core::model::{
    Achievement, Answer, Question, QuestionId, QuestionOutcome, ScoreSummary, TestResult, Topic,
    TopicId, UserId,
};
use quiz_core::time::fixed_now;
use storage::repository::{
    CompletionRecord, QuestionRepository, ResultRepository, StorageError, TopicRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn result(user: u64, correct: u32, total: u32, minutes_later: i64) -> TestResult {
    let score = ScoreSummary {
        correct,
        total,
        percentage: quiz_core::scoring::percentage(correct, total),
    };
    let started = fixed_now() + Duration::minutes(minutes_later);
    TestResult::from_score(
        UserId::new(user),
        TopicId::new(1),
        &score,
        started,
        started + Duration::seconds(42),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrips_question_bank() {
    let repo = connect("memdb_bank").await;

    let topic = Topic::new(TopicId::new(1), "Rome", Some("Republic and Empire".into())).unwrap();
    repo.upsert_topic(&topic).await.unwrap();

    let sequence = Question::new(
        QuestionId::new(2),
        topic.id(),
        "Order these",
        vec!["b".into(), "c".into(), "a".into()],
        Answer::Sequence(vec![2, 0, 1]),
    )
    .unwrap()
    .with_difficulty(3)
    .unwrap()
    .with_explanation(Some("alphabetical".into()));
    let multiple = Question::new(
        QuestionId::new(1),
        topic.id(),
        "Pick vowels",
        vec!["a".into(), "b".into(), "e".into()],
        Answer::Multiple([0, 2].into_iter().collect()),
    )
    .unwrap()
    .with_media(Some("img/vowels.png".into()));
    repo.upsert_question(&sequence).await.unwrap();
    repo.upsert_question(&multiple).await.unwrap();

    let fetched = repo.questions_by_topic(topic.id()).await.unwrap();
    assert_eq!(fetched, vec![multiple, sequence]);

    assert_eq!(repo.list_topics().await.unwrap(), vec![topic.clone()]);
    assert_eq!(repo.get_topic(TopicId::new(1)).await.unwrap(), Some(topic));
    assert_eq!(repo.get_topic(TopicId::new(2)).await.unwrap(), None);
    assert!(repo.questions_by_topic(TopicId::new(2)).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_rejects_question_for_missing_topic() {
    let repo = connect("memdb_missing_topic").await;
    let question = Question::new(
        QuestionId::new(1),
        TopicId::new(99),
        "Q",
        vec!["a".into()],
        Answer::Single(0),
    )
    .unwrap();
    let err = repo.upsert_question(&question).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_records_completion_atomically() {
    let repo = connect("memdb_completion").await;
    repo.upsert_topic(&Topic::new(TopicId::new(1), "Rome", None).unwrap())
        .await
        .unwrap();

    let user = UserId::new(7);
    let first = Achievement::new(user, "First Test", "first", 10, None, fixed_now()).unwrap();
    let record = CompletionRecord {
        result: result(7, 1, 2, 0),
        outcomes: vec![
            QuestionOutcome {
                question_id: QuestionId::new(1),
                answer: Some(Answer::Multiple([0, 2].into_iter().collect())),
                is_correct: true,
            },
            QuestionOutcome {
                question_id: QuestionId::new(2),
                answer: None,
                is_correct: false,
            },
        ],
        achievements: vec![first.clone()],
    };
    let id = repo.record_completion(&record).await.unwrap();

    assert_eq!(repo.completed_result_count(user).await.unwrap(), 1);
    assert_eq!(repo.outcomes_for_result(id).await.unwrap(), record.outcomes);
    assert_eq!(repo.list_achievements(user).await.unwrap(), vec![first.clone()]);

    // A second grant of the same name rolls back the whole completion.
    let duplicate = CompletionRecord {
        result: result(7, 2, 2, 5),
        outcomes: Vec::new(),
        achievements: vec![first],
    };
    let err = repo.record_completion(&duplicate).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
    assert_eq!(repo.completed_result_count(user).await.unwrap(), 1);

    let err = repo.outcomes_for_result(id + 100).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_lists_results_newest_first() {
    let repo = connect("memdb_history").await;
    repo.upsert_topic(&Topic::new(TopicId::new(1), "Rome", None).unwrap())
        .await
        .unwrap();

    let older = repo.append_result(&result(3, 1, 4, 0)).await.unwrap();
    let newer = repo.append_result(&result(3, 4, 4, 10)).await.unwrap();
    repo.append_result(&result(4, 0, 4, 20)).await.unwrap();

    let rows = repo.list_results(UserId::new(3), 10).await.unwrap();
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![newer, older]);
    assert_eq!(rows[0].result.score(), 4);
    assert!((rows[0].result.percentage() - 100.0).abs() < f64::EPSILON);
    assert_eq!(rows[0].result.time_spent_secs(), 42);

    let names = repo.achievement_names(UserId::new(3)).await.unwrap();
    assert!(names.is_empty());
    repo.append_achievement(
        &Achievement::new(UserId::new(3), "Top Student", "100%", 50, None, fixed_now()).unwrap(),
    )
    .await
    .unwrap();
    let err = repo
        .append_achievement(
            &Achievement::new(UserId::new(3), "Top Student", "100%", 50, None, fixed_now())
                .unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}
