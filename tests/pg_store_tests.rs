// tests/pg_store_tests.rs

//! Runs against a live Postgres when `DATABASE_URL` is set; otherwise each
//! test returns early.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use sqlx::postgres::PgPoolOptions;
use trivia_backend::{
    error::AppError,
    models::{category::Category, coins::DebitOutcome, quiz_session::CompleteWrite, user::NewUser},
    store::{PgStore, Store},
};

async fn store() -> Option<PgStore> {
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(PgStore::new(pool))
}

async fn new_user(store: &PgStore) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    store
        .create_user(NewUser {
            id: id.clone(),
            username: format!("pg_{}", &id[..12]),
            email: format!("{}@example.com", id),
            continent: Some("Europe".to_string()),
            country: Some("France".to_string()),
        })
        .await
        .unwrap();
    id
}

/// A partition date no other test run will share.
fn isolated_date() -> NaiveDate {
    let offset = uuid::Uuid::new_v4().as_u128() % 3_000_000;
    NaiveDate::from_ymd_opt(1000, 1, 1)
        .unwrap()
        .checked_add_days(Days::new(offset as u64))
        .unwrap()
}

#[tokio::test]
async fn concurrent_debits_never_overdraw() {
    let Some(store) = store().await else { return };
    let store = Arc::new(store);
    let id = new_user(&store).await;

    let mut handles = Vec::new();
    for _ in 0..25 {
        let store = store.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move { store.debit_coins(&id, 1).await.unwrap() }));
    }

    let mut debited = 0;
    for handle in handles {
        if let DebitOutcome::Debited { .. } = handle.await.unwrap() {
            debited += 1;
        }
    }

    assert_eq!(debited, 10);
    assert_eq!(store.get_user(&id).await.unwrap().unwrap().coins, 0);
}

#[tokio::test]
async fn partition_ranks_stay_contiguous_under_concurrency() {
    let Some(store) = store().await else { return };
    let store = Arc::new(store);
    let date = isolated_date();

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        let user = new_user(&store).await;
        let session = store
            .create_session(&user, Category::Arts, &[])
            .await
            .unwrap();
        handles.push(tokio::spawn(async move {
            store
                .insert_leaderboard_entry(&user, session.id, Category::Arts, (i % 3) * 100, date)
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let rows = store
        .query_leaderboard(&trivia_backend::models::leaderboard::LeaderboardFilter {
            category: Some(Category::Arts),
            date: Some(date),
            limit: 100,
            ..Default::default()
        })
        .await
        .unwrap();

    let ranks: Vec<i32> = rows.iter().map(|r| r.entry.rank).collect();
    assert_eq!(ranks, (1..=8).collect::<Vec<i32>>());
    for pair in rows.windows(2) {
        let (a, b) = (&pair[0].entry, &pair[1].entry);
        assert!(a.score > b.score || (a.score == b.score && a.id < b.id));
    }
}

#[tokio::test]
async fn completion_happens_once() {
    let Some(store) = store().await else { return };
    let user = new_user(&store).await;
    let session = store
        .create_session(&user, Category::Science, &[])
        .await
        .unwrap();

    assert!(matches!(
        store.complete_session(session.id, 0, 0).await.unwrap(),
        CompleteWrite::Completed(_)
    ));
    assert!(matches!(
        store.complete_session(session.id, 0, 0).await.unwrap(),
        CompleteWrite::AlreadyCompleted
    ));
}

#[tokio::test]
async fn credit_past_the_maximum_balance_is_a_bad_request() {
    let Some(store) = store().await else { return };
    let id = new_user(&store).await;

    assert!(matches!(
        store.credit_coins(&id, i32::MAX).await,
        Err(AppError::BadRequest(_))
    ));
    assert_eq!(store.get_user(&id).await.unwrap().unwrap().coins, 10);
}
