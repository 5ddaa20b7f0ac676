// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::{question_bank::QuestionBank, quiz::QuizService},
    store::DynStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub config: Config,
    pub quiz: Arc<QuizService>,
}

impl AppState {
    pub fn new(store: DynStore, config: Config, bank: Arc<QuestionBank>) -> Self {
        let quiz = Arc::new(QuizService::new(store.clone(), bank));
        Self { store, config, quiz }
    }
}

impl FromRef<AppState> for DynStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<QuizService> {
    fn from_ref(state: &AppState) -> Self {
        state.quiz.clone()
    }
}
