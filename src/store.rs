//! Content repository.
//!
//! Generated paths, exercises and quizzes are kept by id. Saving a path
//! also indexes the exercises and quizzes nested in its nodes so they can be
//! fetched, submitted and graded on their own.
//!
//! Ids often come from the model and are only unique within one generated
//! tree, so saving reissues any id that already names stored content.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::{Exercise, LearningPath, Quiz};
use crate::normalize::ids;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentStats {
    pub learning_paths: usize,
    pub exercises: usize,
    pub quizzes: usize,
}

#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Insert a path, indexing its nested exercises and quizzes. Ids already
    /// in use are reissued; the returned path carries the ids it was stored under.
    async fn save_learning_path(&self, path: LearningPath) -> StoreResult<LearningPath>;

    async fn get_learning_path(&self, id: &str) -> StoreResult<LearningPath>;

    /// Replace an existing path; fails if it was never saved.
    async fn update_learning_path(&self, path: LearningPath) -> StoreResult<LearningPath>;

    /// Insert an exercise, reissuing its id if it is already in use.
    async fn save_exercise(&self, exercise: Exercise) -> StoreResult<Exercise>;

    async fn get_exercise(&self, id: &str) -> StoreResult<Exercise>;

    /// Insert a quiz, reissuing its id if it is already in use.
    async fn save_quiz(&self, quiz: Quiz) -> StoreResult<Quiz>;

    async fn get_quiz(&self, id: &str) -> StoreResult<Quiz>;

    async fn stats(&self) -> ContentStats;
}

#[derive(Default)]
struct Tables {
    paths: HashMap<String, LearningPath>,
    exercises: HashMap<String, Exercise>,
    quizzes: HashMap<String, Quiz>,
}

impl Tables {
    fn claim_path_ids(&self, path: &mut LearningPath) {
        claim(&mut path.id, ids::PATH_PREFIX, "learning path", |id| self.paths.contains_key(id));
        for node in &mut path.nodes {
            for exercise in &mut node.exercises {
                claim(&mut exercise.id, ids::EXERCISE_PREFIX, "exercise", |id| self.exercises.contains_key(id));
            }
            if let Some(quiz) = &mut node.quiz {
                claim(&mut quiz.id, ids::QUIZ_PREFIX, "quiz", |id| self.quizzes.contains_key(id));
            }
        }
    }

    fn index_path(&mut self, path: &LearningPath) {
        for node in &path.nodes {
            for exercise in &node.exercises {
                self.exercises.insert(exercise.id.clone(), exercise.clone());
            }
            if let Some(quiz) = &node.quiz {
                self.quizzes.insert(quiz.id.clone(), quiz.clone());
            }
        }
        self.paths.insert(path.id.clone(), path.clone());
    }
}

fn claim(id: &mut String, prefix: &str, kind: &'static str, taken: impl Fn(&str) -> bool) {
    if !taken(id.as_str()) {
        return;
    }
    let mut fresh = ids::new_id(prefix);
    while taken(&fresh) {
        fresh = ids::new_id(prefix);
    }
    warn!(target: "store", kind, taken = %id, reissued = %fresh, "id already stored; reissued");
    *id = fresh;
}

/// Process-local store; contents are gone on restart.
#[derive(Default)]
pub struct InMemoryContentRepository {
    tables: RwLock<Tables>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn save_learning_path(&self, mut path: LearningPath) -> StoreResult<LearningPath> {
        let mut tables = self.tables.write().await;
        tables.claim_path_ids(&mut path);
        tables.index_path(&path);
        debug!(target: "store", path_id = %path.id, nodes = path.nodes.len(), "learning path saved");
        Ok(path)
    }

    async fn get_learning_path(&self, id: &str) -> StoreResult<LearningPath> {
        let tables = self.tables.read().await;
        tables.paths.get(id).cloned().ok_or_else(|| StoreError::NotFound {
            kind: "learning path",
            id: id.to_string(),
        })
    }

    async fn update_learning_path(&self, path: LearningPath) -> StoreResult<LearningPath> {
        let mut tables = self.tables.write().await;
        if !tables.paths.contains_key(&path.id) {
            return Err(StoreError::NotFound { kind: "learning path", id: path.id });
        }
        tables.index_path(&path);
        Ok(path)
    }

    async fn save_exercise(&self, mut exercise: Exercise) -> StoreResult<Exercise> {
        let mut tables = self.tables.write().await;
        claim(&mut exercise.id, ids::EXERCISE_PREFIX, "exercise", |id| tables.exercises.contains_key(id));
        tables.exercises.insert(exercise.id.clone(), exercise.clone());
        debug!(target: "store", exercise_id = %exercise.id, "exercise saved");
        Ok(exercise)
    }

    async fn get_exercise(&self, id: &str) -> StoreResult<Exercise> {
        let tables = self.tables.read().await;
        tables.exercises.get(id).cloned().ok_or_else(|| StoreError::NotFound {
            kind: "exercise",
            id: id.to_string(),
        })
    }

    async fn save_quiz(&self, mut quiz: Quiz) -> StoreResult<Quiz> {
        let mut tables = self.tables.write().await;
        claim(&mut quiz.id, ids::QUIZ_PREFIX, "quiz", |id| tables.quizzes.contains_key(id));
        tables.quizzes.insert(quiz.id.clone(), quiz.clone());
        debug!(target: "store", quiz_id = %quiz.id, questions = quiz.questions.len(), "quiz saved");
        Ok(quiz)
    }

    async fn get_quiz(&self, id: &str) -> StoreResult<Quiz> {
        let tables = self.tables.read().await;
        tables.quizzes.get(id).cloned().ok_or_else(|| StoreError::NotFound {
            kind: "quiz",
            id: id.to_string(),
        })
    }

    async fn stats(&self) -> ContentStats {
        let tables = self.tables.read().await;
        ContentStats {
            learning_paths: tables.paths.len(),
            exercises: tables.exercises.len(),
            quizzes: tables.quizzes.len(),
        }
    }
}
