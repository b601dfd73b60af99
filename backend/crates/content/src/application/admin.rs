//! Admin Content Use Case
//!
//! Dashboard statistics and subject management.

use std::sync::Arc;

use crate::domain::entity::subject::Subject;
use crate::domain::repository::{Statistics, StatisticsRepository, SubjectRepository};
use crate::domain::value_object::metadata::SubjectName;
use crate::error::ContentResult;

pub struct AdminContentUseCase<S, T>
where
    S: SubjectRepository,
    T: StatisticsRepository,
{
    subject_repo: Arc<S>,
    statistics_repo: Arc<T>,
}

impl<S, T> AdminContentUseCase<S, T>
where
    S: SubjectRepository,
    T: StatisticsRepository,
{
    pub fn new(subject_repo: Arc<S>, statistics_repo: Arc<T>) -> Self {
        Self {
            subject_repo,
            statistics_repo,
        }
    }

    pub async fn statistics(&self) -> ContentResult<Statistics> {
        self.statistics_repo.statistics().await
    }

    pub async fn create_subject(&self, name: &str) -> ContentResult<Subject> {
        let subject = Subject::new(SubjectName::new(name)?);
        self.subject_repo.create_subject(&subject).await?;

        tracing::info!(subject_id = %subject.subject_id, name = %subject.name.as_str(), "Subject created");

        Ok(subject)
    }
}
