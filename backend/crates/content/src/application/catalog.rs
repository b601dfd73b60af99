//! Catalog Use Case
//!
//! Public, read-only browsing of published content.

use std::sync::Arc;

use kernel::pagination::{Page, PageRequest};
use kernel::search::normalize_query;

use crate::domain::entity::{material::MaterialSummary, subject::SubjectSummary};
use crate::domain::repository::{
    CatalogRepository, MaterialSearch, SubjectRepository, TeacherSearch, TeacherSummary,
};
use crate::error::ContentResult;

pub struct CatalogUseCase<C, S>
where
    C: CatalogRepository,
    S: SubjectRepository,
{
    catalog_repo: Arc<C>,
    subject_repo: Arc<S>,
}

impl<C, S> CatalogUseCase<C, S>
where
    C: CatalogRepository,
    S: SubjectRepository,
{
    pub fn new(catalog_repo: Arc<C>, subject_repo: Arc<S>) -> Self {
        Self {
            catalog_repo,
            subject_repo,
        }
    }

    pub async fn materials(
        &self,
        mut search: MaterialSearch,
        page: PageRequest,
    ) -> ContentResult<Page<MaterialSummary>> {
        search.query = normalize_query(search.query);
        let (items, total) = self.catalog_repo.search_materials(&search, page).await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn subjects(&self) -> ContentResult<Vec<SubjectSummary>> {
        self.subject_repo.list_subjects().await
    }

    pub async fn teachers(
        &self,
        mut search: TeacherSearch,
        page: PageRequest,
    ) -> ContentResult<Page<TeacherSummary>> {
        search.query = normalize_query(search.query);
        let (items, total) = self.catalog_repo.search_teachers(&search, page).await?;
        Ok(Page::new(items, page, total))
    }
}
