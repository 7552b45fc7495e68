use std::collections::HashMap;

use futures::future::{ready, BoxFuture, FutureExt};
use parking_lot::RwLock;

use crate::dj::Dj;
use crate::errors::FestivalError;
use crate::performance::Performance;
use crate::review::Review;
use crate::subject::{Subject, SubjectType};

/// Catalog storage held in process memory. Used when no database is
/// configured, and in tests.
#[derive(Default)]
pub struct MemoryCatalogDb {
    tables: RwLock<CatalogTables>,
}

#[derive(Default)]
struct CatalogTables {
    djs: Vec<Dj>,
    performances: Vec<Performance>,

    /// Performance IDs by DJ ID, in insertion order.
    performances_by_dj: HashMap<String, Vec<String>>,
}

impl MemoryCatalogDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogTables {
    fn dj_position(&self, id: &str) -> Option<usize> {
        self.djs.iter().position(|dj| dj.id == id)
    }

    fn performance_position(&self, id: &str) -> Option<usize> {
        self.performances.iter().position(|p| p.id == id)
    }

    fn email_taken_by_other(&self, email: &str, id: &str) -> bool {
        self.djs.iter().any(|dj| dj.email == email && dj.id != id)
    }

    fn index(&mut self, dj_id: &str, performance_id: &str) {
        self.performances_by_dj
            .entry(dj_id.to_owned())
            .or_default()
            .push(performance_id.to_owned());
    }

    fn unindex(&mut self, dj_id: &str, performance_id: &str) {
        if let Some(ids) = self.performances_by_dj.get_mut(dj_id) {
            ids.retain(|id| id != performance_id);

            if ids.is_empty() {
                self.performances_by_dj.remove(dj_id);
            }
        }
    }

    fn insert_dj(&mut self, dj: Dj) -> Result<Dj, FestivalError> {
        if self.email_taken_by_other(&dj.email, &dj.id) {
            return Err(FestivalError::EmailAlreadyExists(dj.email));
        }

        self.djs.push(dj.clone());

        Ok(dj)
    }

    fn update_dj(&mut self, dj: Dj) -> Result<bool, FestivalError> {
        let position = match self.dj_position(&dj.id) {
            Some(position) => position,
            None => return Ok(false),
        };

        if self.email_taken_by_other(&dj.email, &dj.id) {
            return Err(FestivalError::EmailAlreadyExists(dj.email));
        }

        self.djs[position] = dj;

        Ok(true)
    }

    fn delete_dj(&mut self, id: &str) -> bool {
        let position = match self.dj_position(id) {
            Some(position) => position,
            None => return false,
        };

        self.djs.remove(position);

        if let Some(performance_ids) = self.performances_by_dj.remove(id) {
            self.performances
                .retain(|p| !performance_ids.contains(&p.id));
        }

        true
    }

    fn insert_performance(&mut self, performance: Performance) -> Result<Performance, FestivalError> {
        if self.dj_position(&performance.dj_id).is_none() {
            return Err(FestivalError::PerformanceDjMissing(performance.dj_id));
        }

        self.index(&performance.dj_id, &performance.id);
        self.performances.push(performance.clone());

        Ok(performance)
    }

    fn update_performance(&mut self, performance: Performance) -> Result<bool, FestivalError> {
        let position = match self.performance_position(&performance.id) {
            Some(position) => position,
            None => return Ok(false),
        };

        if self.dj_position(&performance.dj_id).is_none() {
            return Err(FestivalError::UpdatedPerformanceDjMissing(performance.dj_id));
        }

        let previous_dj_id = self.performances[position].dj_id.clone();

        if previous_dj_id != performance.dj_id {
            self.unindex(&previous_dj_id, &performance.id);
            self.index(&performance.dj_id, &performance.id);
        }

        self.performances[position] = performance;

        Ok(true)
    }

    fn delete_performance(&mut self, id: &str) -> bool {
        let position = match self.performance_position(id) {
            Some(position) => position,
            None => return false,
        };

        let performance = self.performances.remove(position);
        self.unindex(&performance.dj_id, &performance.id);

        true
    }

    fn performances_by_dj(&self, dj_id: &str) -> Vec<Performance> {
        self.performances_by_dj
            .get(dj_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.performances.iter().find(|p| &p.id == id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl super::CatalogDb for MemoryCatalogDb {
    fn insert_dj(&self, dj: Dj) -> BoxFuture<Result<Dj, FestivalError>> {
        ready(self.tables.write().insert_dj(dj)).boxed()
    }

    fn update_dj(&self, dj: Dj) -> BoxFuture<Result<bool, FestivalError>> {
        ready(self.tables.write().update_dj(dj)).boxed()
    }

    fn delete_dj(&self, id: &str) -> BoxFuture<Result<bool, FestivalError>> {
        ready(Ok(self.tables.write().delete_dj(id))).boxed()
    }

    fn retrieve_dj(&self, id: &str) -> BoxFuture<Result<Option<Dj>, FestivalError>> {
        let tables = self.tables.read();
        let dj = tables.djs.iter().find(|dj| dj.id == id).cloned();

        ready(Ok(dj)).boxed()
    }

    fn retrieve_dj_by_email(&self, email: &str) -> BoxFuture<Result<Option<Dj>, FestivalError>> {
        let tables = self.tables.read();
        let dj = tables.djs.iter().find(|dj| dj.email == email).cloned();

        ready(Ok(dj)).boxed()
    }

    fn retrieve_djs(&self) -> BoxFuture<Result<Vec<Dj>, FestivalError>> {
        ready(Ok(self.tables.read().djs.clone())).boxed()
    }

    fn retrieve_djs_by_genre(&self, genre: &str) -> BoxFuture<Result<Vec<Dj>, FestivalError>> {
        let tables = self.tables.read();
        let djs = tables
            .djs
            .iter()
            .filter(|dj| dj.genre == genre)
            .cloned()
            .collect();

        ready(Ok(djs)).boxed()
    }

    fn retrieve_djs_by_name(&self, name: &str) -> BoxFuture<Result<Vec<Dj>, FestivalError>> {
        let tables = self.tables.read();
        let djs = tables
            .djs
            .iter()
            .filter(|dj| dj.name == name)
            .cloned()
            .collect();

        ready(Ok(djs)).boxed()
    }

    fn count_djs(&self) -> BoxFuture<Result<u64, FestivalError>> {
        ready(Ok(self.tables.read().djs.len() as u64)).boxed()
    }

    fn insert_performance(
        &self,
        performance: Performance,
    ) -> BoxFuture<Result<Performance, FestivalError>> {
        ready(self.tables.write().insert_performance(performance)).boxed()
    }

    fn update_performance(&self, performance: Performance) -> BoxFuture<Result<bool, FestivalError>> {
        ready(self.tables.write().update_performance(performance)).boxed()
    }

    fn delete_performance(&self, id: &str) -> BoxFuture<Result<bool, FestivalError>> {
        ready(Ok(self.tables.write().delete_performance(id))).boxed()
    }

    fn retrieve_performance(
        &self,
        id: &str,
    ) -> BoxFuture<Result<Option<Performance>, FestivalError>> {
        let tables = self.tables.read();
        let performance = tables.performances.iter().find(|p| p.id == id).cloned();

        ready(Ok(performance)).boxed()
    }

    fn retrieve_performances(&self) -> BoxFuture<Result<Vec<Performance>, FestivalError>> {
        ready(Ok(self.tables.read().performances.clone())).boxed()
    }

    fn retrieve_performances_by_dj(
        &self,
        dj_id: &str,
    ) -> BoxFuture<Result<Vec<Performance>, FestivalError>> {
        ready(Ok(self.tables.read().performances_by_dj(dj_id))).boxed()
    }

    fn count_performances(&self) -> BoxFuture<Result<u64, FestivalError>> {
        ready(Ok(self.tables.read().performances.len() as u64)).boxed()
    }
}

/// Review storage held in process memory.
#[derive(Default)]
pub struct MemoryReviewDb {
    reviews: RwLock<Vec<Review>>,
}

impl MemoryReviewDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(&self, predicate: impl Fn(&Review) -> bool) -> Vec<Review> {
        self.reviews
            .read()
            .iter()
            .filter(|r| predicate(*r))
            .cloned()
            .collect()
    }
}

impl super::ReviewDb for MemoryReviewDb {
    fn insert(&self, review: Review) -> BoxFuture<Result<Review, FestivalError>> {
        self.reviews.write().push(review.clone());

        ready(Ok(review)).boxed()
    }

    fn update(&self, review: Review) -> BoxFuture<Result<bool, FestivalError>> {
        let mut reviews = self.reviews.write();

        let updated = match reviews.iter_mut().find(|r| r.id == review.id) {
            Some(existing) => {
                *existing = review;
                true
            }
            None => false,
        };

        ready(Ok(updated)).boxed()
    }

    fn delete(&self, id: &str) -> BoxFuture<Result<bool, FestivalError>> {
        let mut reviews = self.reviews.write();
        let before = reviews.len();
        reviews.retain(|r| r.id != id);

        ready(Ok(reviews.len() < before)).boxed()
    }

    fn retrieve(&self, id: &str) -> BoxFuture<Result<Option<Review>, FestivalError>> {
        let review = self.reviews.read().iter().find(|r| r.id == id).cloned();

        ready(Ok(review)).boxed()
    }

    fn retrieve_all(&self) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        ready(Ok(self.reviews.read().clone())).boxed()
    }

    fn retrieve_by_subject(&self, subject: &Subject) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        ready(Ok(self.filtered(|r| r.is_about(subject)))).boxed()
    }

    fn retrieve_by_subject_type(
        &self,
        subject_type: SubjectType,
    ) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        ready(Ok(self.filtered(|r| r.subject_type == subject_type))).boxed()
    }

    fn retrieve_by_reviewer(&self, reviewer_name: &str) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        ready(Ok(self.filtered(|r| r.reviewer_name == reviewer_name))).boxed()
    }

    fn retrieve_by_rating(&self, rating: i64) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        ready(Ok(self.filtered(|r| i64::from(r.rating) == rating))).boxed()
    }

    fn retrieve_by_minimum_rating(&self, rating: i64) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        ready(Ok(self.filtered(|r| i64::from(r.rating) >= rating))).boxed()
    }

    fn count(&self) -> BoxFuture<Result<u64, FestivalError>> {
        ready(Ok(self.reviews.read().len() as u64)).boxed()
    }
}
