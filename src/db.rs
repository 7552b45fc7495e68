use futures::future::BoxFuture;

use crate::dj::Dj;
use crate::errors::FestivalError;
use crate::performance::Performance;
use crate::review::Review;
use crate::subject::{Subject, SubjectType};

/// Storage for the Catalog Service: DJs and their performances.
pub trait CatalogDb {
    /// Saves a new DJ. Fails with `EmailAlreadyExists` if another DJ
    /// already uses the email address.
    fn insert_dj(&self, dj: Dj) -> BoxFuture<Result<Dj, FestivalError>>;

    /// Replaces a DJ's fields. Returns `false` if no such DJ exists.
    fn update_dj(&self, dj: Dj) -> BoxFuture<Result<bool, FestivalError>>;

    /// Deletes a DJ together with their performances. Returns `false` if
    /// no such DJ exists.
    fn delete_dj(&self, id: &str) -> BoxFuture<Result<bool, FestivalError>>;

    fn retrieve_dj(&self, id: &str) -> BoxFuture<Result<Option<Dj>, FestivalError>>;

    fn retrieve_dj_by_email(&self, email: &str) -> BoxFuture<Result<Option<Dj>, FestivalError>>;

    fn retrieve_djs(&self) -> BoxFuture<Result<Vec<Dj>, FestivalError>>;

    fn retrieve_djs_by_genre(&self, genre: &str) -> BoxFuture<Result<Vec<Dj>, FestivalError>>;

    fn retrieve_djs_by_name(&self, name: &str) -> BoxFuture<Result<Vec<Dj>, FestivalError>>;

    fn count_djs(&self) -> BoxFuture<Result<u64, FestivalError>>;

    fn insert_performance(
        &self,
        performance: Performance,
    ) -> BoxFuture<Result<Performance, FestivalError>>;

    /// Replaces a performance's fields. Returns `false` if no such
    /// performance exists.
    fn update_performance(&self, performance: Performance) -> BoxFuture<Result<bool, FestivalError>>;

    /// Returns `false` if no such performance exists.
    fn delete_performance(&self, id: &str) -> BoxFuture<Result<bool, FestivalError>>;

    fn retrieve_performance(
        &self,
        id: &str,
    ) -> BoxFuture<Result<Option<Performance>, FestivalError>>;

    fn retrieve_performances(&self) -> BoxFuture<Result<Vec<Performance>, FestivalError>>;

    fn retrieve_performances_by_dj(
        &self,
        dj_id: &str,
    ) -> BoxFuture<Result<Vec<Performance>, FestivalError>>;

    fn count_performances(&self) -> BoxFuture<Result<u64, FestivalError>>;
}

/// Document storage for the Review Service.
pub trait ReviewDb {
    fn insert(&self, review: Review) -> BoxFuture<Result<Review, FestivalError>>;

    /// Replaces a stored review. Returns `false` if no such review exists.
    fn update(&self, review: Review) -> BoxFuture<Result<bool, FestivalError>>;

    /// Returns `false` if no such review exists.
    fn delete(&self, id: &str) -> BoxFuture<Result<bool, FestivalError>>;

    fn retrieve(&self, id: &str) -> BoxFuture<Result<Option<Review>, FestivalError>>;

    fn retrieve_all(&self) -> BoxFuture<Result<Vec<Review>, FestivalError>>;

    fn retrieve_by_subject(&self, subject: &Subject) -> BoxFuture<Result<Vec<Review>, FestivalError>>;

    fn retrieve_by_subject_type(
        &self,
        subject_type: SubjectType,
    ) -> BoxFuture<Result<Vec<Review>, FestivalError>>;

    fn retrieve_by_reviewer(&self, reviewer_name: &str) -> BoxFuture<Result<Vec<Review>, FestivalError>>;

    fn retrieve_by_rating(&self, rating: i64) -> BoxFuture<Result<Vec<Review>, FestivalError>>;

    fn retrieve_by_minimum_rating(&self, rating: i64) -> BoxFuture<Result<Vec<Review>, FestivalError>>;

    fn count(&self) -> BoxFuture<Result<u64, FestivalError>>;
}

pub use self::memory::*;
pub use self::postgres::*;

mod memory;
mod postgres;
