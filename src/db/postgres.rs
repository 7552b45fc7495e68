use std::convert::TryFrom;

use futures::future::{BoxFuture, FutureExt};
use sqlx::postgres::PgPool;
use sqlx::types::Json;

use crate::dj::Dj;
use crate::errors::FestivalError;
use crate::performance::Performance;
use crate::review::Review;
use crate::subject::{Subject, SubjectType};

const EMAIL_CONSTRAINT: &str = "djs_email_key";
const PERFORMANCE_DJ_CONSTRAINT: &str = "performances_dj_id_fkey";

/// Catalog storage backed by the `djs` and `performances` tables.
pub struct PgCatalogDb {
    pool: PgPool,
}

impl PgCatalogDb {
    pub fn new(pool: PgPool) -> Self {
        PgCatalogDb { pool }
    }
}

impl super::CatalogDb for PgCatalogDb {
    fn insert_dj(&self, dj: Dj) -> BoxFuture<Result<Dj, FestivalError>> {
        insert_dj(dj, &self.pool).boxed()
    }

    fn update_dj(&self, dj: Dj) -> BoxFuture<Result<bool, FestivalError>> {
        update_dj(dj, &self.pool).boxed()
    }

    fn delete_dj(&self, id: &str) -> BoxFuture<Result<bool, FestivalError>> {
        execute_by_key(include_str!("queries/delete_dj.sql"), id.to_owned(), &self.pool).boxed()
    }

    fn retrieve_dj(&self, id: &str) -> BoxFuture<Result<Option<Dj>, FestivalError>> {
        fetch_optional(include_str!("queries/retrieve_dj.sql"), id.to_owned(), &self.pool).boxed()
    }

    fn retrieve_dj_by_email(&self, email: &str) -> BoxFuture<Result<Option<Dj>, FestivalError>> {
        fetch_optional(
            include_str!("queries/retrieve_dj_by_email.sql"),
            email.to_owned(),
            &self.pool,
        )
        .boxed()
    }

    fn retrieve_djs(&self) -> BoxFuture<Result<Vec<Dj>, FestivalError>> {
        let pool = &self.pool;

        async move {
            let djs = sqlx::query_as(include_str!("queries/retrieve_djs.sql"))
                .fetch_all(pool)
                .await?;

            Ok(djs)
        }
        .boxed()
    }

    fn retrieve_djs_by_genre(&self, genre: &str) -> BoxFuture<Result<Vec<Dj>, FestivalError>> {
        fetch_all(
            include_str!("queries/retrieve_djs_by_genre.sql"),
            genre.to_owned(),
            &self.pool,
        )
        .boxed()
    }

    fn retrieve_djs_by_name(&self, name: &str) -> BoxFuture<Result<Vec<Dj>, FestivalError>> {
        fetch_all(
            include_str!("queries/retrieve_djs_by_name.sql"),
            name.to_owned(),
            &self.pool,
        )
        .boxed()
    }

    fn count_djs(&self) -> BoxFuture<Result<u64, FestivalError>> {
        count(include_str!("queries/count_djs.sql"), &self.pool).boxed()
    }

    fn insert_performance(
        &self,
        performance: Performance,
    ) -> BoxFuture<Result<Performance, FestivalError>> {
        insert_performance(performance, &self.pool).boxed()
    }

    fn update_performance(&self, performance: Performance) -> BoxFuture<Result<bool, FestivalError>> {
        update_performance(performance, &self.pool).boxed()
    }

    fn delete_performance(&self, id: &str) -> BoxFuture<Result<bool, FestivalError>> {
        execute_by_key(
            include_str!("queries/delete_performance.sql"),
            id.to_owned(),
            &self.pool,
        )
        .boxed()
    }

    fn retrieve_performance(
        &self,
        id: &str,
    ) -> BoxFuture<Result<Option<Performance>, FestivalError>> {
        fetch_optional(
            include_str!("queries/retrieve_performance.sql"),
            id.to_owned(),
            &self.pool,
        )
        .boxed()
    }

    fn retrieve_performances(&self) -> BoxFuture<Result<Vec<Performance>, FestivalError>> {
        let pool = &self.pool;

        async move {
            let performances = sqlx::query_as(include_str!("queries/retrieve_performances.sql"))
                .fetch_all(pool)
                .await?;

            Ok(performances)
        }
        .boxed()
    }

    fn retrieve_performances_by_dj(
        &self,
        dj_id: &str,
    ) -> BoxFuture<Result<Vec<Performance>, FestivalError>> {
        fetch_all(
            include_str!("queries/retrieve_performances_by_dj.sql"),
            dj_id.to_owned(),
            &self.pool,
        )
        .boxed()
    }

    fn count_performances(&self) -> BoxFuture<Result<u64, FestivalError>> {
        count(include_str!("queries/count_performances.sql"), &self.pool).boxed()
    }
}

/// Review storage backed by the `reviews` table, which keeps each review
/// as a JSONB document.
pub struct PgReviewDb {
    pool: PgPool,
}

impl PgReviewDb {
    pub fn new(pool: PgPool) -> Self {
        PgReviewDb { pool }
    }
}

impl super::ReviewDb for PgReviewDb {
    fn insert(&self, review: Review) -> BoxFuture<Result<Review, FestivalError>> {
        let pool = &self.pool;

        async move {
            sqlx::query(include_str!("queries/insert_review.sql"))
                .bind(review.id())
                .bind(Json(&review))
                .execute(pool)
                .await?;

            Ok(review)
        }
        .boxed()
    }

    fn update(&self, review: Review) -> BoxFuture<Result<bool, FestivalError>> {
        let pool = &self.pool;

        async move {
            let result = sqlx::query(include_str!("queries/update_review.sql"))
                .bind(review.id())
                .bind(Json(&review))
                .execute(pool)
                .await?;

            Ok(result.rows_affected() > 0)
        }
        .boxed()
    }

    fn delete(&self, id: &str) -> BoxFuture<Result<bool, FestivalError>> {
        execute_by_key(include_str!("queries/delete_review.sql"), id.to_owned(), &self.pool).boxed()
    }

    fn retrieve(&self, id: &str) -> BoxFuture<Result<Option<Review>, FestivalError>> {
        let id = id.to_owned();
        let pool = &self.pool;

        async move {
            let document: Option<(Json<Review>,)> =
                sqlx::query_as(include_str!("queries/retrieve_review.sql"))
                    .bind(&id)
                    .fetch_optional(pool)
                    .await?;

            Ok(document.map(|(Json(review),)| review))
        }
        .boxed()
    }

    fn retrieve_all(&self) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        let pool = &self.pool;

        async move {
            let documents: Vec<(Json<Review>,)> =
                sqlx::query_as(include_str!("queries/retrieve_reviews.sql"))
                    .fetch_all(pool)
                    .await?;

            Ok(unwrap_documents(documents))
        }
        .boxed()
    }

    fn retrieve_by_subject(&self, subject: &Subject) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        let subject = subject.clone();
        let pool = &self.pool;

        async move {
            let documents: Vec<(Json<Review>,)> =
                sqlx::query_as(include_str!("queries/retrieve_reviews_by_subject.sql"))
                    .bind(&subject.id)
                    .bind(subject.subject_type.as_str())
                    .fetch_all(pool)
                    .await?;

            Ok(unwrap_documents(documents))
        }
        .boxed()
    }

    fn retrieve_by_subject_type(
        &self,
        subject_type: SubjectType,
    ) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        retrieve_reviews(
            include_str!("queries/retrieve_reviews_by_subject_type.sql"),
            subject_type.as_str().to_owned(),
            &self.pool,
        )
        .boxed()
    }

    fn retrieve_by_reviewer(&self, reviewer_name: &str) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        retrieve_reviews(
            include_str!("queries/retrieve_reviews_by_reviewer.sql"),
            reviewer_name.to_owned(),
            &self.pool,
        )
        .boxed()
    }

    fn retrieve_by_rating(&self, rating: i64) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        retrieve_reviews(
            include_str!("queries/retrieve_reviews_by_rating.sql"),
            rating,
            &self.pool,
        )
        .boxed()
    }

    fn retrieve_by_minimum_rating(&self, rating: i64) -> BoxFuture<Result<Vec<Review>, FestivalError>> {
        retrieve_reviews(
            include_str!("queries/retrieve_reviews_by_minimum_rating.sql"),
            rating,
            &self.pool,
        )
        .boxed()
    }

    fn count(&self) -> BoxFuture<Result<u64, FestivalError>> {
        count(include_str!("queries/count_reviews.sql"), &self.pool).boxed()
    }
}

async fn insert_dj(dj: Dj, pool: &PgPool) -> Result<Dj, FestivalError> {
    sqlx::query(include_str!("queries/insert_dj.sql"))
        .bind(&dj.id)
        .bind(&dj.name)
        .bind(&dj.genre)
        .bind(&dj.email)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error(e, &dj.email))?;

    Ok(dj)
}

async fn update_dj(dj: Dj, pool: &PgPool) -> Result<bool, FestivalError> {
    let result = sqlx::query(include_str!("queries/update_dj.sql"))
        .bind(&dj.id)
        .bind(&dj.name)
        .bind(&dj.genre)
        .bind(&dj.email)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error(e, &dj.email))?;

    Ok(result.rows_affected() > 0)
}

async fn insert_performance(
    performance: Performance,
    pool: &PgPool,
) -> Result<Performance, FestivalError> {
    sqlx::query(include_str!("queries/insert_performance.sql"))
        .bind(&performance.id)
        .bind(&performance.title)
        .bind(&performance.description)
        .bind(performance.start_time)
        .bind(performance.end_time)
        .bind(&performance.dj_id)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error(e, &performance.dj_id))?;

    Ok(performance)
}

async fn update_performance(performance: Performance, pool: &PgPool) -> Result<bool, FestivalError> {
    let result = sqlx::query(include_str!("queries/update_performance.sql"))
        .bind(&performance.id)
        .bind(&performance.title)
        .bind(&performance.description)
        .bind(performance.start_time)
        .bind(performance.end_time)
        .bind(&performance.dj_id)
        .execute(pool)
        .await
        .map_err(|e| match map_sqlx_error(e, &performance.dj_id) {
            FestivalError::PerformanceDjMissing(id) => FestivalError::UpdatedPerformanceDjMissing(id),
            e => e,
        })?;

    Ok(result.rows_affected() > 0)
}

async fn execute_by_key(query: &'static str, key: String, pool: &PgPool) -> Result<bool, FestivalError> {
    let result = sqlx::query(query).bind(&key).execute(pool).await?;

    Ok(result.rows_affected() > 0)
}

async fn fetch_optional<T>(query: &'static str, key: String, pool: &PgPool) -> Result<Option<T>, FestivalError>
where
    T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    let row = sqlx::query_as(query).bind(&key).fetch_optional(pool).await?;

    Ok(row)
}

async fn fetch_all<T>(query: &'static str, key: String, pool: &PgPool) -> Result<Vec<T>, FestivalError>
where
    T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    let rows = sqlx::query_as(query).bind(&key).fetch_all(pool).await?;

    Ok(rows)
}

async fn retrieve_reviews<K>(query: &'static str, key: K, pool: &PgPool) -> Result<Vec<Review>, FestivalError>
where
    K: for<'q> sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send + 'static,
{
    let documents: Vec<(Json<Review>,)> = sqlx::query_as(query).bind(key).fetch_all(pool).await?;

    Ok(unwrap_documents(documents))
}

async fn count(query: &'static str, pool: &PgPool) -> Result<u64, FestivalError> {
    let (count,): (i64,) = sqlx::query_as(query).fetch_one(pool).await?;

    Ok(u64::try_from(count).unwrap_or_default())
}

fn unwrap_documents(documents: Vec<(Json<Review>,)>) -> Vec<Review> {
    documents.into_iter().map(|(Json(review),)| review).collect()
}

/// Translates constraint violations into the matching business errors.
/// `value` is the offending email address or DJ ID.
fn map_sqlx_error(e: sqlx::Error, value: &str) -> FestivalError {
    if let sqlx::Error::Database(ref database_error) = e {
        match database_error.constraint() {
            Some(EMAIL_CONSTRAINT) => return FestivalError::EmailAlreadyExists(value.to_owned()),
            Some(PERFORMANCE_DJ_CONSTRAINT) => {
                return FestivalError::PerformanceDjMissing(value.to_owned())
            }
            _ => {}
        }
    }

    FestivalError::Sqlx { source: e }
}

#[cfg(test)]
mod tests {
    use std::sync::Once;

    use parking_lot::{const_mutex, Mutex};
    use time::macros::datetime;
    use uuid::Uuid;

    use super::*;
    use crate::config::{get_optional_variable, is_enabled};
    use crate::db::{CatalogDb, ReviewDb};
    use crate::dj::DjDraft;
    use crate::performance::PerformanceDraft;
    use crate::review::ReviewDraft;

    const CATALOG_CONNECTION_STRING: &str = "FESTIVAL_CATALOG_DB_CONNECTION_STRING";
    const REVIEWS_CONNECTION_STRING: &str = "FESTIVAL_REVIEWS_DB_CONNECTION_STRING";

    static CATALOG_MIGRATED: Once = Once::new();
    static REVIEWS_MIGRATED: Once = Once::new();

    // catalog tests compare table counts, so they run one at a time
    static CATALOG: Mutex<()> = const_mutex(());

    /// Connects to the database named by `variable`, applying migrations
    /// first when `FESTIVAL_TEST_INITIALIZE_DB` is `1`. Returns `None`
    /// when no database is configured.
    async fn connect(variable: &str, migrations: &'static str, once: &'static Once) -> Option<PgPool> {
        let connection_string = get_optional_variable(variable)?;

        if is_enabled("FESTIVAL_TEST_INITIALIZE_DB") {
            let connection_string = connection_string.clone();

            tokio::task::spawn_blocking(move || {
                once.call_once(|| initialize_db_for_test(&connection_string, migrations))
            })
            .await
            .expect("must spawn blocking task");
        }

        Some(
            PgPool::connect(&connection_string)
                .await
                .unwrap_or_else(|_| panic!("create PgPool from {}", variable)),
        )
    }

    fn initialize_db_for_test(connection_string: &str, migrations: &str) {
        use movine::Movine;
        use postgres::{Client, NoTls};

        let client = Client::connect(connection_string, NoTls).expect("create postgres::Client");
        let mut movine = Movine::new(client);
        movine.set_migration_dir(migrations);

        if movine.status().is_err() {
            movine.initialize().expect("initialize movine");
        }

        movine.up().expect("run movine migrations");
    }

    async fn catalog_db() -> Option<PgCatalogDb> {
        connect(CATALOG_CONNECTION_STRING, "./migrations/catalog", &CATALOG_MIGRATED)
            .await
            .map(PgCatalogDb::new)
    }

    async fn review_db() -> Option<PgReviewDb> {
        connect(REVIEWS_CONNECTION_STRING, "./migrations/reviews", &REVIEWS_MIGRATED)
            .await
            .map(PgReviewDb::new)
    }

    fn unique(prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4())
    }

    fn dj(email: &str) -> Dj {
        Dj::create(DjDraft {
            name: "Carl Cox".to_owned(),
            genre: unique("Techno"),
            email: email.to_owned(),
        })
    }

    fn performance(dj_id: &str) -> Performance {
        Performance::create(PerformanceDraft {
            title: "Techno Underground".to_owned(),
            description: Some("Deep underground techno experience".to_owned()),
            start_time: datetime!(2025-07-16 22:00),
            end_time: datetime!(2025-07-17 01:00),
            dj_id: dj_id.to_owned(),
        })
        .expect("create performance")
    }

    fn review(subject: Subject, reviewer_name: &str, rating: u8) -> Review {
        Review::create(ReviewDraft {
            subject,
            reviewer_name: reviewer_name.to_owned(),
            rating,
            comment: None,
        })
    }

    #[tokio::test]
    async fn duplicate_emails_are_reported() {
        let db = match catalog_db().await {
            Some(db) => db,
            None => return,
        };
        let _catalog = CATALOG.lock();

        let email = format!("{}@festival.com", unique("cox"));
        db.insert_dj(dj(&email)).await.expect("insert first DJ");

        match db.insert_dj(dj(&email)).await {
            Err(FestivalError::EmailAlreadyExists(e)) => assert_eq!(e, email),
            other => panic!("expected EmailAlreadyExists, got {:?}", other),
        }

        let other = db
            .insert_dj(dj(&format!("{}@festival.com", unique("shadow"))))
            .await
            .expect("insert second DJ");
        let taken = Dj {
            email: email.clone(),
            ..other
        };

        match db.update_dj(taken).await {
            Err(FestivalError::EmailAlreadyExists(e)) => assert_eq!(e, email),
            other => panic!("expected EmailAlreadyExists, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn performances_must_reference_a_stored_dj() {
        let db = match catalog_db().await {
            Some(db) => db,
            None => return,
        };
        let _catalog = CATALOG.lock();

        let missing = unique("ghost");
        match db.insert_performance(performance(&missing)).await {
            Err(FestivalError::PerformanceDjMissing(id)) => assert_eq!(id, missing),
            other => panic!("expected PerformanceDjMissing, got {:?}", other),
        }

        let cox = db
            .insert_dj(dj(&format!("{}@festival.com", unique("cox"))))
            .await
            .expect("insert DJ");
        let set = db
            .insert_performance(performance(cox.id()))
            .await
            .expect("insert performance");
        let moved = Performance {
            dj_id: missing.clone(),
            ..set.clone()
        };

        match db.update_performance(moved).await {
            Err(FestivalError::UpdatedPerformanceDjMissing(id)) => assert_eq!(id, missing),
            other => panic!("expected UpdatedPerformanceDjMissing, got {:?}", other),
        }

        let stored = db
            .retrieve_performance(set.id())
            .await
            .expect("retrieve performance")
            .expect("performance still stored");
        assert_eq!(stored.dj_id(), cox.id());
        assert_eq!(stored.start_time(), set.start_time());
        assert_eq!(stored.end_time(), set.end_time());
    }

    #[tokio::test]
    async fn deleting_a_dj_cascades_to_their_performances() {
        let db = match catalog_db().await {
            Some(db) => db,
            None => return,
        };
        let _catalog = CATALOG.lock();

        let cox = db
            .insert_dj(dj(&format!("{}@festival.com", unique("cox"))))
            .await
            .expect("insert DJ");
        db.insert_performance(performance(cox.id())).await.expect("insert first set");
        db.insert_performance(performance(cox.id())).await.expect("insert second set");

        let djs = db.count_djs().await.expect("count DJs");
        let performances = db.count_performances().await.expect("count performances");

        assert!(!db.delete_dj(&unique("ghost")).await.expect("delete missing DJ"));
        assert!(!db
            .delete_performance(&unique("ghost"))
            .await
            .expect("delete missing performance"));
        assert_eq!(db.count_djs().await.expect("count DJs"), djs);
        assert_eq!(db.count_performances().await.expect("count performances"), performances);

        assert!(db.delete_dj(cox.id()).await.expect("delete DJ"));
        assert!(db
            .retrieve_performances_by_dj(cox.id())
            .await
            .expect("retrieve performances")
            .is_empty());
        assert_eq!(db.count_djs().await.expect("count DJs"), djs - 1);
        assert_eq!(db.count_performances().await.expect("count performances"), performances - 2);
    }

    #[tokio::test]
    async fn reviews_are_filtered_inside_their_documents() {
        let db = match review_db().await {
            Some(db) => db,
            None => return,
        };

        let reviewer = unique("Alice");
        let dj = Subject::new(unique("dj"), SubjectType::Dj);
        let set = Subject::new(unique("performance"), SubjectType::Performance);

        let first = db.insert(review(dj.clone(), &reviewer, 5)).await.expect("insert review");
        db.insert(review(dj.clone(), &reviewer, 2)).await.expect("insert review");
        db.insert(review(set.clone(), &reviewer, 4)).await.expect("insert review");

        let stored = db
            .retrieve(first.id())
            .await
            .expect("retrieve review")
            .expect("review stored");
        assert_eq!(stored.subject(), dj);
        assert_eq!(stored.rating(), 5);

        let about = db.retrieve_by_subject(&dj).await.expect("retrieve by subject");
        assert_eq!(about.len(), 2);

        let by_reviewer = db.retrieve_by_reviewer(&reviewer).await.expect("retrieve by reviewer");
        assert_eq!(by_reviewer.len(), 3);

        let of_type = db
            .retrieve_by_subject_type(SubjectType::Performance)
            .await
            .expect("retrieve by type");
        assert!(of_type.iter().any(|r| r.is_about(&set)));
        assert!(of_type.iter().all(|r| r.subject().subject_type == SubjectType::Performance));

        let exact = db.retrieve_by_rating(2).await.expect("retrieve by rating");
        assert!(exact.iter().any(|r| r.is_about(&dj)));
        assert!(exact.iter().all(|r| r.rating() == 2));

        let at_least = db.retrieve_by_minimum_rating(4).await.expect("retrieve by minimum rating");
        assert!(at_least.iter().all(|r| r.rating() >= 4));
        assert_eq!(at_least.iter().filter(|r| r.reviewer_name() == reviewer).count(), 2);

        let changed = Review {
            rating: 1,
            ..stored
        };
        assert!(db.update(changed).await.expect("update review"));
        assert_eq!(
            db.retrieve(first.id()).await.expect("retrieve review").map(|r| r.rating()),
            Some(1)
        );

        assert!(db.delete(first.id()).await.expect("delete review"));
        assert!(!db.delete(first.id()).await.expect("delete review again"));
        assert_eq!(db.retrieve_by_subject(&dj).await.expect("retrieve by subject").len(), 1);
    }
}
