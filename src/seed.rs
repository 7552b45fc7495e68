//! Sample line-up for demos and local development.

use log::info;
use time::macros::time;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};

use crate::catalog::Catalog;
use crate::dj::DjPayload;
use crate::errors::FestivalError;
use crate::performance::PerformancePayload;

/// Days between today and the first sample performance.
const LEAD_DAYS: i64 = 30;

struct SampleDj {
    name: &'static str,
    genre: &'static str,
    email: &'static str,
    title: &'static str,
    description: &'static str,
    /// Start and end, as (days after the first night, local time).
    start: (i64, Time),
    end: (i64, Time),
}

const LINE_UP: &[SampleDj] = &[
    SampleDj {
        name: "DJ Shadow",
        genre: "Hip Hop",
        email: "djshadow@festival.com",
        title: "Summer Vibes Hip Hop Set",
        description: "An amazing hip hop set with classic and modern beats",
        start: (0, time!(20:00)),
        end: (0, time!(22:00)),
    },
    SampleDj {
        name: "Armin van Buuren",
        genre: "Trance",
        email: "armin@festival.com",
        title: "Trance State of Mind",
        description: "Uplifting trance journey through the night",
        start: (1, time!(21:00)),
        end: (1, time!(23:30)),
    },
    SampleDj {
        name: "Carl Cox",
        genre: "Techno",
        email: "carlcox@festival.com",
        title: "Techno Underground",
        description: "Deep underground techno experience",
        start: (2, time!(22:00)),
        end: (3, time!(1:00)),
    },
];

/// Fills an empty catalog with three DJs and one performance each, the
/// first a month from today. Returns whether anything was added.
pub async fn seed_sample_data(catalog: &Catalog) -> Result<bool, FestivalError> {
    let today = OffsetDateTime::now_utc().date();

    seed_from(catalog, today + Duration::days(LEAD_DAYS)).await
}

async fn seed_from(catalog: &Catalog, first_night: Date) -> Result<bool, FestivalError> {
    if catalog.count_djs().await? > 0 {
        return Ok(false);
    }

    let at = |(days, time): (i64, Time)| PrimitiveDateTime::new(first_night + Duration::days(days), time);

    for sample in LINE_UP {
        let dj = catalog
            .create_dj(DjPayload {
                id: None,
                name: Some(sample.name.to_owned()),
                genre: Some(sample.genre.to_owned()),
                email: Some(sample.email.to_owned()),
            })
            .await?;

        catalog
            .create_performance(PerformancePayload {
                id: None,
                title: Some(sample.title.to_owned()),
                description: Some(sample.description.to_owned()),
                start_time: Some(at(sample.start)),
                end_time: Some(at(sample.end)),
                dj_id: Some(dj.id().to_owned()),
            })
            .await?;
    }

    info!(catalog.logger(), "Seeded sample data"; "djs" => catalog.count_djs().await?, "performances" => catalog.count_performances().await?);

    Ok(true)
}
