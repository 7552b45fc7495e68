use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::datetime;
use crate::errors::FestivalError;
use crate::validation::{non_blank, ValidationErrors};

/// A scheduled set by a DJ. Holds only the DJ's ID; the DJ record itself
/// lives in the DJ store.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, sqlx::FromRow)]
#[serde(into = "PerformanceView")]
pub struct Performance {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) dj_id: String,
}

impl Performance {
    /// Creates a performance with a fresh ID from validated input. The
    /// caller is responsible for checking that the DJ exists.
    pub fn create(draft: PerformanceDraft) -> Result<Self, FestivalError> {
        let PerformanceDraft {
            title,
            description,
            start_time,
            end_time,
            dj_id,
        } = draft;

        check_timing(&start_time, &end_time)?;

        Ok(Performance {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            start_time,
            end_time,
            dj_id,
        })
    }

    /// Returns a copy with the editable fields replaced, keeping the ID.
    pub fn updated(&self, draft: PerformanceDraft) -> Result<Self, FestivalError> {
        let PerformanceDraft {
            title,
            description,
            start_time,
            end_time,
            dj_id,
        } = draft;

        check_timing(&start_time, &end_time)?;

        Ok(Performance {
            id: self.id.clone(),
            title,
            description,
            start_time,
            end_time,
            dj_id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn dj_id(&self) -> &str {
        &self.dj_id
    }

    pub fn start_time(&self) -> PrimitiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> PrimitiveDateTime {
        self.end_time
    }

    /// The length of the set in whole hours, rounded down.
    pub fn duration_in_hours(&self) -> i64 {
        (self.end_time - self.start_time).whole_hours()
    }
}

/// Rejects performances that end before, or at the same moment as, they
/// start.
pub fn check_timing(start: &PrimitiveDateTime, end: &PrimitiveDateTime) -> Result<(), FestivalError> {
    if start > end {
        return Err(FestivalError::StartAfterEnd {
            start: datetime::format(start),
            end: datetime::format(end),
        });
    }

    if start == end {
        return Err(FestivalError::ZeroDuration);
    }

    Ok(())
}

/// The wire representation of a performance, including derived fields.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PerformanceView {
    id: String,
    title: String,
    description: Option<String>,
    #[serde(serialize_with = "datetime::serialize")]
    start_time: PrimitiveDateTime,
    #[serde(serialize_with = "datetime::serialize")]
    end_time: PrimitiveDateTime,
    dj_id: String,
    duration_in_hours: i64,
}

impl From<Performance> for PerformanceView {
    fn from(performance: Performance) -> Self {
        let duration_in_hours = performance.duration_in_hours();
        let Performance {
            id,
            title,
            description,
            start_time,
            end_time,
            dj_id,
        } = performance;

        PerformanceView {
            id,
            title,
            description,
            start_time,
            end_time,
            dj_id,
            duration_in_hours,
        }
    }
}

/// A performance as submitted by a client.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePayload {
    /// Ignored on input; IDs are assigned by the service.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    pub start_time: Option<PrimitiveDateTime>,

    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    pub end_time: Option<PrimitiveDateTime>,

    #[serde(default)]
    pub dj_id: Option<String>,
}

/// The validated, editable fields of a performance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PerformanceDraft {
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) dj_id: String,
}

impl PerformanceDraft {
    pub fn dj_id(&self) -> &str {
        &self.dj_id
    }
}

impl PerformancePayload {
    /// Checks field presence. Timing is checked when the draft is applied
    /// so that it's enforced on every create and update.
    pub fn validate(self) -> Result<PerformanceDraft, FestivalError> {
        let mut errors = ValidationErrors::new();

        if non_blank(&self.title).is_none() {
            errors.add("title", "Title must not be blank");
        }

        if self.start_time.is_none() {
            errors.add("startTime", "Start time must not be null");
        }

        if self.end_time.is_none() {
            errors.add("endTime", "End time must not be null");
        }

        if non_blank(&self.dj_id).is_none() {
            errors.add("djId", "DJ ID must not be blank");
        }

        match (self.start_time, self.end_time) {
            (Some(start_time), Some(end_time)) if errors.is_empty() => Ok(PerformanceDraft {
                title: self.title.unwrap_or_default(),
                description: self.description,
                start_time,
                end_time,
                dj_id: self.dj_id.unwrap_or_default(),
            }),
            _ => Err(FestivalError::ValidationFailed(errors)),
        }
    }
}
