//! Grade Lifecycle Manager.
//!
//! Per-offering state machine:
//!
//! ```text
//! ungraded --set--> {approved|failed|absent} --set--> any of the three
//! drafts --save--> saved (durability only)
//! all graded, nothing unsaved --publish--> published (terminal)
//! published --any edit--> ImmutableState
//! ```
//!
//! Edits made with [`GradeLifecycle::set_grade`] are drafts until a batch save
//! writes them. Storage rejects every grade write once the offering is
//! published, so the pre-checks here only give friendlier errors.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use aula_core::entities::{CourseOffering, GradeRecord};
use aula_core::enums::{EntityType, GradeStatus};
use aula_core::errors::{RuleError, StoreError};
use aula_core::outcomes::{GradeEdit, GradeSummary, GradeWriteFailure, PublishReport, SaveReport};
use aula_core::ports::{GradeStore, Notifier};

pub struct GradeLifecycle<'a, S, N> {
    store: &'a S,
    notifier: Option<&'a N>,
}

impl<'a, S: GradeStore> GradeLifecycle<'a, S, crate::notify::LogNotifier> {
    /// A manager that publishes without notifying.
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
            notifier: None,
        }
    }
}

impl<'a, S: GradeStore, N: Notifier> GradeLifecycle<'a, S, N> {
    pub const fn with_notifier(store: &'a S, notifier: &'a N) -> Self {
        Self {
            store,
            notifier: Some(notifier),
        }
    }

    /// # Errors
    ///
    /// `NotFound` when the offering does not exist.
    pub async fn offering(&self, offering_id: &str) -> Result<CourseOffering, RuleError> {
        self.store
            .offering(offering_id)
            .await?
            .ok_or_else(|| RuleError::not_found(EntityType::CourseOffering, offering_id))
    }

    /// Stage an unsaved edit on one record.
    ///
    /// # Errors
    ///
    /// `Validation` for `ungraded`, `NotFound` for an unknown enrollment,
    /// `ImmutableState` once the offering is published.
    pub async fn set_grade(
        &self,
        enrollment_id: &str,
        status: GradeStatus,
    ) -> Result<GradeRecord, RuleError> {
        let record = self
            .store
            .grade_record(enrollment_id)
            .await?
            .ok_or_else(|| RuleError::not_found(EntityType::GradeRecord, enrollment_id))?;
        let offering = self.offering(&record.offering_id).await?;
        if offering.published {
            return Err(RuleError::ImmutableState {
                offering_id: offering.id,
            });
        }
        if !record.status.can_transition_to(status) {
            return Err(RuleError::Validation(format!(
                "grade of {enrollment_id} cannot be set to {status}"
            )));
        }
        let staged = self.store.stage_grade(enrollment_id, status).await?;
        debug!(enrollment_id, %status, "grade drafted");
        Ok(staged)
    }

    /// Validate `edits` and write them with every outstanding draft in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// `InvalidBatch` lists every rejected edit; nothing is written.
    /// `BatchNotCommitted` lists every record of a batch whose commit failed.
    pub async fn save_grades(
        &self,
        offering_id: &str,
        edits: &[GradeEdit],
    ) -> Result<SaveReport, RuleError> {
        let offering = self.offering(offering_id).await?;
        if offering.published {
            return Err(RuleError::ImmutableState {
                offering_id: offering.id,
            });
        }
        let records = self.store.grade_records(offering_id).await?;
        let members: HashSet<&str> = records.iter().map(|r| r.enrollment_id.as_str()).collect();

        let failures: Vec<GradeWriteFailure> = edits
            .iter()
            .filter_map(|edit| {
                let reason = if !members.contains(edit.enrollment_id.as_str()) {
                    "enrollment does not belong to offering"
                } else if !edit.status.is_graded() {
                    "grade cannot be set back to ungraded"
                } else {
                    return None;
                };
                Some(GradeWriteFailure {
                    enrollment_id: edit.enrollment_id.clone(),
                    reason: reason.to_string(),
                })
            })
            .collect();
        if !failures.is_empty() {
            debug!(offering_id, rejected = failures.len(), "grade batch rejected");
            return Err(RuleError::InvalidBatch(failures));
        }

        match self.store.write_grades(offering_id, edits).await {
            Ok(saved) => {
                info!(offering_id, saved = saved.len(), "grades saved");
                Ok(SaveReport {
                    offering_id: offering_id.to_string(),
                    saved,
                })
            }
            Err(StoreError::Immutable { offering_id }) => {
                Err(RuleError::ImmutableState { offering_id })
            }
            Err(e) => {
                warn!(offering_id, error = %e, "grade batch not committed");
                Err(RuleError::BatchNotCommitted {
                    reason: e.to_string(),
                    failures: batch_members(edits, &records)
                        .into_iter()
                        .map(|enrollment_id| GradeWriteFailure {
                            enrollment_id,
                            reason: "not saved".to_string(),
                        })
                        .collect(),
                })
            }
        }
    }

    /// True iff every record is graded and no draft is outstanding. An
    /// offering without enrollments is vacuously publishable.
    ///
    /// # Errors
    ///
    /// `NotFound` or `Storage`.
    pub async fn can_publish(&self, offering_id: &str) -> Result<bool, RuleError> {
        self.offering(offering_id).await?;
        let records = self.store.grade_records(offering_id).await?;
        Ok(ready(&records))
    }

    /// # Errors
    ///
    /// `NotFound` or `Storage`.
    pub async fn summary(&self, offering_id: &str) -> Result<GradeSummary, RuleError> {
        let offering = self.offering(offering_id).await?;
        let records = self.store.grade_records(offering_id).await?;
        Ok(summarize(&offering, &records))
    }

    /// Set the terminal published flag.
    ///
    /// Publishing an already-published offering succeeds without doing
    /// anything, including notifying. A failed notification is logged and
    /// reported as `notified: false`; the publish stands.
    ///
    /// Readiness is checked twice: here for the error message, and again by
    /// the store under its write lock, which is the check that counts.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Validation` when the offering is not ready, or `Storage`.
    pub async fn publish(
        &self,
        offering_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PublishReport, RuleError> {
        let offering = self.offering(offering_id).await?;
        if offering.published {
            debug!(offering_id, "offering already published");
            return Ok(already_published(&offering));
        }

        let records = self.store.grade_records(offering_id).await?;
        if !ready(&records) {
            let summary = summarize(&offering, &records);
            return Err(RuleError::Validation(format!(
                "offering {offering_id} is not ready to publish: {} ungraded, {} unsaved",
                summary.ungraded, summary.unsaved
            )));
        }

        if !self.store.mark_published(offering_id, now).await? {
            // Lost the race to a concurrent publisher.
            let offering = self.offering(offering_id).await?;
            return Ok(already_published(&offering));
        }
        let offering = self.offering(offering_id).await?;
        let records = self.store.grade_records(offering_id).await?;
        info!(offering_id, records = records.len(), "grades published");

        let student_ids: Vec<String> = records.into_iter().map(|r| r.student_id).collect();
        let notified = match self.notifier {
            Some(notifier) => match notifier.grades_published(&offering, &student_ids).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(offering_id, error = %e, "publish notification failed");
                    false
                }
            },
            None => false,
        };

        Ok(PublishReport {
            offering_id: offering.id,
            newly_published: true,
            published_at: offering.published_at,
            notified,
        })
    }
}

fn ready(records: &[GradeRecord]) -> bool {
    records
        .iter()
        .all(|r| r.status.is_graded() && r.draft_status.is_none())
}

fn already_published(offering: &CourseOffering) -> PublishReport {
    PublishReport {
        offering_id: offering.id.clone(),
        newly_published: false,
        published_at: offering.published_at,
        notified: false,
    }
}

/// Enrollment ids a batch save would write: edits first, then drafts.
fn batch_members(edits: &[GradeEdit], records: &[GradeRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    edits
        .iter()
        .map(|e| e.enrollment_id.as_str())
        .chain(
            records
                .iter()
                .filter(|r| r.draft_status.is_some())
                .map(|r| r.enrollment_id.as_str()),
        )
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

fn summarize(offering: &CourseOffering, records: &[GradeRecord]) -> GradeSummary {
    let mut summary = GradeSummary {
        offering_id: offering.id.clone(),
        published: offering.published,
        published_at: offering.published_at,
        ..GradeSummary::default()
    };
    for record in records {
        summary.total += 1;
        match record.status {
            GradeStatus::Ungraded => summary.ungraded += 1,
            GradeStatus::Approved => summary.approved += 1,
            GradeStatus::Failed => summary.failed += 1,
            GradeStatus::Absent => summary.absent += 1,
        }
        if record.draft_status.is_some() {
            summary.unsaved += 1;
        }
    }
    summary.can_publish = ready(records);
    summary
}
