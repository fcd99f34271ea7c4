//! Study plan repository: plans, subject placements, and the plan-scoped
//! prerequisite graph.

use aula_core::entities::{PlanSubject, PrerequisiteEdge, StudyPlan, Subject};
use aula_core::enums::{EntityType, PrerequisiteKind};
use aula_core::ids::{PREFIX_PLAN, PREFIX_PLAN_SUBJECT, PREFIX_PREREQUISITE};

use crate::error::DatabaseError;
use crate::helpers::{fmt_datetime, get_int, now, parse_datetime, parse_enum};
use crate::repos::catalog::row_to_subject;
use crate::service::AulaService;

const PLAN_COLS: &str = "id, name, creation_year, duration_years, created_at";
const PLACEMENT_COLS: &str = "id, plan_id, subject_id, year_in_plan, term_in_plan";
const EDGE_COLS: &str = "id, plan_id, subject_id, required_subject_id, kind, created_at";

const DEPENDENT_EDGES_SQL: &str = "SELECT COUNT(*) FROM prerequisites p
     JOIN plan_subjects ps ON ps.plan_id = p.plan_id AND ps.subject_id = p.required_subject_id
     WHERE ps.id = ?1";

fn row_to_plan(row: &libsql::Row) -> Result<StudyPlan, DatabaseError> {
    Ok(StudyPlan {
        id: row.get(0)?,
        name: row.get(1)?,
        creation_year: get_int(row, 2)?,
        duration_years: get_int(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

pub(crate) fn row_to_placement(row: &libsql::Row) -> Result<PlanSubject, DatabaseError> {
    Ok(PlanSubject {
        id: row.get(0)?,
        plan_id: row.get(1)?,
        subject_id: row.get(2)?,
        year_in_plan: get_int(row, 3)?,
        term_in_plan: get_int(row, 4)?,
    })
}

fn row_to_edge(row: &libsql::Row) -> Result<PrerequisiteEdge, DatabaseError> {
    Ok(PrerequisiteEdge {
        id: row.get(0)?,
        plan_id: row.get(1)?,
        subject_id: row.get(2)?,
        required_subject_id: row.get(3)?,
        kind: parse_enum(&row.get::<String>(4)?)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl AulaService {
    // -----------------------------------------------------------------------
    // Plans
    // -----------------------------------------------------------------------

    pub async fn create_plan(
        &self,
        name: &str,
        creation_year: u16,
        duration_years: u8,
    ) -> Result<StudyPlan, DatabaseError> {
        let created_at = now();
        let id = self.db().generate_id(PREFIX_PLAN).await?;

        self.db()
            .execute_with(
                &format!("INSERT INTO study_plans ({PLAN_COLS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
                || {
                    libsql::params![
                        id.as_str(),
                        name,
                        i64::from(creation_year),
                        i64::from(duration_years),
                        fmt_datetime(created_at)
                    ]
                },
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, "study plan", None, None))?;

        Ok(StudyPlan {
            id,
            name: name.to_string(),
            creation_year,
            duration_years,
            created_at,
        })
    }

    pub async fn get_plan(&self, id: &str) -> Result<StudyPlan, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {PLAN_COLS} FROM study_plans WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_plan(&row)
    }

    // -----------------------------------------------------------------------
    // Placements
    // -----------------------------------------------------------------------

    /// Place a subject in a plan at a year and term.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Duplicate` when the plan already contains the subject.
    pub async fn add_plan_subject(
        &self,
        plan_id: &str,
        subject_id: &str,
        year_in_plan: u8,
        term_in_plan: u8,
    ) -> Result<PlanSubject, DatabaseError> {
        let id = self.db().generate_id(PREFIX_PLAN_SUBJECT).await?;

        self.db()
            .execute_with(
                &format!(
                    "INSERT INTO plan_subjects ({PLACEMENT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5)"
                ),
                || {
                    libsql::params![
                        id.as_str(),
                        plan_id,
                        subject_id,
                        i64::from(year_in_plan),
                        i64::from(term_in_plan)
                    ]
                },
            )
            .await
            .map_err(|e| {
                DatabaseError::from_write(
                    e,
                    &format!("placement of {subject_id} in {plan_id}"),
                    None,
                    None,
                )
            })?;

        Ok(PlanSubject {
            id,
            plan_id: plan_id.to_string(),
            subject_id: subject_id.to_string(),
            year_in_plan,
            term_in_plan,
        })
    }

    pub async fn get_plan_subject(&self, id: &str) -> Result<PlanSubject, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {PLACEMENT_COLS} FROM plan_subjects WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_placement(&row)
    }

    /// Placement of `subject_id` within `plan_id`.
    pub async fn find_plan_subject(
        &self,
        plan_id: &str,
        subject_id: &str,
    ) -> Result<PlanSubject, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {PLACEMENT_COLS} FROM plan_subjects
                     WHERE plan_id = ?1 AND subject_id = ?2"
                ),
                || [plan_id, subject_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_placement(&row)
    }

    /// Placements of a plan ordered by year, then term.
    pub async fn list_plan_subjects(
        &self,
        plan_id: &str,
    ) -> Result<Vec<PlanSubject>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {PLACEMENT_COLS} FROM plan_subjects WHERE plan_id = ?1
                     ORDER BY year_in_plan, term_in_plan, id"
                ),
                || [plan_id],
            )
            .await?;
        let mut placements = Vec::new();
        while let Some(row) = rows.next().await? {
            placements.push(row_to_placement(&row)?);
        }
        Ok(placements)
    }

    /// Course enrollments of any status under offerings of the placement.
    pub async fn count_enrollments_for_plan_subject(
        &self,
        plan_subject_id: &str,
    ) -> Result<u32, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                "SELECT COUNT(*) FROM course_enrollments e
                 JOIN course_offerings o ON o.id = e.offering_id
                 WHERE o.plan_subject_id = ?1",
                || [plan_subject_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_int(&row, 0)
    }

    /// Prerequisite edges of the placement's plan that require its subject.
    pub async fn count_prerequisite_dependents(
        &self,
        plan_subject_id: &str,
    ) -> Result<u32, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(DEPENDENT_EDGES_SQL, || [plan_subject_id])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_int(&row, 0)
    }

    /// Delete a placement together with its enrollment-free offerings and
    /// the prerequisite edges it declares.
    ///
    /// Enrollments reference offerings with `ON DELETE RESTRICT`, so a
    /// placement that gained an enrollment after the caller's check fails
    /// here with `DatabaseError::Duplicate`. So does a placement whose
    /// subject another edge of the plan still requires.
    pub async fn delete_plan_subject(&self, id: &str) -> Result<(), DatabaseError> {
        let tx = self.db().begin_write().await?;
        let result: Result<(), DatabaseError> = async {
            let what = format!("placement {id}");
            let mut rows = tx.query(DEPENDENT_EDGES_SQL, [id]).await?;
            let required_by = match rows.next().await? {
                Some(row) => get_int(&row, 0)?,
                None => 0,
            };
            drop(rows);
            if required_by > 0 {
                return Err(DatabaseError::Duplicate(format!(
                    "{what} is required by {required_by} prerequisite edge(s)"
                )));
            }

            tx.execute(
                "DELETE FROM prerequisites
                 WHERE plan_id = (SELECT plan_id FROM plan_subjects WHERE id = ?1)
                   AND subject_id = (SELECT subject_id FROM plan_subjects WHERE id = ?1)",
                [id],
            )
            .await?;
            tx.execute("DELETE FROM course_offerings WHERE plan_subject_id = ?1", [id])
                .await
                .map_err(|e| DatabaseError::from_write(e, &what, None, None))?;
            let deleted = tx
                .execute("DELETE FROM plan_subjects WHERE id = ?1", [id])
                .await
                .map_err(|e| DatabaseError::from_write(e, &what, None, None))?;
            if deleted == 0 {
                return Err(DatabaseError::NotFound {
                    entity_type: EntityType::PlanSubject,
                    id: id.to_string(),
                });
            }
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                tx.commit().await?;
                tracing::info!(plan_subject_id = id, "placement deleted");
                Ok(())
            }
            Err(e) => {
                tx.abandon().await;
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Prerequisite edges
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `DatabaseError::Duplicate` for a repeated edge of the same kind
    /// or a self-referential edge.
    pub async fn create_prerequisite(
        &self,
        plan_id: &str,
        subject_id: &str,
        required_subject_id: &str,
        kind: PrerequisiteKind,
    ) -> Result<PrerequisiteEdge, DatabaseError> {
        let created_at = now();
        let id = self.db().generate_id(PREFIX_PREREQUISITE).await?;

        self.db()
            .execute_with(
                &format!("INSERT INTO prerequisites ({EDGE_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                || {
                    libsql::params![
                        id.as_str(),
                        plan_id,
                        subject_id,
                        required_subject_id,
                        kind.as_str(),
                        fmt_datetime(created_at)
                    ]
                },
            )
            .await
            .map_err(|e| {
                DatabaseError::from_write(
                    e,
                    &format!("{kind} prerequisite {required_subject_id} -> {subject_id}"),
                    None,
                    None,
                )
            })?;

        Ok(PrerequisiteEdge {
            id,
            plan_id: plan_id.to_string(),
            subject_id: subject_id.to_string(),
            required_subject_id: required_subject_id.to_string(),
            kind,
            created_at,
        })
    }

    pub async fn get_prerequisite(&self, id: &str) -> Result<PrerequisiteEdge, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {EDGE_COLS} FROM prerequisites WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_edge(&row)
    }

    pub async fn delete_prerequisite(&self, id: &str) -> Result<(), DatabaseError> {
        let deleted = self
            .db()
            .execute_with("DELETE FROM prerequisites WHERE id = ?1", || [id])
            .await?;
        if deleted == 0 {
            return Err(DatabaseError::NotFound {
                entity_type: EntityType::Prerequisite,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Every edge of a plan, both kinds.
    pub async fn list_prerequisite_edges(
        &self,
        plan_id: &str,
    ) -> Result<Vec<PrerequisiteEdge>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!(
                    "SELECT {EDGE_COLS} FROM prerequisites WHERE plan_id = ?1
                     ORDER BY subject_id, kind, required_subject_id"
                ),
                || [plan_id],
            )
            .await?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next().await? {
            edges.push(row_to_edge(&row)?);
        }
        Ok(edges)
    }

    /// Direct prerequisites of `subject_id` of one kind, ordered by subject code.
    pub async fn list_prerequisites(
        &self,
        plan_id: &str,
        subject_id: &str,
        kind: PrerequisiteKind,
    ) -> Result<Vec<Subject>, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                "SELECT s.id, s.code, s.name, s.created_at
                 FROM prerequisites p
                 JOIN subjects s ON s.id = p.required_subject_id
                 WHERE p.plan_id = ?1 AND p.subject_id = ?2 AND p.kind = ?3
                 ORDER BY s.code",
                || [plan_id, subject_id, kind.as_str()],
            )
            .await?;
        let mut subjects = Vec::new();
        while let Some(row) = rows.next().await? {
            subjects.push(row_to_subject(&row)?);
        }
        Ok(subjects)
    }
}
