//! Exam board repository: boards, teacher seats, and student registrations.

use aula_core::entities::{BoardEnrollment, ExamBoard};
use aula_core::enums::{BoardEnrollmentStatus, EntityType};
use aula_core::ids::{PREFIX_BOARD_ENROLLMENT, PREFIX_EXAM_BOARD};
use chrono::{DateTime, SubsecRound, Utc};

use crate::error::DatabaseError;
use crate::helpers::{fmt_datetime, get_bool, get_int, now, parse_datetime, parse_enum};
use crate::service::AulaService;

const BOARD_COLS: &str = "id, subject_id, exam_at, cancelled, created_at";
const REGISTRATION_COLS: &str = "id, student_id, board_id, status, created_at";

fn row_to_board(row: &libsql::Row) -> Result<ExamBoard, DatabaseError> {
    Ok(ExamBoard {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        exam_at: parse_datetime(&row.get::<String>(2)?)?,
        cancelled: get_bool(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

fn row_to_registration(row: &libsql::Row) -> Result<BoardEnrollment, DatabaseError> {
    Ok(BoardEnrollment {
        id: row.get(0)?,
        student_id: row.get(1)?,
        board_id: row.get(2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

impl AulaService {
    pub async fn create_exam_board(
        &self,
        subject_id: &str,
        exam_at: DateTime<Utc>,
    ) -> Result<ExamBoard, DatabaseError> {
        let created_at = now();
        let id = self.db().generate_id(PREFIX_EXAM_BOARD).await?;

        self.db()
            .execute_with(
                &format!("INSERT INTO exam_boards ({BOARD_COLS}) VALUES (?1, ?2, ?3, 0, ?4)"),
                || {
                    libsql::params![
                        id.as_str(),
                        subject_id,
                        fmt_datetime(exam_at),
                        fmt_datetime(created_at)
                    ]
                },
            )
            .await
            .map_err(|e| DatabaseError::from_write(e, "exam board", None, None))?;

        Ok(ExamBoard {
            id,
            subject_id: subject_id.to_string(),
            exam_at: exam_at.trunc_subsecs(6),
            cancelled: false,
            created_at,
        })
    }

    pub async fn get_exam_board(&self, id: &str) -> Result<ExamBoard, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {BOARD_COLS} FROM exam_boards WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_board(&row)
    }

    pub async fn cancel_exam_board(&self, id: &str) -> Result<(), DatabaseError> {
        let updated = self
            .db()
            .execute_with("UPDATE exam_boards SET cancelled = 1 WHERE id = ?1", || [id])
            .await?;
        if updated == 0 {
            return Err(DatabaseError::NotFound {
                entity_type: EntityType::ExamBoard,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Seat a teacher on a board (the teacher's exam-board role).
    pub async fn seat_board_teacher(
        &self,
        board_id: &str,
        teacher_id: &str,
    ) -> Result<(), DatabaseError> {
        self.db()
            .execute_with(
                "INSERT INTO exam_board_teachers (board_id, teacher_id) VALUES (?1, ?2)",
                || [board_id, teacher_id],
            )
            .await
            .map_err(|e| {
                let what = format!("seat of {teacher_id} on {board_id}");
                DatabaseError::from_write(e, &what, None, None)
            })?;
        Ok(())
    }

    /// Whether the teacher sits on a non-cancelled board of the subject after `at`.
    pub async fn has_upcoming_board_seat(
        &self,
        teacher_id: &str,
        subject_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                "SELECT COUNT(*) FROM exam_board_teachers t
                 JOIN exam_boards b ON b.id = t.board_id
                 WHERE t.teacher_id = ?1 AND b.subject_id = ?2
                   AND b.cancelled = 0 AND b.exam_at > ?3",
                || libsql::params![teacher_id, subject_id, fmt_datetime(at)],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(get_int::<u32>(&row, 0)? > 0)
    }

    // -----------------------------------------------------------------------
    // Registrations
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `DatabaseError::Duplicate` when the student is already on the board.
    pub async fn register_for_board(
        &self,
        student_id: &str,
        board_id: &str,
    ) -> Result<BoardEnrollment, DatabaseError> {
        let created_at = now();
        let id = self.db().generate_id(PREFIX_BOARD_ENROLLMENT).await?;

        self.db()
            .execute_with(
                &format!(
                    "INSERT INTO board_enrollments ({REGISTRATION_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5)"
                ),
                || {
                    libsql::params![
                        id.as_str(),
                        student_id,
                        board_id,
                        BoardEnrollmentStatus::Registered.as_str(),
                        fmt_datetime(created_at)
                    ]
                },
            )
            .await
            .map_err(|e| {
                DatabaseError::from_write(
                    e,
                    &format!("registration of {student_id} on board {board_id}"),
                    None,
                    None,
                )
            })?;

        tracing::info!(
            board_enrollment_id = %id,
            student_id,
            board_id,
            "exam board registration created"
        );
        Ok(BoardEnrollment {
            id,
            student_id: student_id.to_string(),
            board_id: board_id.to_string(),
            status: BoardEnrollmentStatus::Registered,
            created_at,
        })
    }

    pub async fn get_board_enrollment(&self, id: &str) -> Result<BoardEnrollment, DatabaseError> {
        let mut rows = self
            .db()
            .query_with(
                &format!("SELECT {REGISTRATION_COLS} FROM board_enrollments WHERE id = ?1"),
                || [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_registration(&row)
    }

    /// Record the outcome of a final exam (or a cancellation) on a registration.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` when the registration already
    /// left `registered`.
    pub async fn record_board_result(
        &self,
        id: &str,
        status: BoardEnrollmentStatus,
    ) -> Result<BoardEnrollment, DatabaseError> {
        let current = self.get_board_enrollment(id).await?;
        if !current.status.can_transition_to(status) {
            return Err(DatabaseError::InvalidState(format!(
                "board enrollment {id} cannot move from {} to {status}",
                current.status
            )));
        }
        self.db()
            .execute_with(
                "UPDATE board_enrollments SET status = ?1 WHERE id = ?2 AND status = ?3",
                || [status.as_str(), id, current.status.as_str()],
            )
            .await?;
        Ok(BoardEnrollment { status, ..current })
    }
}

#[cfg(test)]
mod tests {
    use aula_core::enums::BoardEnrollmentStatus;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use crate::error::DatabaseError;
    use crate::helpers::now;
    use crate::test_support::helpers::{seed_curriculum, test_service};

    #[tokio::test]
    async fn board_roundtrip_and_cancel() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let board = svc
            .create_exam_board(&c.calculus_1.id, now() + Duration::days(14))
            .await
            .unwrap();
        assert_eq!(svc.get_exam_board(&board.id).await.unwrap(), board);
        assert!(board.is_open_at(now()));

        svc.cancel_exam_board(&board.id).await.unwrap();
        assert!(!svc.get_exam_board(&board.id).await.unwrap().is_open_at(now()));
    }

    #[tokio::test]
    async fn upcoming_seat_ignores_past_and_cancelled_boards() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let teacher = svc.create_teacher("Prof. Rivas").await.unwrap();
        let subject = &c.calculus_1.id;

        let past = svc.create_exam_board(subject, now() - Duration::days(3)).await.unwrap();
        svc.seat_board_teacher(&past.id, &teacher.id).await.unwrap();
        assert!(!svc.has_upcoming_board_seat(&teacher.id, subject, now()).await.unwrap());

        let future = svc.create_exam_board(subject, now() + Duration::days(3)).await.unwrap();
        svc.seat_board_teacher(&future.id, &teacher.id).await.unwrap();
        assert!(svc.has_upcoming_board_seat(&teacher.id, subject, now()).await.unwrap());
        assert!(!svc
            .has_upcoming_board_seat(&teacher.id, &c.calculus_2.id, now())
            .await
            .unwrap());

        svc.cancel_exam_board(&future.id).await.unwrap();
        assert!(!svc.has_upcoming_board_seat(&teacher.id, subject, now()).await.unwrap());
    }

    #[tokio::test]
    async fn registration_is_unique_and_results_are_terminal() {
        let svc = test_service().await;
        let c = seed_curriculum(&svc).await;
        let board = svc
            .create_exam_board(&c.calculus_1.id, now() + Duration::days(7))
            .await
            .unwrap();

        let reg = svc.register_for_board(&c.student.id, &board.id).await.unwrap();
        let dup = svc.register_for_board(&c.student.id, &board.id).await.unwrap_err();
        assert!(matches!(dup, DatabaseError::Duplicate(_)));

        let approved = svc
            .record_board_result(&reg.id, BoardEnrollmentStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, BoardEnrollmentStatus::Approved);
        assert_eq!(svc.get_board_enrollment(&reg.id).await.unwrap(), approved);

        let err = svc
            .record_board_result(&reg.id, BoardEnrollmentStatus::Failed)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));
    }
}
