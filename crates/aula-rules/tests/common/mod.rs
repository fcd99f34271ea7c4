//! Shared fixtures for the aula-rules integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};

use aula_core::entities::{
    Career, CourseEnrollment, CourseOffering, ExamBoard, PlanSubject, Student, StudyPlan, Subject,
    Teacher,
};
use aula_core::enums::{BoardEnrollmentStatus, GradeStatus};
use aula_core::identity::SessionIdentity;
use aula_core::outcomes::GradeEdit;
use aula_db::service::AulaService;
use aula_rules::{LogNotifier, Registrar};

pub async fn test_service() -> Arc<AulaService> {
    Arc::new(AulaService::new_local(":memory:").await.unwrap())
}

/// Plan "Engineering 2026" with Calculus I (year 1, term 1) and Calculus II
/// (year 1, term 2), a career on it, and one student.
pub struct Campus {
    pub svc: Arc<AulaService>,
    pub plan: StudyPlan,
    pub calculus_1: Subject,
    pub calculus_2: Subject,
    pub calc1_placement: PlanSubject,
    pub calc2_placement: PlanSubject,
    pub career: Career,
    pub student: Student,
}

impl Campus {
    pub async fn seed() -> Self {
        let svc = test_service().await;
        let plan = svc.create_plan("Engineering 2026", 2026, 5).await.unwrap();
        let calculus_1 = svc.create_subject("MAT-101", "Calculus I").await.unwrap();
        let calculus_2 = svc.create_subject("MAT-102", "Calculus II").await.unwrap();
        let calc1_placement = svc
            .add_plan_subject(&plan.id, &calculus_1.id, 1, 1)
            .await
            .unwrap();
        let calc2_placement = svc
            .add_plan_subject(&plan.id, &calculus_2.id, 1, 2)
            .await
            .unwrap();
        let career = svc
            .create_career("Civil Engineering", "Engineering", &plan.id)
            .await
            .unwrap();
        let student = svc.create_student("Sofia", &career.id).await.unwrap();
        Self {
            svc,
            plan,
            calculus_1,
            calculus_2,
            calc1_placement,
            calc2_placement,
            career,
            student,
        }
    }

    /// Registrar acting as `identity`.
    pub fn registrar(&self, identity: SessionIdentity) -> Registrar<AulaService, SessionIdentity> {
        Registrar::new(Arc::clone(&self.svc), identity, Arc::new(LogNotifier))
    }

    pub fn as_student(&self) -> Registrar<AulaService, SessionIdentity> {
        self.registrar(SessionIdentity::student(&self.student.id))
    }

    pub fn as_teacher(&self, teacher: &Teacher) -> Registrar<AulaService, SessionIdentity> {
        self.registrar(SessionIdentity::teacher(&teacher.id))
    }

    /// A teacher assigned to the placement's subject and an offering taught by them.
    pub async fn offering(&self, placement: &PlanSubject) -> (Teacher, CourseOffering) {
        let teacher = self.svc.create_teacher("Prof. Rivas").await.unwrap();
        self.svc
            .create_assignment(&teacher.id, &placement.subject_id)
            .await
            .unwrap();
        let offering = self
            .svc
            .create_offering(&placement.id, &teacher.id, 2026, 1)
            .await
            .unwrap();
        (teacher, offering)
    }

    /// `count` fresh students of the career enrolled in `offering`.
    pub async fn enroll_students(
        &self,
        offering: &CourseOffering,
        count: usize,
    ) -> Vec<CourseEnrollment> {
        let mut enrollments = Vec::with_capacity(count);
        for i in 0..count {
            let student = self
                .svc
                .create_student(&format!("Student {i}"), &self.career.id)
                .await
                .unwrap();
            enrollments.push(
                self.svc
                    .enroll_in_offering(&student.id, &offering.id)
                    .await
                    .unwrap(),
            );
        }
        enrollments
    }

    /// Give `student` a published course grade in the placement's subject.
    pub async fn grade_course(
        &self,
        student: &Student,
        placement: &PlanSubject,
        status: GradeStatus,
    ) {
        let (_, offering) = self.offering(placement).await;
        let enrollment = self
            .svc
            .enroll_in_offering(&student.id, &offering.id)
            .await
            .unwrap();
        self.svc
            .write_grades(&offering.id, &[GradeEdit::new(enrollment.id, status)])
            .await
            .unwrap();
        assert!(self.svc.mark_published(&offering.id, Utc::now()).await.unwrap());
    }

    /// A board of `subject` taking place `days` from now.
    pub async fn board(&self, subject: &Subject, days: i64) -> ExamBoard {
        self.svc
            .create_exam_board(&subject.id, Utc::now() + Duration::days(days))
            .await
            .unwrap()
    }

    /// Give `student` an approved final in `subject`.
    pub async fn approve_final(&self, student: &Student, subject: &Subject) {
        let board = self.board(subject, 3).await;
        let registration = self
            .svc
            .register_for_board(&student.id, &board.id)
            .await
            .unwrap();
        self.svc
            .record_board_result(&registration.id, BoardEnrollmentStatus::Approved)
            .await
            .unwrap();
    }
}
