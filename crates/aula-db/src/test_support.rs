//! Shared test utilities for aula-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use aula_core::entities::{
        Career, CourseEnrollment, CourseOffering, PlanSubject, Student, StudyPlan, Subject,
        Teacher,
    };

    use crate::AulaDb;
    use crate::service::AulaService;

    /// Create an in-memory `AulaService`.
    pub async fn test_service() -> AulaService {
        let db = AulaDb::open_local(":memory:").await.unwrap();
        AulaService::from_db(db)
    }

    /// A plan with two placed subjects, a career on it, and one student.
    pub struct Curriculum {
        pub plan: StudyPlan,
        pub calculus_1: Subject,
        pub calculus_2: Subject,
        pub calc1_placement: PlanSubject,
        pub calc2_placement: PlanSubject,
        pub career: Career,
        pub student: Student,
    }

    pub async fn seed_curriculum(svc: &AulaService) -> Curriculum {
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
        Curriculum {
            plan,
            calculus_1,
            calculus_2,
            calc1_placement,
            calc2_placement,
            career,
            student,
        }
    }

    /// An assigned teacher and an offering of `placement`.
    pub async fn seed_offering(
        svc: &AulaService,
        placement: &PlanSubject,
    ) -> (Teacher, CourseOffering) {
        let teacher = svc.create_teacher("Prof. Rivas").await.unwrap();
        svc.create_assignment(&teacher.id, &placement.subject_id)
            .await
            .unwrap();
        let offering = svc
            .create_offering(&placement.id, &teacher.id, 2026, 1)
            .await
            .unwrap();
        (teacher, offering)
    }

    /// Enroll `count` fresh students of `career` into `offering`.
    pub async fn enroll_students(
        svc: &AulaService,
        career: &Career,
        offering: &CourseOffering,
        count: usize,
    ) -> Vec<CourseEnrollment> {
        let mut enrollments = Vec::with_capacity(count);
        for i in 0..count {
            let student = svc
                .create_student(&format!("Student {i}"), &career.id)
                .await
                .unwrap();
            enrollments.push(svc.enroll_in_offering(&student.id, &offering.id).await.unwrap());
        }
        enrollments
    }
}
