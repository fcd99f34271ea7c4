//! Capacity Guard and the structural operations of the Registrar.
//!
//! - Teacher cap: third assignment, repeated assignment, concurrent requests
//! - Unassign: exam-board seat guard, role deactivation on the last assignment
//! - Removals: plan subjects with enrollments or dependent prerequisite edges,
//!   careers with active students
//! - Prerequisite edges: self-reference, plan membership, duplicates

mod common;

use pretty_assertions::assert_eq;
use rstest::rstest;

use aula_core::MAX_TEACHERS_PER_SUBJECT;
use aula_core::enums::{AuditAction, EntityType, PrerequisiteKind};
use aula_core::errors::{ErrorKind, RuleError};
use aula_core::identity::SessionIdentity;
use aula_db::repos::audit::AuditFilter;
use aula_rules::CapacityGuard;
use common::Campus;

fn admin(c: &Campus) -> aula_rules::Registrar<aula_db::service::AulaService, SessionIdentity> {
    c.registrar(SessionIdentity::default())
}

// ---------------------------------------------------------------------------
// Teacher cap
// ---------------------------------------------------------------------------

#[tokio::test]
async fn third_teacher_exceeds_the_cap() {
    let c = Campus::seed().await;
    let registrar = admin(&c);
    let mut teachers = Vec::new();
    for name in ["T1", "T2", "T3"] {
        teachers.push(c.svc.create_teacher(name).await.unwrap());
    }

    for t in &teachers[..2] {
        assert!(registrar.assign_teacher(&t.id, &c.calculus_1.id).await.is_success());
    }
    let guard = CapacityGuard::new(c.svc.as_ref());
    assert!(!guard.has_capacity(&c.calculus_1.id).await.unwrap());

    let outcome = registrar.assign_teacher(&teachers[2].id, &c.calculus_1.id).await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::CapacityExceeded));
    assert_eq!(
        c.svc
            .count_assignments_for_subject(&c.calculus_1.id)
            .await
            .unwrap(),
        MAX_TEACHERS_PER_SUBJECT
    );
}

#[tokio::test]
async fn repeated_assignment_is_a_conflict_even_at_the_cap() {
    let c = Campus::seed().await;
    let t1 = c.svc.create_teacher("T1").await.unwrap();
    let t2 = c.svc.create_teacher("T2").await.unwrap();
    c.svc.create_assignment(&t1.id, &c.calculus_1.id).await.unwrap();
    c.svc.create_assignment(&t2.id, &c.calculus_1.id).await.unwrap();

    let err = CapacityGuard::new(c.svc.as_ref())
        .check_assignment(&t1.id, &c.calculus_1.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RuleError::AlreadyAssigned { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[rstest]
#[case::unknown_subject(false, true)]
#[case::unknown_teacher(true, false)]
#[tokio::test]
async fn assignment_needs_existing_parties(
    #[case] real_teacher: bool,
    #[case] real_subject: bool,
) {
    let c = Campus::seed().await;
    let teacher = c.svc.create_teacher("T1").await.unwrap();
    let teacher_id = if real_teacher {
        teacher.id.as_str()
    } else {
        "tch-00000000"
    };
    let subject_id = if real_subject {
        c.calculus_1.id.as_str()
    } else {
        "sub-00000000"
    };

    let outcome = admin(&c).assign_teacher(teacher_id, subject_id).await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn concurrent_assignments_stop_at_the_cap() {
    let c = Campus::seed().await;
    let registrar = admin(&c);
    let mut ids = Vec::new();
    for name in ["T1", "T2", "T3", "T4"] {
        ids.push(c.svc.create_teacher(name).await.unwrap().id);
    }
    let subject = c.calculus_1.id.as_str();

    let (a, b, d, e) = tokio::join!(
        registrar.assign_teacher(&ids[0], subject),
        registrar.assign_teacher(&ids[1], subject),
        registrar.assign_teacher(&ids[2], subject),
        registrar.assign_teacher(&ids[3], subject),
    );
    let ok = [&a, &b, &d, &e].iter().filter(|o| o.is_success()).count();
    assert_eq!(ok, 2);
    for outcome in [&a, &b, &d, &e].iter().filter(|o| !o.is_success()) {
        assert_eq!(outcome.error_kind, Some(ErrorKind::CapacityExceeded));
    }
    assert_eq!(c.svc.count_assignments_for_subject(subject).await.unwrap(), 2);
}

// ---------------------------------------------------------------------------
// Unassign
// ---------------------------------------------------------------------------

#[tokio::test]
async fn last_unassignment_deactivates_the_role() {
    let c = Campus::seed().await;
    let registrar = admin(&c);
    let teacher = c.svc.create_teacher("T1").await.unwrap();
    for subject in [&c.calculus_1.id, &c.calculus_2.id] {
        registrar.assign_teacher(&teacher.id, subject).await;
    }

    let first = registrar
        .unassign_teacher(&teacher.id, &c.calculus_1.id)
        .await
        .data
        .unwrap();
    assert!(!first.role_deactivated);
    assert!(c.svc.get_teacher(&teacher.id).await.unwrap().role_active);

    let last = registrar
        .unassign_teacher(&teacher.id, &c.calculus_2.id)
        .await
        .data
        .unwrap();
    assert!(last.role_deactivated);
    assert!(!c.svc.get_teacher(&teacher.id).await.unwrap().role_active);

    let trail = c
        .svc
        .query_audit(&AuditFilter {
            entity_type: Some(EntityType::Teacher),
            action: Some(AuditAction::RoleDeactivated),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].entity_id, teacher.id);
}

#[tokio::test]
async fn upcoming_board_seat_blocks_unassignment() {
    let c = Campus::seed().await;
    let registrar = admin(&c);
    let teacher = c.svc.create_teacher("T1").await.unwrap();
    registrar.assign_teacher(&teacher.id, &c.calculus_1.id).await;
    let board = c.board(&c.calculus_1, 10).await;
    c.svc.seat_board_teacher(&board.id, &teacher.id).await.unwrap();

    let outcome = registrar.unassign_teacher(&teacher.id, &c.calculus_1.id).await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::HasDependents));
    assert!(c.svc.get_assignment(&teacher.id, &c.calculus_1.id).await.is_ok());

    c.svc.cancel_exam_board(&board.id).await.unwrap();
    let outcome = registrar.unassign_teacher(&teacher.id, &c.calculus_1.id).await;
    assert!(outcome.is_success());
}

#[tokio::test]
async fn past_board_seat_does_not_block() {
    let c = Campus::seed().await;
    let teacher = c.svc.create_teacher("T1").await.unwrap();
    c.svc.create_assignment(&teacher.id, &c.calculus_1.id).await.unwrap();
    let board = c.board(&c.calculus_1, -2).await;
    c.svc.seat_board_teacher(&board.id, &teacher.id).await.unwrap();

    let outcome = admin(&c).unassign_teacher(&teacher.id, &c.calculus_1.id).await;
    assert!(outcome.is_success());
}

#[tokio::test]
async fn unassigning_a_missing_assignment_is_not_found() {
    let c = Campus::seed().await;
    let teacher = c.svc.create_teacher("T1").await.unwrap();
    let outcome = admin(&c).unassign_teacher(&teacher.id, &c.calculus_1.id).await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::NotFound));
}

// ---------------------------------------------------------------------------
// Removals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn placement_with_enrollments_cannot_be_removed() {
    let c = Campus::seed().await;
    let (_, offering) = c.offering(&c.calc1_placement).await;
    c.enroll_students(&offering, 2).await;

    let outcome = admin(&c).remove_plan_subject(&c.calc1_placement.id).await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::HasDependents));
    assert!(outcome.message.unwrap().contains("2 dependent"));
    assert!(c.svc.get_plan_subject(&c.calc1_placement.id).await.is_ok());
}

#[tokio::test]
async fn placement_without_enrollments_is_removed() {
    let c = Campus::seed().await;
    c.offering(&c.calc2_placement).await;

    let outcome = admin(&c).remove_plan_subject(&c.calc2_placement.id).await;
    assert!(outcome.is_success());
    assert!(c.svc.get_plan_subject(&c.calc2_placement.id).await.is_err());

    let again = admin(&c).remove_plan_subject(&c.calc2_placement.id).await;
    assert_eq!(again.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn required_placement_is_kept_until_its_dependent_goes() {
    let c = Campus::seed().await;
    let registrar = admin(&c);
    let edge = registrar
        .add_prerequisite(
            &c.plan.id,
            &c.calculus_2.id,
            &c.calculus_1.id,
            PrerequisiteKind::ForCoursework,
        )
        .await;
    assert!(edge.is_success());

    let outcome = registrar.remove_plan_subject(&c.calc1_placement.id).await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::HasDependents));
    assert!(outcome.message.unwrap().contains("1 dependent"));
    let verdict = c
        .as_student()
        .check_course_eligibility(&c.calculus_2.id)
        .await
        .data
        .unwrap();
    assert_eq!(verdict.requirements.len(), 1);

    // Calculus II goes first, taking its own edge along.
    assert!(registrar.remove_plan_subject(&c.calc2_placement.id).await.is_success());
    assert!(c.svc.list_prerequisite_edges(&c.plan.id).await.unwrap().is_empty());
    assert!(registrar.remove_plan_subject(&c.calc1_placement.id).await.is_success());
}

#[tokio::test]
async fn career_with_active_students_is_kept() {
    let c = Campus::seed().await;

    let outcome = admin(&c).remove_career(&c.career.id).await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::HasDependents));
    assert_eq!(
        outcome.message.as_deref(),
        Some(format!("Career {} has 1 active student(s)", c.career.id).as_str())
    );
}

#[tokio::test]
async fn empty_career_is_removed() {
    let c = Campus::seed().await;
    let evening = c
        .svc
        .create_career("Evening Engineering", "Engineering", &c.plan.id)
        .await
        .unwrap();

    let outcome = admin(&c).remove_career(&evening.id).await;
    assert!(outcome.is_success());
    assert!(c.svc.get_career(&evening.id).await.is_err());
}

// ---------------------------------------------------------------------------
// Prerequisite edges
// ---------------------------------------------------------------------------

#[tokio::test]
async fn self_reference_is_rejected_at_creation() {
    let c = Campus::seed().await;
    let outcome = admin(&c)
        .add_prerequisite(
            &c.plan.id,
            &c.calculus_1.id,
            &c.calculus_1.id,
            PrerequisiteKind::ForCoursework,
        )
        .await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::Validation));
}

#[tokio::test]
async fn edges_need_both_subjects_in_the_plan() {
    let c = Campus::seed().await;
    let elective = c.svc.create_subject("ART-200", "Drawing").await.unwrap();
    let outcome = admin(&c)
        .add_prerequisite(
            &c.plan.id,
            &c.calculus_2.id,
            &elective.id,
            PrerequisiteKind::ForCoursework,
        )
        .await;
    assert_eq!(outcome.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn duplicate_edge_is_a_conflict_and_removal_works() {
    let c = Campus::seed().await;
    let registrar = admin(&c);
    let mut outcomes = Vec::new();
    for _ in 0..2 {
        outcomes.push(
            registrar
                .add_prerequisite(
                    &c.plan.id,
                    &c.calculus_2.id,
                    &c.calculus_1.id,
                    PrerequisiteKind::ForCoursework,
                )
                .await,
        );
    }
    assert_eq!(outcomes[1].error_kind, Some(ErrorKind::Conflict));
    let edge = outcomes.remove(0).data.unwrap();

    // Same pair, other kind, is a separate edge.
    let final_edge = registrar
        .add_prerequisite(
            &c.plan.id,
            &c.calculus_2.id,
            &c.calculus_1.id,
            PrerequisiteKind::ForFinal,
        )
        .await;
    assert!(final_edge.is_success());

    assert!(registrar.remove_prerequisite(&edge.id).await.is_success());
    assert_eq!(
        registrar.remove_prerequisite(&edge.id).await.error_kind,
        Some(ErrorKind::NotFound)
    );
}
