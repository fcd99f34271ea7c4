use async_trait::async_trait;
use tracing::info;

use aula_core::entities::CourseOffering;
use aula_core::ports::Notifier;

/// Default notifier: records the dispatch as a structured log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn grades_published(
        &self,
        offering: &CourseOffering,
        student_ids: &[String],
    ) -> anyhow::Result<()> {
        info!(
            offering_id = %offering.id,
            subject_id = %offering.subject_id,
            recipients = student_ids.len(),
            "grades published notification"
        );
        Ok(())
    }
}
