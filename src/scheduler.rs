use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::tracker::RankingTracker;

/// Register one cycle job per cron expression.
///
/// Overlapping triggers are absorbed by the tracker's single-flight guard.
pub async fn build_scheduler(tracker: &RankingTracker, schedule: &[String]) -> Result<JobScheduler> {
    let sched = JobScheduler::new().await.context("creating scheduler")?;

    for cron in schedule {
        let job_tracker = tracker.clone();
        let job = Job::new_async(cron.as_str(), move |_uuid, _l| {
            let tracker = job_tracker.clone();
            Box::pin(async move {
                tracker.run_cycle().await;
            })
        })
        .with_context(|| format!("creating scheduler job for cron {cron}"))?;

        sched.add(job).await.context("adding scheduler job")?;
        info!("Scheduled ranking cycle: {}", cron);
    }

    Ok(sched)
}
