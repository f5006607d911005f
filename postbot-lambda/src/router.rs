use postbot_core::{InvocationEvent, InvocationResponse, Job, PostbotError};
use serde_json::Value;

use crate::context::JobContext;
use crate::jobs::{headlines, random_fact, wikimedia, year_progress};

/// Run the job selected by `event` (or the configured default) and map the
/// outcome to the response handed back to the scheduler.
pub async fn handle_invocation(event: &Value, ctx: &JobContext) -> InvocationResponse {
    let job = match InvocationEvent::from_value(event).job_or(ctx.config.service.job) {
        Ok(job) => job,
        Err(e) => {
            tracing::error!("Rejected invocation: {}", e);
            return InvocationResponse::err(e);
        }
    };

    tracing::info!(job = %job, "Running job");
    match run_job(job, ctx).await {
        Ok(posted) => {
            tracing::info!(job = %job, post_id = %posted.id, "Post published");
            InvocationResponse::ok(&posted.response)
        }
        Err(e @ PostbotError::NoContentFound(_)) => {
            tracing::warn!(job = %job, "No content: {}", e);
            InvocationResponse::from_error(&e)
        }
        Err(e) => {
            tracing::error!(job = %job, "Job failed: {}", e);
            InvocationResponse::from_error(&e)
        }
    }
}

async fn run_job(job: Job, ctx: &JobContext) -> postbot_core::error::Result<postbot_core::Posted> {
    match job {
        Job::RandomFact => random_fact::run(ctx).await,
        Job::Headlines => headlines::run(ctx).await,
        Job::Wikimedia => wikimedia::run(ctx).await,
        Job::YearProgress => year_progress::run(ctx).await,
    }
}
