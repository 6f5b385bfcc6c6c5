use crate::domain::{Establishment, FeedbackFilter, UserEmail};
use crate::email::{templates, Email};
use crate::reports::weekly::{aggregate, ReportWindows, WeeklyReport};
use crate::store::Store;
use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Sent,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentOutcome {
    pub establishment_id: Uuid,
    pub establishment_name: String,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct JobSummary {
    pub message: String,
    pub total: usize,
    pub sent: usize,
    pub skipped: usize,
    pub errors: usize,
    pub results: Vec<EstablishmentOutcome>,
}

/// Sends the weekly summary to every eligible establishment, one at a time.
pub struct WeeklyReportJob<'a> {
    pub store: &'a dyn Store,
    pub email_client: &'a dyn Email,
    pub base_url: &'a str,
    pub send_empty_reports: bool,
}

impl<'a> WeeklyReportJob<'a> {
    /// Only a failure to list establishments aborts the run; per-establishment
    /// failures are recorded in the summary.
    #[tracing::instrument(name = "Running the weekly report job", skip(self))]
    pub async fn run(&self, now: DateTime<Utc>) -> Result<JobSummary, anyhow::Error> {
        let establishments = self
            .store
            .list_establishments_for_weekly_report()
            .await
            .context("Failed to list establishments due a weekly report.")?;

        let windows = ReportWindows::ending_at(now);
        let mut results = Vec::with_capacity(establishments.len());
        for establishment in establishments {
            let status = self.process(&establishment, windows).await;
            let (status, error) = match status {
                Ok(status) => (status, None),
                Err(e) => {
                    tracing::error!(
                        error.cause_chain = ?e,
                        establishment_id = %establishment.id,
                        "Failed to deliver a weekly report"
                    );
                    (ReportStatus::Failed, Some(e.to_string()))
                }
            };
            results.push(EstablishmentOutcome {
                establishment_id: establishment.id,
                establishment_name: establishment.name,
                status,
                error,
            });
        }

        let count = |wanted: ReportStatus| results.iter().filter(|r| r.status == wanted).count();
        let summary = JobSummary {
            message: "Weekly reports processed".to_string(),
            total: results.len(),
            sent: count(ReportStatus::Sent),
            skipped: count(ReportStatus::Skipped),
            errors: count(ReportStatus::Failed),
            results,
        };
        tracing::info!(
            total = summary.total,
            sent = summary.sent,
            skipped = summary.skipped,
            errors = summary.errors,
            "Weekly report job finished"
        );
        Ok(summary)
    }

    async fn process(
        &self,
        establishment: &Establishment,
        windows: ReportWindows,
    ) -> Result<ReportStatus, anyhow::Error> {
        let report = self.build_report(establishment, windows).await?;
        if report.is_empty() && !self.send_empty_reports {
            tracing::info!(establishment_id = %establishment.id, "No feedback this week, skipping");
            return Ok(ReportStatus::Skipped);
        }
        self.deliver(establishment, &report, false).await?;
        Ok(ReportStatus::Sent)
    }

    /// Builds and sends one report regardless of volume, with a test subject.
    #[tracing::instrument(name = "Sending a test weekly report", skip(self, establishment), fields(establishment_id = %establishment.id))]
    pub async fn send_test_report(
        &self,
        establishment: &Establishment,
        now: DateTime<Utc>,
    ) -> Result<WeeklyReport, anyhow::Error> {
        let report = self
            .build_report(establishment, ReportWindows::ending_at(now))
            .await?;
        self.deliver(establishment, &report, true).await?;
        Ok(report)
    }

    async fn build_report(
        &self,
        establishment: &Establishment,
        windows: ReportWindows,
    ) -> Result<WeeklyReport, anyhow::Error> {
        let current = self
            .store
            .list_feedbacks(
                establishment.id,
                FeedbackFilter::between(windows.current_start, windows.end),
            )
            .await
            .context("Failed to load this week's feedback.")?;
        let previous = self
            .store
            .list_feedbacks(
                establishment.id,
                FeedbackFilter::between(windows.previous_start, windows.current_start),
            )
            .await
            .context("Failed to load last week's feedback.")?;
        Ok(aggregate(&current, &previous))
    }

    async fn deliver(
        &self,
        establishment: &Establishment,
        report: &WeeklyReport,
        is_test: bool,
    ) -> Result<(), anyhow::Error> {
        let recipient = UserEmail::parse(establishment.alert_email.clone())
            .map_err(|e| anyhow!(e))
            .context("The alert e-mail on file is invalid.")?;
        let content = templates::weekly_report(&establishment.name, report, self.base_url, is_test);
        self.email_client
            .send_content(&recipient, &content)
            .await
            .context("Failed to send the weekly report.")
    }
}
