use crate::configuration::ReportSettings;
use crate::email::Email;
use crate::guards::CronAuthorization;
use crate::reports::{JobSummary, WeeklyReport, WeeklyReportJob};
use crate::routes::{ApiError, ApplicationBaseUrl};
use crate::store::Store;
use anyhow::Context;
use chrono::Utc;
use rocket::serde::json::Json;
use rocket::State;
use std::sync::Arc;
use uuid::Uuid;

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReportBody {
    establishment_id: Option<String>,
}

#[derive(serde::Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TestReportData {
    pub establishment_name: String,
    pub alert_email: String,
    pub report: WeeklyReport,
}

#[derive(serde::Serialize, Debug)]
pub struct TestReportResponse {
    pub success: bool,
    pub message: String,
    pub data: TestReportData,
}

#[tracing::instrument(
    name = "Weekly report run",
    skip(_auth, store, email_client, base_url, settings),
    fields(request_id = %Uuid::new_v4())
)]
#[get("/cron/weekly-report")]
pub async fn weekly_report(
    _auth: CronAuthorization,
    store: &State<Arc<dyn Store>>,
    email_client: &State<Arc<dyn Email>>,
    base_url: &State<ApplicationBaseUrl>,
    settings: &State<ReportSettings>,
) -> Result<Json<JobSummary>, ApiError> {
    run_weekly_reports(store, email_client, base_url, settings).await
}

#[tracing::instrument(
    name = "Weekly report run",
    skip(_auth, store, email_client, base_url, settings),
    fields(request_id = %Uuid::new_v4())
)]
#[get("/cron/weekly-reports")]
pub async fn weekly_reports(
    _auth: CronAuthorization,
    store: &State<Arc<dyn Store>>,
    email_client: &State<Arc<dyn Email>>,
    base_url: &State<ApplicationBaseUrl>,
    settings: &State<ReportSettings>,
) -> Result<Json<JobSummary>, ApiError> {
    run_weekly_reports(store, email_client, base_url, settings).await
}

async fn run_weekly_reports(
    store: &State<Arc<dyn Store>>,
    email_client: &State<Arc<dyn Email>>,
    base_url: &State<ApplicationBaseUrl>,
    settings: &State<ReportSettings>,
) -> Result<Json<JobSummary>, ApiError> {
    let job = WeeklyReportJob {
        store: store.inner().as_ref(),
        email_client: email_client.inner().as_ref(),
        base_url: &base_url.0,
        send_empty_reports: settings.send_empty_reports,
    };
    Ok(Json(job.run(Utc::now()).await?))
}

#[tracing::instrument(
    name = "Sending a test weekly report",
    skip(_auth, body, store, email_client, base_url, settings),
    fields(request_id = %Uuid::new_v4())
)]
#[post("/cron/test-weekly-report", data = "<body>")]
pub async fn test_weekly_report(
    _auth: CronAuthorization,
    body: Json<TestReportBody>,
    store: &State<Arc<dyn Store>>,
    email_client: &State<Arc<dyn Email>>,
    base_url: &State<ApplicationBaseUrl>,
    settings: &State<ReportSettings>,
) -> Result<Json<TestReportResponse>, ApiError> {
    let establishment_id = body
        .into_inner()
        .establishment_id
        .ok_or_else(|| ApiError::Validation("establishmentId é obrigatório".to_string()))?;
    let not_found = || ApiError::NotFound("Estabelecimento não encontrado".to_string());
    let establishment_id = Uuid::parse_str(&establishment_id).map_err(|_| not_found())?;
    let establishment = store
        .find_establishment_by_id(establishment_id)
        .await
        .context("Failed to load the establishment.")?
        .ok_or_else(not_found)?;

    let job = WeeklyReportJob {
        store: store.inner().as_ref(),
        email_client: email_client.inner().as_ref(),
        base_url: &base_url.0,
        send_empty_reports: settings.send_empty_reports,
    };
    let report = job.send_test_report(&establishment, Utc::now()).await?;

    Ok(Json(TestReportResponse {
        success: true,
        message: format!("Relatório de teste enviado para {}", establishment.alert_email),
        data: TestReportData {
            establishment_name: establishment.name,
            alert_email: establishment.alert_email,
            report,
        },
    }))
}
