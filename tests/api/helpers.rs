use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dizai::billing::{BillingGateway, CheckoutSession, WebhookVerifier};
use dizai::configuration::{get_configuration, Settings};
use dizai::domain::{Establishment, NewFeedback, Rating, SubscriptionStatus, SubscriptionUpdate, UserEmail};
use dizai::email::Email;
use dizai::startup::Application;
use dizai::store::{MemoryStore, Store};
use dizai::telemetry::{get_subscriber, init_subscriber};
use once_cell::sync::Lazy;
use secrecy::Secret;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const CRON_SECRET: &str = "test-cron-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const PASSWORD: &str = "correct horse battery";

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".into();
    let subscriber_name = "test".into();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Records every message instead of delivering it.
#[derive(Default)]
pub struct MockEmailClient {
    sent: Mutex<Vec<SentEmail>>,
    failing: Mutex<bool>,
}

impl MockEmailClient {
    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_deliveries(&self) {
        *self.failing.lock().unwrap() = true;
    }
}

#[async_trait]
impl Email for MockEmailClient {
    async fn send_email(
        &self,
        recipient: &UserEmail,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error> {
        if *self.failing.lock().unwrap() {
            anyhow::bail!("SMTP server unavailable");
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.as_ref().to_string(),
            subject: subject.to_string(),
            html: html_content.to_string(),
            text: text_content.to_string(),
        });
        Ok(())
    }
}

/// Hands out sequential customer ids and remembers the user each one was tagged with.
#[derive(Default)]
pub struct MockBilling {
    customers: Mutex<HashMap<String, Uuid>>,
    checkout_sessions: Mutex<Vec<(String, Uuid)>>,
}

impl MockBilling {
    pub fn customer_count(&self) -> usize {
        self.customers.lock().unwrap().len()
    }

    pub fn checkout_sessions(&self) -> Vec<(String, Uuid)> {
        self.checkout_sessions.lock().unwrap().clone()
    }

    pub fn tag_customer(&self, customer_id: &str, user_id: Uuid) {
        self.customers
            .lock()
            .unwrap()
            .insert(customer_id.to_string(), user_id);
    }
}

#[async_trait]
impl BillingGateway for MockBilling {
    async fn create_customer(&self, _email: &str, user_id: Uuid) -> Result<String, anyhow::Error> {
        let mut customers = self.customers.lock().unwrap();
        let customer_id = format!("cus_test_{}", customers.len() + 1);
        customers.insert(customer_id.clone(), user_id);
        Ok(customer_id)
    }

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        user_id: Uuid,
    ) -> Result<CheckoutSession, anyhow::Error> {
        let mut sessions = self.checkout_sessions.lock().unwrap();
        sessions.push((customer_id.to_string(), user_id));
        let id = format!("cs_test_{}", sessions.len());
        Ok(CheckoutSession {
            url: format!("https://checkout.test/{}", id),
            id,
        })
    }

    async fn create_portal_session(&self, customer_id: &str) -> Result<String, anyhow::Error> {
        Ok(format!("https://billing.test/portal/{}", customer_id))
    }

    async fn customer_user_id(&self, customer_id: &str) -> Result<Option<Uuid>, anyhow::Error> {
        Ok(self.customers.lock().unwrap().get(customer_id).copied())
    }
}

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub email_client: Arc<MockEmailClient>,
    pub billing: Arc<MockBilling>,
    pub api_client: reqwest::Client,
    pub settings: Settings,
    webhook_signer: WebhookVerifier,
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.api_client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.api_client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_register(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/auth/register",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn post_login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/auth/login",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Registers a fresh user; the session cookie stays in the client.
    pub async fn register_user(&self) -> TestUser {
        let email = format!("{}@padaria.com", Uuid::new_v4());
        let response = self.post_register(&email, PASSWORD).await;
        assert_eq!(200, response.status().as_u16());
        let body: Value = response.json().await.unwrap();
        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            email,
        }
    }

    pub async fn set_subscription(&self, user_id: Uuid, status: SubscriptionStatus) {
        self.store
            .update_user_subscription(
                user_id,
                SubscriptionUpdate {
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
    }

    /// Registers an owner with an active subscription.
    pub async fn register_subscriber(&self) -> TestUser {
        let user = self.register_user().await;
        self.set_subscription(user.id, SubscriptionStatus::Active)
            .await;
        user
    }

    pub async fn create_establishment(&self, name: &str) -> Establishment {
        let response = self
            .post_json("/establishments", &serde_json::json!({ "name": name }))
            .await;
        assert_eq!(200, response.status().as_u16());
        let body: Value = response.json().await.unwrap();
        serde_json::from_value(body["establishment"].clone()).unwrap()
    }

    pub async fn add_feedback_at(
        &self,
        establishment_id: Uuid,
        rating: Rating,
        comment: Option<&str>,
        at: DateTime<Utc>,
    ) {
        self.store
            .insert_feedback(
                NewFeedback::new(rating, comment.map(Into::into), establishment_id).received_at(at),
            )
            .await
            .unwrap();
    }

    pub async fn cron_get(&self, path: &str, secret: Option<&str>) -> reqwest::Response {
        let mut request = self.api_client.get(self.url(path));
        if let Some(secret) = secret {
            request = request.bearer_auth(secret);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn post_webhook(&self, payload: &Value) -> reqwest::Response {
        let payload = serde_json::to_vec(payload).unwrap();
        let signature = self
            .webhook_signer
            .signature_header(Utc::now().timestamp(), &payload);
        self.post_webhook_raw(payload, Some(signature)).await
    }

    pub async fn post_webhook_raw(
        &self,
        payload: Vec<u8>,
        signature: Option<String>,
    ) -> reqwest::Response {
        let mut request = self
            .api_client
            .post(self.url("/stripe/webhook"))
            .header("Content-Type", "application/json")
            .body(payload);
        if let Some(signature) = signature {
            request = request.header("Stripe-Signature", signature);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn find_user(&self, user_id: Uuid) -> dizai::domain::User {
        self.store.find_user_by_id(user_id).await.unwrap().unwrap()
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = None;
        c.application.host = "127.0.0.1".parse().unwrap();
        c.application.cron_secret = Secret::new(CRON_SECRET.into());
        c.application.secure_cookies = false;
        c.stripe.webhook_secret = Secret::new(WEBHOOK_SECRET.into());
        c.reports.send_empty_reports = false;
        c
    };

    let store = Arc::new(MemoryStore::new());
    let email_client = Arc::new(MockEmailClient::default());
    let billing = Arc::new(MockBilling::default());

    let app = Application::build(
        &configuration,
        store.clone(),
        email_client.clone(),
        billing.clone(),
    )
    .await
    .expect("Failed to build application.");
    let port = app.port;
    let _ = tokio::spawn(app.server.launch());

    let api_client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();

    TestApp {
        address: format!(
            "http://127.0.0.1:{}",
            port.get().await.expect("The server never lifted off.")
        ),
        store,
        email_client,
        billing,
        api_client,
        webhook_signer: WebhookVerifier::new(Secret::new(WEBHOOK_SECRET.into())),
        settings: configuration,
    }
}

pub fn assert_error_message(body: &Value, expected: &str) {
    assert_eq!(
        body["error"].as_str(),
        Some(expected),
        "Unexpected error body: {}",
        body
    );
}
