use std::future::Future;

use bytes::Bytes;
use fundpay_types::api::{
    ContactSubmission, ErrorBody, NewCampaign, PaymentActionResponse, SignupRequest,
};
use fundpay_types::models::{Campaign, Payment, PaymentId};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// A file picked by the user, attached to a multipart submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub data: Bytes,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }

    fn into_part(self) -> Result<Part> {
        Ok(Part::bytes(self.data.to_vec())
            .file_name(self.file_name)
            .mime_str(&self.mime)?)
    }
}

/// The REST surface the screens talk to. Controllers are generic over this
/// so they can run against [`HttpClient`] or an in-memory double.
pub trait FundpayApi: Send + Sync {
    /// GET /api/campaigns
    fn list_campaigns(&self) -> impl Future<Output = Result<Vec<Campaign>>> + Send;

    /// POST /api/campaigns (multipart)
    fn create_campaign(
        &self,
        campaign: NewCampaign,
        thumbnail: Option<Attachment>,
        qr_code: Option<Attachment>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// POST /api/contact (multipart)
    fn submit_contact(
        &self,
        submission: ContactSubmission,
        screenshot: Option<Attachment>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// POST /api/auth/signup
    fn signup(&self, request: SignupRequest) -> impl Future<Output = Result<()>> + Send;

    /// GET /api/payments/pending
    fn pending_payments(&self) -> impl Future<Output = Result<Vec<Payment>>> + Send;

    /// POST /api/payments/{id}/verify. Returns the updated record when the
    /// backend echoes one.
    fn verify_payment(&self, id: &PaymentId)
    -> impl Future<Output = Result<Option<Payment>>> + Send;

    /// POST /api/payments/{id}/reject
    fn reject_payment(&self, id: &PaymentId)
    -> impl Future<Output = Result<Option<Payment>>> + Send;

    /// GET /api/payments/mine
    fn my_payments(&self) -> impl Future<Output = Result<Vec<Payment>>> + Send;

    /// Turns a file field from a response into a fetchable URL.
    fn resolve_asset(&self, path: &str) -> String;
}

/// [`FundpayApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    origin: Url,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let origin = Url::parse(&config.api_url).map_err(|e| {
            ClientError::Config(format!("invalid backend url {:?}: {e}", config.api_url))
        })?;
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            origin,
            token: config.token.clone(),
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = join_under(&self.origin, path)?;
        debug!(%method, %url, "dispatching request");

        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        check_status(response).await
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let response = self.send(self.request(Method::GET, path)?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn payment_action(&self, id: &PaymentId, action: &str) -> Result<Option<Payment>> {
        let path = format!("/api/payments/{id}/{action}");
        let response = self.send(self.request(Method::POST, &path)?).await?;
        let body = response.bytes().await?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        // Either `{ message, payment }` or the bare payment record.
        if let Ok(wrapped) = serde_json::from_slice::<PaymentActionResponse>(&body) {
            if wrapped.payment.is_some() {
                return Ok(wrapped.payment);
            }
        }
        match serde_json::from_slice::<Payment>(&body) {
            Ok(payment) => Ok(Some(payment)),
            Err(e) => {
                debug!(payment = %id, action, error = %e, "action response carried no payment");
                Ok(None)
            }
        }
    }
}

/// Maps any non-2xx status to [`ClientError::Status`], keeping the server's
/// `message` when the body has one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty());

    warn!(
        %status,
        %url,
        message = message.as_deref().unwrap_or(""),
        "request rejected"
    );
    Err(ClientError::Status { status, message })
}

/// Joins `path` beneath the origin's own path, so a backend mounted at
/// `http://host/backend` keeps its `/backend` prefix.
fn join_under(origin: &Url, path: &str) -> Result<Url> {
    let mut base = origin.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    base.join(path.trim_start_matches('/'))
        .map_err(|e| ClientError::Config(format!("cannot build url for {path}: {e}")))
}

/// Absolute `http(s)` URLs pass through; anything else is trimmed and
/// resolved against the backend origin.
pub fn resolve_asset(origin: &Url, path: &str) -> String {
    let path = path.trim();
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    match join_under(origin, path) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}/{}", origin.as_str().trim_end_matches('/'), path.trim_start_matches('/')),
    }
}

impl FundpayApi for HttpClient {
    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        self.get_list("/api/campaigns").await
    }

    async fn create_campaign(
        &self,
        campaign: NewCampaign,
        thumbnail: Option<Attachment>,
        qr_code: Option<Attachment>,
    ) -> Result<()> {
        let mut form = Form::new();
        for (name, value) in campaign.text_parts() {
            form = form.text(name, value.to_string());
        }
        if let Some(file) = thumbnail {
            form = form.part("thumbnail", file.into_part()?);
        }
        if let Some(file) = qr_code {
            form = form.part("qrCode", file.into_part()?);
        }

        self.send(self.request(Method::POST, "/api/campaigns")?.multipart(form))
            .await?;
        Ok(())
    }

    async fn submit_contact(
        &self,
        submission: ContactSubmission,
        screenshot: Option<Attachment>,
    ) -> Result<()> {
        let mut form = Form::new()
            .text("issue", submission.issue)
            .text("description", submission.description);
        if let Some(file) = screenshot {
            form = form.part("screenshot", file.into_part()?);
        }

        self.send(self.request(Method::POST, "/api/contact")?.multipart(form))
            .await?;
        Ok(())
    }

    async fn signup(&self, request: SignupRequest) -> Result<()> {
        self.send(self.request(Method::POST, "/api/auth/signup")?.json(&request))
            .await?;
        Ok(())
    }

    async fn pending_payments(&self) -> Result<Vec<Payment>> {
        self.get_list("/api/payments/pending").await
    }

    async fn verify_payment(&self, id: &PaymentId) -> Result<Option<Payment>> {
        self.payment_action(id, "verify").await
    }

    async fn reject_payment(&self, id: &PaymentId) -> Result<Option<Payment>> {
        self.payment_action(id, "reject").await
    }

    async fn my_payments(&self) -> Result<Vec<Payment>> {
        self.get_list("/api/payments/mine").await
    }

    fn resolve_asset(&self, path: &str) -> String {
        resolve_asset(&self.origin, path)
    }
}
