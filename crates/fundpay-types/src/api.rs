use serde::{Deserialize, Serialize};

use crate::models::{Payment, Role};

// -- Auth --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

// -- Campaigns --

/// Text parts of the multipart campaign-creation request. Files travel
/// alongside as separate parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCampaign {
    pub title: String,
    pub description: String,
    pub target_amount: String,
    pub upi: String,
    pub bank: String,
}

impl NewCampaign {
    /// Multipart field names paired with their values, in submission order.
    pub fn text_parts(&self) -> [(&'static str, &str); 5] {
        [
            ("title", self.title.as_str()),
            ("description", self.description.as_str()),
            ("targetAmount", self.target_amount.as_str()),
            ("upi", self.upi.as_str()),
            ("bank", self.bank.as_str()),
        ]
    }
}

// -- Contact --

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub issue: String,
    pub description: String,
}

// -- Payments --

/// Body returned by the verify/reject endpoints. Older backends reply with
/// only a message, so both fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentActionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub payment: Option<Payment>,
}

// -- Errors --

/// Failure body: `{ "message": "..." }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
