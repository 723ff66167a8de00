use super::{error::AppError, with_store, ApiResponse, AppState};
use crate::db::models::{lead_source, lead_status, Lead, NewLead};
use crate::utils::non_blank;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const RECENT_LEADS: i64 = 100;

/// Contact form body. Every field is optional, but a phone number or an email
/// address must be present.
#[derive(Debug, Default, Deserialize)]
pub struct LeadRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub budget: Option<String>,
    #[serde(default, alias = "interestedProject", deserialize_with = "lenient_string")]
    pub interested_project: Option<String>,
    #[serde(default, alias = "preferredArea", deserialize_with = "lenient_string")]
    pub preferred_area: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bedrooms: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timeline: Option<String>,
    #[serde(default, alias = "investmentPurpose", deserialize_with = "lenient_string")]
    pub investment_purpose: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notes: Option<String>,
}

// Form widgets post budgets and bedroom counts as numbers or strings.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected a string, got {}", other))),
    }
}

impl LeadRequest {
    pub fn into_new_lead(self) -> Result<NewLead, AppError> {
        let phone = non_blank(self.phone);
        let email = non_blank(self.email);
        if phone.is_none() && email.is_none() {
            return Err(AppError::Validation(
                "Please provide a phone number or email address".to_string(),
            ));
        }

        Ok(NewLead {
            name: non_blank(self.name),
            phone,
            email,
            budget: non_blank(self.budget),
            interested_project: non_blank(self.interested_project),
            preferred_area: non_blank(self.preferred_area),
            bedrooms: non_blank(self.bedrooms),
            timeline: non_blank(self.timeline),
            investment_purpose: non_blank(self.investment_purpose),
            notes: non_blank(self.notes),
            source: lead_source::WEBSITE_CONTACT_FORM.to_string(),
            status: lead_status::NEW.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadCreated {
    pub success: bool,
    pub message: &'static str,
    pub lead_id: i32,
    pub created_at: DateTime<Utc>,
}

/// POST /api/leads
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<LeadRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LeadCreated>), AppError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected lead payload: {}", rejection.body_text());
        AppError::Validation("Invalid request body".to_string())
    })?;
    let new_lead = request.into_new_lead()?;

    let lead = with_store(&state, move |store| store.insert_lead(&new_lead)).await?;
    info!("Lead {} captured (source={})", lead.id, lead.source);

    Ok((
        StatusCode::CREATED,
        Json(LeadCreated {
            success: true,
            message: "Thank you! Our team will contact you shortly.",
            lead_id: lead.id,
            created_at: lead.created_at,
        }),
    ))
}

/// GET /api/leads, latest submissions first.
pub async fn recent(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Lead>>>, AppError> {
    let leads = with_store(&state, |store| store.recent_leads(RECENT_LEADS)).await?;
    Ok(ApiResponse::ok(leads))
}
