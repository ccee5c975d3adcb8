//! Invoice handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{InvoiceDraft, InvoiceHeader, InvoiceQuery, ItemInput, Recipient},
    repositories::Store,
    services::preview_invoice,
    state::AppState,
    validation::{validate_email, validate_items, validate_non_negative, validate_required},
};

/// Invoice create and update payload.
///
/// The recipient is either `client_id` or the four `client_*` fields.
#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    pub client_id: Option<Uuid>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    pub client_phone: Option<String>,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub delivery_fee: Decimal,
    pub items: Vec<ItemInput>,
}

impl InvoiceRequest {
    fn into_draft(self) -> Result<InvoiceDraft, String> {
        let invoice_number = self.invoice_number.trim().to_string();
        validate_required("invoice_number", &invoice_number)?;
        if self.due_date < self.issue_date {
            return Err("due_date must not be before issue_date".to_string());
        }
        validate_non_negative("tax_rate", self.tax_rate)?;
        validate_non_negative("delivery_fee", self.delivery_fee)?;
        validate_items(&self.items)?;

        let recipient = Recipient::from_parts(
            self.client_id,
            self.client_name,
            self.client_email,
            self.client_address,
            self.client_phone,
        )?;
        if let Recipient::Inline(snapshot) = &recipient {
            validate_email(&snapshot.email)?;
        }

        Ok(InvoiceDraft {
            header: InvoiceHeader {
                recipient,
                invoice_number,
                issue_date: self.issue_date,
                due_date: self.due_date,
                notes: self.notes,
                tax_rate: self.tax_rate,
                delivery_fee: self.delivery_fee,
            },
            items: self.items,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub items: Vec<ItemInput>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub delivery_fee: Decimal,
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<InvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = payload.into_draft().map_err(ApiError::BadRequest)?;
    let invoice = state.services.invoices.create(auth.id, draft).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<InvoiceQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.invoices.list(auth.id, &query).await?))
}

pub async fn get<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.invoices.get(id, auth.id).await?))
}

/// Replace the header and reconcile the items of an invoice
pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let draft = payload.into_draft().map_err(ApiError::BadRequest)?;
    let invoice = state
        .services
        .invoices
        .update(id, auth.id, draft.header, draft.items)
        .await?;
    Ok(Json(invoice))
}

pub async fn update_status<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .services
        .invoices
        .update_status(id, auth.id, &payload.status)
        .await?;
    Ok(Json(json!({ "message": "Invoice status updated" })))
}

pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.services.invoices.delete(id, auth.id).await?;
    Ok(Json(json!({ "message": "Invoice deleted" })))
}

pub async fn summary<S: Store>(
    State(state): State<AppState<S>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.services.invoices.summary(auth.id).await?))
}

/// Totals of an invoice that is not stored
pub async fn preview(Json(payload): Json<PreviewRequest>) -> ApiResult<impl IntoResponse> {
    validate_non_negative("tax_rate", payload.tax_rate).map_err(ApiError::BadRequest)?;
    validate_non_negative("delivery_fee", payload.delivery_fee).map_err(ApiError::BadRequest)?;
    validate_items(&payload.items).map_err(ApiError::BadRequest)?;

    Ok(Json(preview_invoice(
        &payload.items,
        payload.tax_rate,
        payload.delivery_fee,
    )?))
}
