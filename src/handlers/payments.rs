use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use model::entities::{payment, project};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Request body for recording a payment
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreatePaymentRequest {
    /// Project the payment was made against
    pub project_id: i32,
    /// Payment amount; must be strictly positive
    pub amount: Decimal,
    /// Date the payment was received
    pub payment_date: NaiveDate,
    /// Payment method (bank transfer, cash, ...)
    pub payment_method: Option<String>,
    /// Receiving bank account
    pub bank_account_id: Option<i32>,
    /// Income category
    pub category_id: Option<i32>,
    /// Free-form note
    pub note: Option<String>,
}

/// Payment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub project_id: i32,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    pub bank_account_id: Option<i32>,
    pub category_id: Option<i32>,
    pub is_verified: bool,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            amount: model.amount,
            payment_date: model.payment_date,
            payment_method: model.payment_method,
            bank_account_id: model.bank_account_id,
            category_id: model.category_id,
            is_verified: model.is_verified,
            note: model.note,
            created_at: model.created_at,
        }
    }
}

/// Record a payment against a project
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded successfully", body = ApiResponse<PaymentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), StatusCode> {
    trace!("Entering create_payment function");
    debug!(
        "Recording payment of {} against project {}",
        request.amount, request.project_id
    );

    if request.amount <= Decimal::ZERO {
        warn!("Rejected non-positive payment amount: {}", request.amount);
        return Err(StatusCode::BAD_REQUEST);
    }

    // The payment must land on an existing project
    match project::Entity::find_by_id(request.project_id).one(&state.db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("Project with ID {} not found for payment", request.project_id);
            return Err(StatusCode::NOT_FOUND);
        }
        Err(db_error) => {
            error!(
                "Failed to lookup project {} for payment: {}",
                request.project_id, db_error
            );
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    let new_payment = payment::ActiveModel {
        project_id: Set(request.project_id),
        amount: Set(request.amount),
        payment_date: Set(request.payment_date),
        payment_method: Set(request.payment_method.clone()),
        bank_account_id: Set(request.bank_account_id),
        category_id: Set(request.category_id),
        note: Set(request.note.clone()),
        ..Default::default()
    };

    trace!("Attempting to insert new payment into database");
    match new_payment.insert(&state.db).await {
        Ok(payment_model) => {
            info!(
                "Payment recorded successfully with ID: {} against project {}",
                payment_model.id, payment_model.project_id
            );
            state.cache.invalidate_all();
            let response = ApiResponse {
                data: PaymentResponse::from(payment_model),
                message: "Payment recorded successfully".to_string(),
                success: true,
            };
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(db_error) => {
            error!(
                "Failed to record payment against project {}: {}",
                request.project_id, db_error
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a payment
#[utoipa::path(
    delete,
    path = "/api/v1/payments/{payment_id}",
    tag = "payments",
    params(
        ("payment_id" = i32, Path, description = "Payment ID"),
    ),
    responses(
        (status = 200, description = "Payment deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_payment(
    Path(payment_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, StatusCode> {
    trace!("Entering delete_payment function for payment_id: {}", payment_id);

    match payment::Entity::delete_by_id(payment_id).exec(&state.db).await {
        Ok(delete_result) => {
            if delete_result.rows_affected > 0 {
                info!("Payment with ID {} deleted successfully", payment_id);
                state.cache.invalidate_all();
                let response = ApiResponse {
                    data: format!("Payment {} deleted", payment_id),
                    message: "Payment deleted successfully".to_string(),
                    success: true,
                };
                Ok(Json(response))
            } else {
                warn!("Payment with ID {} not found for deletion", payment_id);
                Err(StatusCode::NOT_FOUND)
            }
        }
        Err(db_error) => {
            error!("Failed to delete payment with ID {}: {}", payment_id, db_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
