use alloy::primitives::TxHash;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::controller::error::ApiError;
use crate::controller::extract::ApiJson;
use crate::controller::types::*;
use crate::controller::ControllerState;

pub async fn health(State(state): State<ControllerState>) -> impl IntoResponse {
    let chain_id = state.transactor.client().chain_id().0;
    match state.transactor.client().health().await {
        Ok(block_number) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                chain_id,
                block_number: Some(block_number),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                    chain_id,
                    block_number: None,
                }),
            )
        }
    }
}

pub async fn get_account(
    State(state): State<ControllerState>,
) -> Result<Json<AccountResponse>, ApiError> {
    let client = state.transactor.client();
    let address = state.transactor.address();
    let pending_nonce = client.pending_nonce(address).await?;
    let balance = client.balance(address).await?;

    Ok(Json(AccountResponse {
        address,
        chain_id: client.chain_id().0,
        next_nonce: state.transactor.options().nonce,
        pending_nonce,
        balance: balance.to_string(),
    }))
}

pub async fn get_gas_price(
    State(state): State<ControllerState>,
) -> Result<Json<GasPriceResponse>, ApiError> {
    let gas_price = state.transactor.client().gas_price().await?;
    Ok(Json(GasPriceResponse {
        gas_price: gas_price.to_string(),
    }))
}

pub async fn get_transactor(State(state): State<ControllerState>) -> Json<TransactorResponse> {
    Json(state.transactor.options().into())
}

pub async fn get_contract(
    State(state): State<ControllerState>,
) -> Result<Json<ContractResponse>, ApiError> {
    let info = state.contract.inspect().await?;
    Ok(Json(info.into()))
}

pub async fn call_contract(
    State(state): State<ControllerState>,
    ApiJson(request): ApiJson<CallRequest>,
) -> Result<Json<CallResponse>, ApiError> {
    let data = parse_calldata(request.data.as_deref()).map_err(ApiError::BadRequest)?;
    let result = state
        .contract
        .call(state.transactor.address(), data)
        .await?;
    Ok(Json(CallResponse { result }))
}

pub async fn transact_contract(
    State(state): State<ControllerState>,
    ApiJson(request): ApiJson<TransactRequest>,
) -> Result<(StatusCode, Json<TransactResponse>), ApiError> {
    let data = parse_calldata(request.data.as_deref()).map_err(ApiError::BadRequest)?;
    let value = parse_wei(request.value.as_deref()).map_err(ApiError::BadRequest)?;

    let submitted = state
        .transactor
        .submit(state.contract.address(), value, data)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(submitted.into())))
}

pub async fn get_transaction(
    State(state): State<ControllerState>,
    Path(hash): Path<String>,
) -> Result<Json<TxStatusResponse>, ApiError> {
    let tx_hash: TxHash = hash
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid transaction hash '{}'", hash)))?;

    let status = state.transactor.confirmation_status(tx_hash).await?;
    Ok(Json(TxStatusResponse { tx_hash, status }))
}
