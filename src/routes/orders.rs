use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, ErrorBody},
    app_state::AppState,
    extract::{AppJson, AppPath, AppQuery},
    models::{OrderEntity, OrderStatusChangeset, OrderWithItems},
    orders::{
        menu::RequestedItem,
        placement::{PlaceOrder, PlacedOrder},
    },
    store::Page,
};

/// Defines order routes with OpenAPI specs.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(create_order))
        .routes(utoipa_axum::routes!(get_orders))
        .routes(utoipa_axum::routes!(get_order))
        .routes(utoipa_axum::routes!(update_order))
}

#[derive(Deserialize, ToSchema)]
struct CreateOrderReq {
    customer_id: Option<i32>,
    restaurant_id: Option<i32>,
    address_id: Option<i32>,
    items: Option<Vec<RequestedItem>>,
    #[schema(value_type = Option<f64>)]
    client_total: Option<Decimal>,
}

/// Place an order: validate against the live menu, price it, store it and
/// charge it.
#[utoipa::path(
    post,
    path = "/orders",
    tags = ["Orders"],
    request_body = CreateOrderReq,
    responses(
        (status = 201, description = "Order placed; see payment_status for the charge outcome", body = PlacedOrder),
        (status = 400, description = "VALIDATION_ERROR or BUSINESS_RULE", body = ErrorBody),
        (status = 500, description = "INTERNAL_ERROR", body = ErrorBody)
    )
)]
async fn create_order(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(customer_id), Some(restaurant_id), Some(address_id)) =
        (body.customer_id, body.restaurant_id, body.address_id)
    else {
        return Err(AppError::Validation(
            "customer_id, restaurant_id, address_id required".into(),
        ));
    };
    let Some(items) = body.items else {
        return Err(AppError::Validation("items required".into()));
    };

    let placed = state
        .placement
        .place(PlaceOrder {
            customer_id,
            restaurant_id,
            address_id,
            items,
            client_total: body.client_total,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(placed)))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct ListOrdersParams {
    /// Page number, starting at 1.
    page: Option<i64>,
    /// Rows per page, clamped to 1..=100. Defaults to 20.
    limit: Option<i64>,
}

#[derive(Serialize, ToSchema)]
struct ListOrdersRes {
    page: i64,
    limit: i64,
    total: usize,
    data: Vec<OrderEntity>,
}

/// List orders, newest first.
#[utoipa::path(
    get,
    path = "/orders",
    tags = ["Orders"],
    params(ListOrdersParams),
    responses(
        (status = 200, description = "List orders", body = ListOrdersRes),
        (status = 400, description = "VALIDATION_ERROR", body = ErrorBody)
    )
)]
async fn get_orders(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListOrdersParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = Page::new(params.page, params.limit);
    let data = state.orders.list(page).await?;

    Ok(Json(ListOrdersRes {
        page: page.page,
        limit: page.limit,
        total: data.len(),
        data,
    }))
}

/// Fetch a specific order with its line items.
#[utoipa::path(
    get,
    path = "/orders/{order_id}",
    tags = ["Orders"],
    params(
        ("order_id" = i32, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = OrderWithItems),
        (status = 404, description = "NOT_FOUND", body = ErrorBody)
    )
)]
async fn get_order(
    State(state): State<AppState>,
    AppPath(order_id): AppPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let order = state
        .orders
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    Ok(Json(order))
}

/// Overwrite `order_status` and/or `payment_status`. Omitted fields keep
/// their current value.
#[utoipa::path(
    patch,
    path = "/orders/{order_id}",
    tags = ["Orders"],
    params(
        ("order_id" = i32, Path, description = "Order ID to update")
    ),
    request_body = OrderStatusChangeset,
    responses(
        (status = 200, description = "Updated order", body = OrderEntity),
        (status = 400, description = "VALIDATION_ERROR", body = ErrorBody),
        (status = 404, description = "NOT_FOUND", body = ErrorBody)
    )
)]
async fn update_order(
    State(state): State<AppState>,
    AppPath(order_id): AppPath<i32>,
    AppJson(changes): AppJson<OrderStatusChangeset>,
) -> Result<impl IntoResponse, AppError> {
    if changes.is_empty() {
        return Err(AppError::Validation(
            "Provide order_status or payment_status to update".into(),
        ));
    }

    let updated = state
        .orders
        .update_statuses(order_id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    Ok(Json(updated))
}
