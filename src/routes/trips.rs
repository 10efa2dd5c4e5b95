use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::AppError,
    models::{
        passenger::{NewPassenger, PaymentStatus},
        search::TripSearch,
        trip::{NewTrip, Trip, TripStatus, TripView},
    },
    state::AppState,
};

pub fn router(enable_seed: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/trips", get(list_trips).post(create_trip))
        .route("/trips/search", get(search_trips))
        .route("/trips/:id", get(get_trip))
        .route("/trips/:id/status", put(update_status))
        .route("/trips/:id/passengers", post(book_seat))
        .route(
            "/trips/:id/passengers/:passenger_id/confirm",
            post(confirm_passenger),
        )
        .route(
            "/trips/:id/passengers/:passenger_id/cancel",
            post(cancel_passenger),
        )
        .route(
            "/trips/:id/passengers/:passenger_id/payment",
            put(update_payment),
        );

    if enable_seed {
        router.route("/trips/seed", post(seed_trips))
    } else {
        router
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn views(trips: Vec<Trip>) -> Vec<TripView> {
    trips.into_iter().map(TripView::from).collect()
}

async fn list_trips(State(state): State<AppState>) -> Result<Json<Vec<TripView>>, AppError> {
    let trips = state.ledger.list_trips().await?;
    Ok(Json(views(trips)))
}

async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TripView>, AppError> {
    let trip = state.ledger.get_trip(&id).await?;
    Ok(Json(trip.view()))
}

async fn search_trips(
    State(state): State<AppState>,
    query: Result<Query<TripSearch>, QueryRejection>,
) -> Result<Json<Vec<TripView>>, AppError> {
    let Query(search) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let trips = state.ledger.search_trips(search).await?;
    Ok(Json(views(trips)))
}

async fn create_trip(
    State(state): State<AppState>,
    payload: Result<Json<NewTrip>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let trip = state.ledger.create_trip(body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(trip.view())))
}

async fn book_seat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NewPassenger>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let trip = state.ledger.book_seat(&id, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(trip.view())))
}

async fn confirm_passenger(
    State(state): State<AppState>,
    Path((id, passenger_id)): Path<(String, String)>,
) -> Result<Json<TripView>, AppError> {
    let trip = state.ledger.confirm_passenger(&id, &passenger_id).await?;
    Ok(Json(trip.view()))
}

async fn cancel_passenger(
    State(state): State<AppState>,
    Path((id, passenger_id)): Path<(String, String)>,
) -> Result<Json<TripView>, AppError> {
    let trip = state.ledger.cancel_passenger(&id, &passenger_id).await?;
    Ok(Json(trip.view()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentUpdate {
    payment_status: PaymentStatus,
}

async fn update_payment(
    State(state): State<AppState>,
    Path((id, passenger_id)): Path<(String, String)>,
    payload: Result<Json<PaymentUpdate>, JsonRejection>,
) -> Result<Json<TripView>, AppError> {
    let update = body(payload)?;
    let trip = state
        .ledger
        .update_payment_status(&id, &passenger_id, update.payment_status)
        .await?;
    Ok(Json(trip.view()))
}

#[derive(Deserialize)]
struct StatusUpdate {
    status: TripStatus,
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<TripView>, AppError> {
    let update = body(payload)?;
    let trip = state.ledger.update_trip_status(&id, update.status).await?;
    Ok(Json(trip.view()))
}

async fn seed_trips(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let trips = views(state.ledger.seed_demo_trips().await?);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "demo trips loaded",
            "count": trips.len(),
            "trips": trips,
        })),
    ))
}
