// src/handlers/stats.rs

use std::convert::Infallible;

use axum::{
    Extension, Json,
    extract::State,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::StreamExt;

use crate::{error::AppError, stats::StatsRepository, utils::jwt::Claims};

/// Current user's aggregate statistics.
pub async fn get_stats(
    State(stats): State<StatsRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(stats.current(&claims.sub).await?))
}

/// Live statistics as Server-Sent Events.
///
/// The first `stats` event carries the current aggregate, then one follows
/// every change. The store listener lives exactly as long as the connection.
pub async fn live_stats(
    State(stats): State<StatsRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let subscription = stats.subscribe(&claims.sub).await?;

    let events = subscription.into_stream().map(|item| {
        let event = match item {
            Ok(snapshot) => Event::default()
                .event("stats")
                .json_data(&snapshot)
                .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())),
            Err(e) => Event::default().event("error").data(e.message()),
        };
        Ok::<_, Infallible>(event)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
