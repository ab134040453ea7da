//! Request handlers for the Byte Service.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use byte_core::{QuizOutput, QuizRequest, VERSION};

use crate::{AppState, Result, ServiceError};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// `GET /`: service identity and status.
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Byte Server",
        "version": VERSION,
        "status": "ok"
    }))
}

/// `GET /health`: liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /quiz/generate`: generate a programming quiz.
///
/// Responds with a JSON array of questions, the raw model text when it could
/// not be parsed, or a plain-text stream when the request asks for one.
pub async fn generate_quiz(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QuizRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|rejection| ServiceError::MalformedRequestBody(rejection.body_text()))?;

    let request_id = Uuid::new_v4();
    let span = info_span!(
        "generate_quiz",
        %request_id,
        lang = %request.language,
        num_questions = request.num_questions,
        stream = request.stream
    );

    async move {
        info!("Received quiz request");

        let response = match state.generator.generate(&request).await? {
            QuizOutput::Questions(questions) => {
                info!("Returning {} questions", questions.len());
                Json(questions).into_response()
            }
            QuizOutput::Raw(text) => {
                warn!("Returning unparsed model output as plain text");
                text_response(Body::from(text))
            }
            QuizOutput::Stream(chunks) => {
                info!("Streaming model output");
                text_response(Body::from_stream(chunks.map(Ok::<_, Infallible>)))
            }
        };

        Ok::<_, ServiceError>(response)
    }
    .instrument(span)
    .await
}

fn text_response(body: Body) -> Response {
    let mut response = Response::new(body);
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    response
}
