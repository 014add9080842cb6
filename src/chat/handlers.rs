//! 网关端点处理器

use std::io;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Json, Response},
};
use futures::{stream, StreamExt};
use http::{header, StatusCode};
use serde_json::json;
use uuid::Uuid;

use crate::error::{AdapterError, AdapterResult};
use crate::provider::{ChatCompletion, Conversation, ProviderKind};
use crate::stream::ChunkStream;

use super::converter::{build_conversation, hint_conversation};
use super::middleware::AppState;
use super::quiz::{build_quiz, check_content, quiz_conversation, MAX_QUESTIONS};
use super::types::{
    ChatRequest, ErrorResponse, GenerateQuizRequest, HintRequest, HintResponse, ModelsResponse,
    StatusResponse,
};

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

fn adapter_error_response(err: &AdapterError) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn rejection_response(rejection: JsonRejection) -> Response {
    tracing::warn!("请求体无效: {}", rejection.body_text());
    error_response(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// POST /api/ollama
///
/// `stream: true` 时返回 NDJSON 流，否则返回完整 JSON
pub async fn post_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    let request_id = Uuid::new_v4();
    let provider = state.adapter.selected();
    tracing::info!(
        request_id = %request_id,
        provider = %provider,
        has_history = !request.history.is_empty(),
        has_material = request.study_material.is_some(),
        has_image = request.image_data.is_some(),
        has_user_data = request.user_data.is_some(),
        stream = request.stream,
        "收到对话请求"
    );

    let streaming = request.stream;
    let conversation = build_conversation(request);

    if streaming {
        match open_stream(&state, provider, &conversation).await {
            Ok((served_by, chunks)) => {
                tracing::info!(request_id = %request_id, provider = %served_by, "开始流式输出");
                ndjson_response(chunks, request_id)
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, "流式对话失败: {}", e);
                adapter_error_response(&e)
            }
        }
    } else {
        match complete(&state, provider, &conversation).await {
            Ok(completion) => Json(completion).into_response(),
            Err(e) => {
                tracing::error!(request_id = %request_id, "对话失败: {}", e);
                adapter_error_response(&e)
            }
        }
    }
}

/// 打开流，Groq 在输出前失败且允许回退时改用 Ollama
async fn open_stream(
    state: &AppState,
    provider: ProviderKind,
    conversation: &Conversation,
) -> AdapterResult<(ProviderKind, ChunkStream)> {
    match start_stream(state, provider, conversation).await {
        Ok(chunks) => Ok((provider, chunks)),
        Err(e) if state.should_fallback(provider, &e) => {
            tracing::warn!("{} 不可用，改用本地模型: {}", provider, e);
            let chunks = start_stream(state, ProviderKind::Ollama, conversation).await?;
            Ok((ProviderKind::Ollama, chunks))
        }
        Err(e) => Err(e),
    }
}

/// 发起请求并预读第一项
///
/// 第一项就是错误说明客户端什么都还没收到，按请求失败处理，
/// 调用方可以返回 500 或回退；预读到的内容块会放回流的开头。
async fn start_stream(
    state: &AppState,
    provider: ProviderKind,
    conversation: &Conversation,
) -> AdapterResult<ChunkStream> {
    let mut chunks = state.adapter.stream_with(provider, conversation).await?;
    match chunks.next().await {
        Some(Err(e)) => Err(e),
        first => {
            let chunks: ChunkStream = Box::pin(stream::iter(first).chain(chunks));
            Ok(chunks)
        }
    }
}

async fn complete(
    state: &AppState,
    provider: ProviderKind,
    conversation: &Conversation,
) -> AdapterResult<ChatCompletion> {
    match state.adapter.complete_with(provider, conversation).await {
        Err(e) if state.should_fallback(provider, &e) => {
            tracing::warn!("{} 不可用，改用本地模型: {}", provider, e);
            state
                .adapter
                .complete_with(ProviderKind::Ollama, conversation)
                .await
        }
        result => result,
    }
}

/// 把块流编码为 NDJSON 响应体
///
/// 流中出现错误时中断响应体，客户端不会收到 `done: true`。
fn ndjson_response(chunks: ChunkStream, request_id: Uuid) -> Response {
    let body = chunks.map(move |item| match item {
        Ok(chunk) => chunk.to_ndjson().map_err(io::Error::other),
        Err(e) => {
            tracing::error!(request_id = %request_id, "流式输出中断: {}", e);
            Err(io::Error::other(e))
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(body))
        .unwrap_or_else(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// GET /api/ai/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.adapter.status().await;
    Json(StatusResponse {
        available: status.available,
        provider: status.provider,
    })
}

/// POST /api/ai/hint
pub async fn post_hint(
    State(state): State<AppState>,
    payload: Result<Json<HintRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    let provider = state.adapter.selected();
    tracing::debug!("生成答题提示: provider={}", provider);

    match complete(&state, provider, &hint_conversation(&request)).await {
        Ok(completion) => Json(HintResponse {
            response: completion.response,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("生成提示失败: {}", e);
            adapter_error_response(&e)
        }
    }
}

/// POST /api/generate-quiz
///
/// 资料为空或过短时返回 400，题目数限制在 1 到 [`MAX_QUESTIONS`] 之间
pub async fn post_generate_quiz(
    State(state): State<AppState>,
    payload: Result<Json<GenerateQuizRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    if let Err(message) = check_content(&request.content) {
        tracing::warn!("拒绝生成测验: {}", message);
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    let count = request.number_of_questions.clamp(1, MAX_QUESTIONS);
    let topic = request
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|topic| !topic.is_empty());
    let provider = state.adapter.selected();
    tracing::info!(
        provider = %provider,
        questions = count,
        content_chars = request.content.chars().count(),
        "生成测验"
    );

    let conversation = quiz_conversation(&request.content, topic, count);
    match complete(&state, provider, &conversation).await {
        Ok(completion) => {
            let quiz = build_quiz(&completion.response, topic, count, &mut fastrand::Rng::new());
            tracing::debug!("测验生成完成: {} 道题", quiz.questions.len());
            Json(quiz).into_response()
        }
        Err(e) => {
            tracing::error!("生成测验失败: {}", e);
            adapter_error_response(&e)
        }
    }
}

/// GET /api/ai/models
pub async fn get_models(State(state): State<AppState>) -> impl IntoResponse {
    Json(ModelsResponse {
        models: state.adapter.local_models().await,
    })
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
