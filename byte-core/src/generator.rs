//! Quiz generation.
//!
//! The QuizGenerator validates a request, builds the prompt and talks to the
//! chat model in one of two modes:
//! - streaming: model text is forwarded chunk by chunk as it arrives
//! - aggregate: the full text is parsed, repaired if needed, and validated
//!
//! Errors in streaming mode never surface as a failed call, since by then
//! the response has already started. They are appended to the text instead.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, error, warn};

use crate::chat::{ChatError, ChatMessage, ChatModel};
use crate::error::{QuizError, Result};
use crate::parse;
use crate::prompt;
use crate::quiz::{Question, QuizRequest, DEFAULT_MODEL};

/// Prefix of the in-band marker that terminates a failed stream.
pub const STREAM_ERROR_MARKER: &str = "[error]";

/// Quiz text forwarded to the caller in streaming mode.
pub type QuizTextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// The result of a successful generate call.
pub enum QuizOutput {
    /// Questions parsed and validated from the model output
    Questions(Vec<Question>),

    /// Model output that could not be parsed as JSON, returned verbatim
    Raw(String),

    /// Model output forwarded as it is produced
    Stream(QuizTextStream),
}

impl fmt::Debug for QuizOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizOutput::Questions(questions) => f.debug_tuple("Questions").field(questions).finish(),
            QuizOutput::Raw(text) => f.debug_tuple("Raw").field(text).finish(),
            QuizOutput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Generates quizzes through an injected chat model.
pub struct QuizGenerator {
    /// Long-lived handle to the upstream chat model
    chat: Arc<dyn ChatModel>,
    /// Model used when a request does not name one
    default_model: String,
    /// Upper bound on a single upstream call (None waits indefinitely)
    timeout: Option<Duration>,
}

impl QuizGenerator {
    /// Create a generator with the default model and no timeout.
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self {
            chat,
            default_model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Generate a quiz for the given request.
    ///
    /// Validation happens before any upstream call. In streaming mode the
    /// returned stream opens the upstream connection when first polled.
    pub async fn generate(&self, request: &QuizRequest) -> Result<QuizOutput> {
        let plan = request.validate(&self.default_model)?;
        let messages = prompt::build_messages(&plan);

        debug!(
            "Generating {} {} questions for {} with model {} (stream: {})",
            plan.num_questions, plan.difficulty, plan.language, plan.model, plan.stream
        );

        if plan.stream {
            return Ok(QuizOutput::Stream(self.stream_quiz(plan.model, messages)));
        }

        self.complete_quiz(&plan.model, &messages).await
    }

    async fn complete_quiz(&self, model: &str, messages: &[ChatMessage]) -> Result<QuizOutput> {
        let response = call_with_timeout(self.timeout, self.chat.chat(model, messages))
            .await
            .map_err(|e| {
                error!("Chat model call failed: {}", e);
                QuizError::from(e)
            })?;

        let content = match response.content() {
            Some(content) if !content.is_empty() => content,
            _ => return Err(QuizError::EmptyUpstreamResponse),
        };

        match parse::parse_with_repair(content) {
            Some(value) => {
                let questions = parse::questions_from_value(value).map_err(|e| {
                    warn!("Model output does not match the question schema: {:?}", e);
                    e
                })?;
                Ok(QuizOutput::Questions(questions))
            }
            None => {
                warn!("Model output is not JSON, returning {} bytes of raw text", content.len());
                Ok(QuizOutput::Raw(content.to_string()))
            }
        }
    }

    fn stream_quiz(&self, model: String, messages: Vec<ChatMessage>) -> QuizTextStream {
        let chat = Arc::clone(&self.chat);
        let timeout = self.timeout;

        let upstream = stream::once(async move {
            call_with_timeout(timeout, chat.chat_stream(&model, &messages)).await
        })
        .flat_map(|opened| match opened {
            Ok(chunks) => chunks,
            Err(e) => stream::iter(vec![Err(e)]).boxed(),
        });

        forward_chunks(upstream).boxed()
    }
}

/// Forward upstream chunks in arrival order.
///
/// Empty chunks are dropped. The first error is turned into a terminal
/// marker and nothing is emitted after it.
pub fn forward_chunks<S>(upstream: S) -> impl Stream<Item = String>
where
    S: Stream<Item = std::result::Result<String, ChatError>>,
{
    upstream
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            let text = match item {
                Ok(text) => text,
                Err(e) => {
                    warn!("Chat stream failed after the response started: {}", e);
                    *failed = true;
                    stream_error_marker(&e)
                }
            };
            future::ready(Some(text))
        })
        .filter(|text| future::ready(!text.is_empty()))
}

/// Text appended to a stream that failed mid-flight.
pub fn stream_error_marker(err: &ChatError) -> String {
    format!("\n\n{} {}", STREAM_ERROR_MARKER, err)
}

async fn call_with_timeout<T, F>(timeout: Option<Duration>, call: F) -> std::result::Result<T, ChatError>
where
    F: Future<Output = std::result::Result<T, ChatError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| ChatError::Timeout(limit))?,
        None => call.await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::chat::{ChatResponse, TextStream};

    enum Reply {
        Text(&'static str),
        Json(Value),
        Fail(ChatError),
        Chunks(Vec<std::result::Result<&'static str, ChatError>>),
        Hang,
    }

    struct ScriptedChat {
        reply: Reply,
        calls: AtomicUsize,
        last_model: Mutex<Option<String>>,
    }

    impl ScriptedChat {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                last_model: Mutex::new(None),
            })
        }

        fn record(&self, model: &str) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_model.lock().unwrap() = Some(model.to_string());
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        async fn chat(&self, model: &str, _messages: &[ChatMessage]) -> std::result::Result<ChatResponse, ChatError> {
            self.record(model);
            match &self.reply {
                Reply::Text(text) => Ok(ChatResponse::from_value(json!({
                    "message": {"role": "assistant", "content": text}
                }))),
                Reply::Json(value) => Ok(ChatResponse::from_value(value.clone())),
                Reply::Fail(e) => Err(e.clone()),
                Reply::Hang => future::pending().await,
                Reply::Chunks(_) => panic!("aggregate call on a streaming script"),
            }
        }

        async fn chat_stream(&self, model: &str, _messages: &[ChatMessage]) -> std::result::Result<TextStream, ChatError> {
            self.record(model);
            match &self.reply {
                Reply::Chunks(chunks) => {
                    let items: Vec<_> = chunks
                        .iter()
                        .map(|chunk| chunk.clone().map(str::to_string))
                        .collect();
                    Ok(stream::iter(items).boxed())
                }
                Reply::Fail(e) => Err(e.clone()),
                Reply::Hang => future::pending().await,
                _ => panic!("streaming call on an aggregate script"),
            }
        }
    }

    fn generator(chat: &Arc<ScriptedChat>) -> QuizGenerator {
        QuizGenerator::new(chat.clone())
    }

    fn stream_request() -> QuizRequest {
        QuizRequest {
            stream: true,
            ..QuizRequest::default()
        }
    }

    #[tokio::test]
    async fn invalid_request_never_calls_upstream() {
        let chat = ScriptedChat::new(Reply::Text("[]"));
        let generator = generator(&chat);

        let bad_difficulty = QuizRequest {
            difficulty: "nightmare".to_string(),
            ..QuizRequest::default()
        };
        let blank_language = QuizRequest {
            language: "   ".to_string(),
            stream: true,
            ..QuizRequest::default()
        };

        for _ in 0..2 {
            let err = generator.generate(&bad_difficulty).await.unwrap_err();
            assert_eq!(err, QuizError::InvalidDifficulty("nightmare".to_string()));
            let err = generator.generate(&blank_language).await.unwrap_err();
            assert_eq!(err, QuizError::EmptyLanguage);
        }

        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clean_array_becomes_questions() {
        let chat = ScriptedChat::new(Reply::Text(
            r#"[{"question":"What is 2+2?","options":["3","4","5"],"answer":"4"}]"#,
        ));

        match generator(&chat).generate(&QuizRequest::default()).await.unwrap() {
            QuizOutput::Questions(questions) => {
                assert_eq!(questions.len(), 1);
                assert_eq!(questions[0].answer, "4");
                assert_eq!(questions[0].options, vec!["3", "4", "5"]);
            }
            other => panic!("expected questions, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn wrapped_array_is_repaired() {
        let chat = ScriptedChat::new(Reply::Text(
            "Sure! Here you go:\n[{\"question\":\"Q1\",\"options\":[\"a\",\"b\"],\"answer\":\"a\"}]\nHope that helps!",
        ));

        match generator(&chat).generate(&QuizRequest::default()).await.unwrap() {
            QuizOutput::Questions(questions) => {
                assert_eq!(questions.len(), 1);
                assert_eq!(questions[0].question, "Q1");
            }
            other => panic!("expected questions, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn prose_is_returned_raw() {
        let chat = ScriptedChat::new(Reply::Text("I cannot comply."));

        match generator(&chat).generate(&QuizRequest::default()).await.unwrap() {
            QuizOutput::Raw(text) => assert_eq!(text, "I cannot comply."),
            other => panic!("expected raw text, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_answer_is_schema_mismatch() {
        let chat = ScriptedChat::new(Reply::Text(
            r#"[{"question":"Q1","options":["a","b"]}]"#,
        ));

        let err = generator(&chat).generate(&QuizRequest::default()).await.unwrap_err();
        assert!(matches!(err, QuizError::SchemaMismatch(_)));
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let chat = ScriptedChat::new(Reply::Text(""));
        let err = generator(&chat).generate(&QuizRequest::default()).await.unwrap_err();
        assert_eq!(err, QuizError::EmptyUpstreamResponse);

        let chat = ScriptedChat::new(Reply::Json(json!({"done": true})));
        let err = generator(&chat).generate(&QuizRequest::default()).await.unwrap_err();
        assert_eq!(err, QuizError::EmptyUpstreamResponse);
    }

    #[tokio::test]
    async fn mapping_response_content_is_used() {
        let chat = ScriptedChat::new(Reply::Json(json!({
            "message": {"role": "oracle", "content": "[{\"question\":\"Q\",\"options\":[\"x\"],\"answer\":\"x\"}]"}
        })));

        let output = generator(&chat).generate(&QuizRequest::default()).await.unwrap();
        assert!(matches!(output, QuizOutput::Questions(ref q) if q.len() == 1));
    }

    #[tokio::test]
    async fn upstream_failure_is_reported() {
        let chat = ScriptedChat::new(Reply::Fail(ChatError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        }));

        let err = generator(&chat).generate(&QuizRequest::default()).await.unwrap_err();
        assert_eq!(err.code(), "upstream_call_failed");
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let chat = ScriptedChat::new(Reply::Hang);
        let generator = generator(&chat).with_timeout(Some(Duration::from_millis(20)));

        let err = generator.generate(&QuizRequest::default()).await.unwrap_err();
        assert!(matches!(err, QuizError::UpstreamCallFailed(ref msg) if msg.contains("timed out after 20ms")));
    }

    #[tokio::test]
    async fn default_model_fills_missing_model() {
        let chat = ScriptedChat::new(Reply::Text("[]"));
        let generator = generator(&chat).with_default_model("llama3.2");

        generator.generate(&QuizRequest::default()).await.unwrap();
        assert_eq!(chat.last_model.lock().unwrap().as_deref(), Some("llama3.2"));

        let request = QuizRequest {
            model: Some("qwen3".to_string()),
            ..QuizRequest::default()
        };
        generator.generate(&request).await.unwrap();
        assert_eq!(chat.last_model.lock().unwrap().as_deref(), Some("qwen3"));
    }

    async fn collect(output: QuizOutput) -> Vec<String> {
        match output {
            QuizOutput::Stream(stream) => stream.collect().await,
            other => panic!("expected a stream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn stream_forwards_chunks_in_order() {
        let chunks = vec![Ok("[{\"question\":"), Ok(""), Ok("\"Q\"}"), Ok("]")];
        let chat = ScriptedChat::new(Reply::Chunks(chunks));

        let output = generator(&chat).generate(&stream_request()).await.unwrap();
        let received = collect(output).await;

        assert_eq!(received, vec!["[{\"question\":", "\"Q\"}", "]"]);
        assert_eq!(received.concat(), "[{\"question\":\"Q\"}]");
        assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stream_error_becomes_terminal_marker() {
        let chunks = vec![
            Ok("partial"),
            Err(ChatError::Upstream("model crashed".to_string())),
            Ok("never sent"),
        ];
        let chat = ScriptedChat::new(Reply::Chunks(chunks));

        let output = generator(&chat).generate(&stream_request()).await.unwrap();
        let received = collect(output).await;

        assert_eq!(received, vec!["partial".to_string(), "\n\n[error] model crashed".to_string()]);
    }

    #[tokio::test]
    async fn stream_open_failure_is_reported_in_band() {
        let chat = ScriptedChat::new(Reply::Fail(ChatError::Request("connection refused".to_string())));

        let output = generator(&chat).generate(&stream_request()).await.unwrap();
        let received = collect(output).await;

        assert_eq!(received.len(), 1);
        assert!(received[0].starts_with("\n\n[error] "));
        assert!(received[0].contains("connection refused"));
    }

    #[tokio::test]
    async fn slow_stream_open_times_out_in_band() {
        let chat = ScriptedChat::new(Reply::Hang);
        let generator = generator(&chat).with_timeout(Some(Duration::from_millis(20)));

        let output = generator.generate(&stream_request()).await.unwrap();
        let received = collect(output).await;

        assert_eq!(received, vec!["\n\n[error] timed out after 20ms".to_string()]);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stream_is_lazy_until_polled() {
        let chat = ScriptedChat::new(Reply::Chunks(vec![Ok("x")]));

        let output = generator(&chat).generate(&stream_request()).await.unwrap();
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);

        collect(output).await;
        assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
    }
}
