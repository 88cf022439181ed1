//! Concurrent streaming query pipeline
//!
//! Each query first probes the response cache on the calling task; a hit
//! is answered immediately without a worker. On a miss a producer task
//! is drawn from a bounded pool, runs the routed engine, and relays
//! tokens in order through a bounded hand-off channel while the caller
//! pulls them. The producer also performs the terminal bookkeeping:
//! the assistant turn is appended to history exactly once per query
//! (the full answer, the fixed apology, or the error text), and only
//! completed answers are written to the cache.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, Mutex, Semaphore};
use tracing::{debug, error, info};

use super::engine::{QueryTransformation, StoreChoice, TokenStream};
use super::router::QueryRouter;
use crate::cache::ResponseCache;
use crate::config::ChatSettings;
use crate::history::{ChatHistory, ChatMessage};

/// Answer substituted when a completed stream produced no text, so the
/// cache never stores an empty string
pub const EMPTY_RESPONSE_APOLOGY: &str =
    "I apologize, but I couldn't generate a response to your question.";

/// One unit of streamed output
///
/// A well-formed stream is zero or more `Chunk`s followed by exactly one
/// terminal: `Done` after normal completion, or `Error` carrying the
/// failure text with nothing after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamToken {
    /// A text fragment, in production order
    Chunk(String),
    /// Terminal failure; the stream ends here
    Error(String),
    /// End-of-stream marker after normal completion
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Started,
    Streaming,
    Completed,
    Failed,
}

/// Pull-based consumer side of the hand-off channel
///
/// Finite: ends after the terminal token. Dropping it abandons the
/// query; the producer is not cancelled and still finishes its
/// bookkeeping, its remaining tokens simply go unconsumed.
pub struct ResponseStream {
    receiver: mpsc::Receiver<StreamToken>,
}

impl ResponseStream {
    fn new(receiver: mpsc::Receiver<StreamToken>) -> Self {
        Self { receiver }
    }

    /// Plain text view for the boundary layer: chunk text in order, with
    /// error text as the final fragment on the failure path
    pub fn into_text_stream(self) -> impl Stream<Item = String> {
        self.filter_map(|token| async move {
            match token {
                StreamToken::Chunk(text) => Some(text),
                StreamToken::Error(text) => Some(text),
                StreamToken::Done => None,
            }
        })
    }

    /// Drain the stream and concatenate its text
    pub async fn collect_text(self) -> String {
        self.into_text_stream().collect::<String>().await
    }
}

impl Stream for ResponseStream {
    type Item = StreamToken;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Runs queries end to end: cache probe, routing, streaming relay,
/// history and cache write-back
pub struct StreamingPipeline {
    router: Arc<QueryRouter>,
    cache: Arc<ResponseCache>,
    history: Arc<Mutex<ChatHistory>>,
    workers: Arc<Semaphore>,
    stream_buffer: usize,
    context_preamble: String,
}

impl StreamingPipeline {
    /// Create a pipeline over shared history and cache instances
    pub fn new(
        settings: &ChatSettings,
        router: Arc<QueryRouter>,
        cache: Arc<ResponseCache>,
        history: Arc<Mutex<ChatHistory>>,
    ) -> Self {
        Self {
            router,
            cache,
            history,
            workers: Arc::new(Semaphore::new(settings.worker_pool_size)),
            stream_buffer: settings.stream_buffer,
            context_preamble: settings.context_preamble.clone(),
        }
    }

    /// Answer a question as an ordered, finite token stream
    ///
    /// The cache probe happens before this returns; everything after a
    /// miss runs on a pooled producer task that the returned stream
    /// pulls from.
    pub async fn query(
        &self,
        question: &str,
        transformation: QueryTransformation,
        store_choice: StoreChoice,
    ) -> ResponseStream {
        // The hit path enqueues two tokens with no consumer attached yet
        let (tx, rx) = mpsc::channel(self.stream_buffer.max(2));

        if let Some(cached) = self.cache.get(question).await {
            info!("Returning cached response");
            let mut history = self.history.lock().await;
            history.append(ChatMessage::user(question));
            history.append(ChatMessage::assistant(cached.clone()));
            drop(history);

            let _ = tx.send(StreamToken::Chunk(cached)).await;
            let _ = tx.send(StreamToken::Done).await;
            return ResponseStream::new(rx);
        }

        self.history
            .lock()
            .await
            .append(ChatMessage::user(question));
        let context = self.build_context(question).await;

        let permit = match self.workers.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // Only possible if the pool was closed; fail the query
                // rather than hang the caller
                let message = "Error processing query: worker pool closed".to_string();
                error!("{}", message);
                self.history
                    .lock()
                    .await
                    .append(ChatMessage::assistant(message.clone()));
                let _ = tx.send(StreamToken::Error(message)).await;
                return ResponseStream::new(rx);
            }
        };

        let worker = QueryWorker {
            router: self.router.clone(),
            cache: self.cache.clone(),
            history: self.history.clone(),
            question: question.to_string(),
            transformation,
            store_choice,
        };
        tokio::spawn(async move {
            let _permit = permit;
            worker.run(context, tx).await;
        });

        ResponseStream::new(rx)
    }

    async fn build_context(&self, question: &str) -> String {
        let transcript = self.history.lock().await.transcript();
        format!(
            "{}\n{}\nCurrent question: {}\n",
            self.context_preamble, transcript, question
        )
    }
}

/// Producer side of one in-flight query
struct QueryWorker {
    router: Arc<QueryRouter>,
    cache: Arc<ResponseCache>,
    history: Arc<Mutex<ChatHistory>>,
    question: String,
    transformation: QueryTransformation,
    store_choice: StoreChoice,
}

impl QueryWorker {
    async fn run(self, context: String, tx: mpsc::Sender<StreamToken>) {
        let mut state = StreamState::Started;

        let mut tokens: TokenStream = match self
            .router
            .route(&context, self.transformation, self.store_choice)
            .await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                self.fail(format!("Error processing query: {}", e), &tx, false)
                    .await;
                return;
            }
        };

        let mut pieces: Vec<String> = Vec::new();
        let mut disconnected = false;

        while let Some(item) = tokens.next().await {
            match item {
                Ok(chunk) => {
                    if chunk.trim().is_empty() {
                        continue;
                    }
                    if state == StreamState::Started {
                        state = StreamState::Streaming;
                        debug!("Streaming started for: {}", self.question);
                    }
                    pieces.push(chunk.clone());
                    if !disconnected && tx.send(StreamToken::Chunk(chunk)).await.is_err() {
                        // Consumer abandoned the query; keep draining so
                        // history and cache still see a terminated run
                        disconnected = true;
                        debug!("Consumer disconnected, draining source");
                    }
                }
                Err(e) => {
                    self.fail(format!("Error processing query: {}", e), &tx, disconnected)
                        .await;
                    return;
                }
            }
        }

        let mut complete = pieces.concat();
        if complete.is_empty() {
            complete = EMPTY_RESPONSE_APOLOGY.to_string();
            if !disconnected
                && tx
                    .send(StreamToken::Chunk(complete.clone()))
                    .await
                    .is_err()
            {
                disconnected = true;
            }
        }

        state = StreamState::Completed;
        debug!("Query finished in state {:?}", state);

        self.history
            .lock()
            .await
            .append(ChatMessage::assistant(complete.clone()));
        self.cache.put(&self.question, &complete).await;

        if !disconnected {
            let _ = tx.send(StreamToken::Done).await;
        }
    }

    /// Relay one error token, record the error text as the assistant
    /// turn, and end the stream; failed runs are never cached
    async fn fail(&self, message: String, tx: &mpsc::Sender<StreamToken>, disconnected: bool) {
        error!("{}", message);
        debug!("Query finished in state {:?}", StreamState::Failed);
        if !disconnected {
            let _ = tx.send(StreamToken::Error(message.clone())).await;
        }
        self.history
            .lock()
            .await
            .append(ChatMessage::assistant(message));
    }
}
