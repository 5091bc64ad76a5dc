//! Per-chat message queues.
//!
//! Messages from one chat are handled one at a time in arrival order, so a
//! conversation step always sees the state left by the message before it.
//! Different chats run concurrently on their own tasks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error};

use crate::conversation::Controller;
use crate::telegram::{ChatId, ChatTransport};

type Queues = Arc<Mutex<HashMap<ChatId, UnboundedSender<String>>>>;

/// Feeds incoming texts to a [`Controller`], one worker task per busy chat.
pub struct Dispatcher<T> {
    controller: Arc<Controller<T>>,
    queues: Queues,
}

impl<T: ChatTransport + 'static> Dispatcher<T> {
    pub fn new(controller: Controller<T>) -> Self {
        Self {
            controller: Arc::new(controller),
            queues: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn controller(&self) -> &Controller<T> {
        &self.controller
    }

    /// Number of chats with a worker still draining its queue.
    pub fn active_chats(&self) -> usize {
        lock(&self.queues).len()
    }

    /// Queue `text` for `chat_id`.
    ///
    /// Must be called in the order messages arrived; it never waits.
    pub fn dispatch(&self, chat_id: ChatId, text: String) {
        let mut queues = lock(&self.queues);

        let text = match queues.get(&chat_id) {
            Some(tx) => match tx.send(text) {
                Ok(()) => return,
                // The worker died without deregistering; start a new one.
                Err(mpsc::error::SendError(text)) => text,
            },
            None => text,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(text);
        queues.insert(chat_id, tx);
        drop(queues);

        debug!("Starting worker for chat {}", chat_id);
        tokio::spawn(drain(
            Arc::clone(&self.controller),
            Arc::clone(&self.queues),
            chat_id,
            rx,
        ));
    }
}

async fn drain<T: ChatTransport>(
    controller: Arc<Controller<T>>,
    queues: Queues,
    chat_id: ChatId,
    mut rx: UnboundedReceiver<String>,
) {
    loop {
        // Checked under the map lock so a message is never queued on a
        // channel the worker is about to drop.
        let next = {
            let mut queues = lock(&queues);
            match rx.try_recv() {
                Ok(text) => Some(text),
                Err(_) => {
                    queues.remove(&chat_id);
                    None
                }
            }
        };
        let Some(text) = next else {
            return;
        };

        if let Err(e) = controller.handle_text(chat_id, &text).await {
            error!("Failed to reply in chat {}: {}", chat_id, e);
        }
    }
}

fn lock(queues: &Queues) -> MutexGuard<'_, HashMap<ChatId, UnboundedSender<String>>> {
    queues.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiSettings;
    use crate::conversation::{SessionState, API_KEY_SAVED};
    use crate::lookup::LookupClient;
    use crate::testing::{CannedResponse, RecordingTransport, TestServer};
    use serde_json::json;
    use std::time::Duration;

    fn dispatcher(url: &str, key: &str) -> Dispatcher<RecordingTransport> {
        let lookup = LookupClient::new(
            reqwest::Client::new(),
            ApiSettings::new(url, key),
            Duration::from_secs(5),
        );
        Dispatcher::new(Controller::new(RecordingTransport::default(), lookup))
    }

    async fn wait_idle(dispatcher: &Dispatcher<RecordingTransport>) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while dispatcher.active_chats() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("chat workers did not finish");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_setapi_and_key_in_one_batch_stay_ordered() {
        let server =
            TestServer::start(CannedResponse::json(200, json!({"results": []}))).await;
        let dispatcher = dispatcher(&server.url(), "old-key");

        for chat in 0..300 {
            dispatcher.dispatch(chat, "/setapi".to_string());
            dispatcher.dispatch(chat, "newkey123".to_string());
        }
        wait_idle(&dispatcher).await;

        let controller = dispatcher.controller();
        assert_eq!(server.hits(), 0, "a key was sent as a search query");
        for chat in 0..300 {
            assert_eq!(controller.session_state(chat), SessionState::Idle);
            let texts = controller.transport().texts_for(chat);
            assert_eq!(texts.len(), 2);
            assert_eq!(texts[1], API_KEY_SAVED);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_search_conversation_in_one_batch() {
        let server =
            TestServer::start(CannedResponse::json(200, json!({"results": []}))).await;
        let dispatcher = dispatcher(&server.url(), "k");

        dispatcher.dispatch(1, "/search".to_string());
        dispatcher.dispatch(1, "a@b.com".to_string());
        dispatcher.dispatch(1, "/setapi".to_string());
        dispatcher.dispatch(1, "fresh-key".to_string());
        dispatcher.dispatch(1, "127.0.0.1".to_string());
        wait_idle(&dispatcher).await;

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].json()["query"], "a@b.com");
        assert_eq!(requests[0].header("authorization"), Some("Bearer k"));
        assert_eq!(requests[1].json()["query"], "127.0.0.1");
        assert_eq!(requests[1].header("authorization"), Some("Bearer fresh-key"));
        assert_eq!(dispatcher.controller().session_state(1), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_worker_restarts_after_queue_drains() {
        let server =
            TestServer::start(CannedResponse::json(200, json!({"results": []}))).await;
        let dispatcher = dispatcher(&server.url(), "k");

        dispatcher.dispatch(5, "/search".to_string());
        wait_idle(&dispatcher).await;
        assert_eq!(
            dispatcher.controller().session_state(5),
            SessionState::AwaitingSearch
        );

        dispatcher.dispatch(5, "Petrov Ivan".to_string());
        wait_idle(&dispatcher).await;
        assert_eq!(server.hits(), 1);
        assert_eq!(dispatcher.controller().session_state(5), SessionState::Idle);
    }
}
