//! Conversation sessions.
//!
//! A session keeps the last few question/answer exchanges so follow-up
//! questions can be answered in context.

use crate::error::{Result, SyllabusError};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Source of prior-turn text for a session.
pub trait HistoryProvider: Send + Sync {
    /// Start a new session and return its id.
    fn create_session(&self) -> Result<String>;

    /// Prior exchanges formatted for the model, if the session has any.
    fn history(&self, session_id: &str) -> Result<Option<String>>;

    /// Record a finished exchange. `query` is the question as the user asked it.
    fn add_exchange(&self, session_id: &str, query: &str, answer: &str) -> Result<()>;

    /// Forget a session's exchanges, keeping its id usable.
    fn clear_session(&self, session_id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Exchange {
    query: String,
    answer: String,
}

/// In-memory sessions with a bounded exchange window.
pub struct SessionManager {
    max_history: usize,
    sessions: Mutex<HashMap<String, Vec<Exchange>>>,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<Exchange>>>> {
        self.sessions
            .lock()
            .map_err(|_| SyllabusError::Rag("session lock poisoned".to_string()))
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(2)
    }
}

impl HistoryProvider for SessionManager {
    fn create_session(&self) -> Result<String> {
        let id = format!("session_{}", Uuid::new_v4().simple());
        self.lock()?.insert(id.clone(), Vec::new());
        debug!("Created session {}", id);
        Ok(id)
    }

    fn history(&self, session_id: &str) -> Result<Option<String>> {
        let sessions = self.lock()?;
        let Some(exchanges) = sessions.get(session_id).filter(|e| !e.is_empty()) else {
            return Ok(None);
        };

        let text = exchanges
            .iter()
            .map(|e| format!("User: {}\nAssistant: {}", e.query, e.answer))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Some(text))
    }

    fn add_exchange(&self, session_id: &str, query: &str, answer: &str) -> Result<()> {
        let mut sessions = self.lock()?;
        let exchanges = sessions.entry(session_id.to_string()).or_default();
        exchanges.push(Exchange {
            query: query.to_string(),
            answer: answer.to_string(),
        });

        if exchanges.len() > self.max_history {
            let excess = exchanges.len() - self.max_history;
            exchanges.drain(..excess);
        }
        Ok(())
    }

    fn clear_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.lock()?;
        match sessions.get_mut(session_id) {
            Some(exchanges) => {
                exchanges.clear();
                debug!("Cleared session {}", session_id);
                Ok(())
            }
            None => Err(SyllabusError::SessionNotFound(session_id.to_string())),
        }
    }
}
