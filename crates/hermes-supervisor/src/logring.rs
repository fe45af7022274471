use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Maximum number of stdout/stderr lines kept per backend child.
const MAX_LOG_LINES: usize = 2000;

#[derive(Debug, Clone)]
pub struct LogLine {
    pub is_stderr: bool,
    pub text: String,
}

/// Ring buffer of recent child stdout/stderr lines, kept for diagnostics.
pub(crate) struct LogRing {
    lines: Mutex<VecDeque<LogLine>>,
}

impl LogRing {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)),
        }
    }

    pub async fn push(&self, is_stderr: bool, text: String) {
        let mut lines = self.lines.lock().await;
        if lines.len() >= MAX_LOG_LINES {
            lines.pop_front();
        }
        lines.push_back(LogLine { is_stderr, text });
    }

    pub async fn snapshot(&self) -> Vec<LogLine> {
        self.lines.lock().await.iter().cloned().collect()
    }
}
