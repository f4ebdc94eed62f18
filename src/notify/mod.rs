pub mod chunk;
pub mod line;
pub mod message;

use crate::error::DeliveryError;
use async_trait::async_trait;
use tracing::{error, info};

pub use chunk::chunk_entries;
pub use line::LineNotifier;

/// Outbound message transport
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message. Callers keep `text` within the transport limit.
    async fn deliver(&self, text: &str) -> Result<(), DeliveryError>;

    fn transport_name(&self) -> &'static str;
}

/// Outcome of a successful dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Sent { chunks: usize },
    DryRun { chunks: usize },
}

/// Chunks entries and hands them to a notifier, one message per chunk
pub struct Dispatcher {
    notifier: Option<Box<dyn Notifier>>,
    dry_run: bool,
    max_chars: usize,
}

impl Dispatcher {
    /// `notifier` is `None` when credentials are missing
    pub fn new(notifier: Option<Box<dyn Notifier>>, dry_run: bool, max_chars: usize) -> Self {
        Self {
            notifier,
            dry_run,
            max_chars,
        }
    }

    pub async fn dispatch<S: AsRef<str>>(&self, entries: &[S]) -> Result<Dispatched, DeliveryError> {
        let chunks = chunk_entries(entries, self.max_chars);

        if self.dry_run {
            info!("Dry run, not sending {} message(s)", chunks.len());
            for (idx, chunk) in chunks.iter().enumerate() {
                info!("--- message {}/{} ---\n{}", idx + 1, chunks.len(), chunk);
            }
            return Ok(Dispatched::DryRun { chunks: chunks.len() });
        }

        let Some(notifier) = self.notifier.as_deref() else {
            error!("No notifier configured, set LINE_CHANNEL_ACCESS_TOKEN and a recipient");
            return Err(DeliveryError::MissingCredentials("LINE_CHANNEL_ACCESS_TOKEN"));
        };

        if chunks.len() > 1 {
            info!("Message too long, splitting into {} parts", chunks.len());
        }
        for (idx, chunk) in chunks.iter().enumerate() {
            if let Err(e) = notifier.deliver(chunk).await {
                error!(
                    "{} delivery failed on part {}/{}: {}",
                    notifier.transport_name(),
                    idx + 1,
                    chunks.len(),
                    e
                );
                return Err(e);
            }
        }

        info!("Sent {} message(s) via {}", chunks.len(), notifier.transport_name());
        Ok(Dispatched::Sent { chunks: chunks.len() })
    }
}
