use std::time::Duration;

use tracing::{debug, info, warn};

use soulmatch_types::transport::ChatTransport;

use crate::dispatcher::Dispatcher;
use crate::telegram::TelegramClient;
use crate::updates;

/// Pause after a failed getUpdates before trying again.
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Long-poll Telegram forever, queueing every update with the dispatcher.
/// Only returns if the surrounding task is dropped.
pub async fn run<T: ChatTransport>(
    client: TelegramClient,
    dispatcher: Dispatcher<T>,
    poll_timeout: Duration,
) {
    info!("Polling for updates (timeout {}s)", poll_timeout.as_secs());
    let mut offset = 0;

    loop {
        let batch = match client.get_updates(offset, poll_timeout).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!("getUpdates failed: {}, retrying in {}s", e, RETRY_DELAY.as_secs());
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        if !batch.is_empty() {
            debug!("Received {} updates", batch.len());
        }

        for update in batch {
            offset = offset.max(update.update_id + 1);
            updates::ingest(&client, &dispatcher, update).await;
        }
    }
}
