/* src/page/core/rust/src/debounce.rs */

use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::{Instant, sleep_until};

use crate::services::BoxStream;

/// Wait for the next burst on `stream` and return its last item once
/// `window` passes without a newer one. `None` once the stream ends with
/// nothing pending.
pub(crate) async fn next_settled<T>(stream: &mut BoxStream<T>, window: Duration) -> Option<T> {
  let mut latest = stream.next().await?;
  let sleep = sleep_until(Instant::now() + window);
  tokio::pin!(sleep);

  loop {
    tokio::select! {
      _ = &mut sleep => return Some(latest),
      maybe = stream.next() => match maybe {
        Some(item) => {
          latest = item;
          sleep.as_mut().reset(Instant::now() + window);
        }
        None => return Some(latest),
      },
    }
  }
}
