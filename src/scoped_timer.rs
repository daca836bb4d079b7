use tokio::time::Instant;
use tracing::trace;

use crate::metrics::REQUEST_DURATION_SECONDS;

/// Measures one logical operation from creation to drop
///
/// The elapsed time lands in [`REQUEST_DURATION_SECONDS`] under the
/// operation's label and is traced on the `timing` target.
pub(crate) struct ScopedTimer {
    start: Instant,
    op: &'static str,
}

impl ScopedTimer {
    pub(crate) fn new(op: &'static str) -> Self {
        Self {
            start: Instant::now(),
            op,
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        REQUEST_DURATION_SECONDS
            .with_label_values(&[self.op])
            .observe(elapsed.as_secs_f64());
        trace!(target: "timing", "[{}] took {} ms", self.op, elapsed.as_millis());
    }
}
