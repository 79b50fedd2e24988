//! Completion and timeout coordination for one invocation.

use crate::adapter::Responder;
use crate::chain::{ChainApp, Done, InvocationContext, Signal};
use crate::http::{ChainRequest, Envelope, ResponseRecord, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Ceiling on how long a chain may run before the invocation is forced
/// to a gateway-timeout response.
pub const DEFAULT_CHAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs the chain application for one invocation and resolves it
/// exactly once.
///
/// The chain has two independent "done" paths — a finalizing write on
/// the responder and the completion callback — which funnel into a
/// single ordered channel, so whichever fires first wins regardless of
/// how the signals interleave. A bounded wait caps the whole
/// invocation; dropping the expired wait releases its timer. The chain
/// itself runs as its own task so a suspended chain never blocks the
/// host from serving other invocations.
pub struct Dispatcher {
    app: Arc<dyn ChainApp>,
    timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher around the shared chain application.
    pub fn new(app: Arc<dyn ChainApp>) -> Self {
        Self {
            app,
            timeout: DEFAULT_CHAIN_TIMEOUT,
        }
    }

    /// Override the timeout ceiling.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one invocation: translate the envelope, hand the chain a
    /// fresh responder, wait for the first resolution signal, and
    /// return the resolved record.
    pub async fn dispatch(&self, envelope: Envelope, ctx: InvocationContext) -> ResponseRecord {
        let request = ChainRequest::from_envelope(envelope);
        let (signals, mut resolutions) = mpsc::unbounded_channel();
        let responder = Responder::with_signal(signals.clone());
        let done = Done::with_signal(signals);

        let app = Arc::clone(&self.app);
        let chain_responder = responder.clone();
        let chain_done = done.clone();
        let request_id = ctx.request_id.clone();
        let chain = tokio::spawn(async move {
            // An Err return is the chain's "exception" path; route it
            // through the same resolution channel.
            if let Err(err) = app
                .handle(request, chain_responder, chain_done.clone(), &ctx)
                .await
            {
                chain_done.err(err);
            }
        });

        // The responder handle above keeps a sender alive for the whole
        // wait, so recv() cannot observe a closed channel here.
        let resolution = tokio::time::timeout(self.timeout, resolutions.recv()).await;

        let mut record = responder.snapshot();
        match resolution {
            Ok(Some(Signal::Terminal)) => {
                debug!("Chain finalized the response [{}]", request_id);
            }
            Ok(Some(Signal::Completed(None))) | Ok(None) => {
                debug!(
                    "Chain completed without a finalizing write [{}]",
                    request_id
                );
            }
            Ok(Some(Signal::Completed(Some(err)))) => {
                error!("Chain signalled an error: {} [{}]", err, request_id);
                record.force_error(StatusCode::INTERNAL_SERVER_ERROR, &err.message);
            }
            Err(_) => {
                warn!(
                    "Chain did not resolve within {:?} [{}]",
                    self.timeout, request_id
                );
                chain.abort();
                record.force_timeout();
            }
        }
        record
    }
}
