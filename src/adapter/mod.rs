//! Response adaptation: the recorder handed to the chain, the
//! first-wins coordinator, and the commit stage.

mod commit;
mod dispatch;
mod responder;

pub use commit::{commit, into_result, InvocationResult, ResponseChannel};
pub use dispatch::{Dispatcher, DEFAULT_CHAIN_TIMEOUT};
pub use responder::{Payload, Responder};
