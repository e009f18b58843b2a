//! Status fan-out
//!
//! Encodes camera status updates as newline-delimited JSON and pushes them to
//! every viewer in the registry. Delivery is best effort: a viewer that cannot
//! keep up is dropped rather than retried.

pub mod fanout;
pub mod frame;

pub use fanout::{Broadcaster, DEFAULT_WRITE_TIMEOUT};
pub use frame::{StatusPayload, FRAME_DELIMITER};
