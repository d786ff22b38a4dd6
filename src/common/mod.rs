pub mod response;

pub use response::{ErrorEnvelope, Message};
