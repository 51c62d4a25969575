pub mod error;
pub mod logger;
pub mod twiml;

pub use error::ApiError;
pub use twiml::TwimlAck;
