pub mod json;
pub mod logging;
pub mod retry;
