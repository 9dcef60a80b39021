pub mod app;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod info;
pub mod inspect;
pub mod output;
pub mod redact;
pub mod runtime;
pub mod variables;

pub use app::run;
