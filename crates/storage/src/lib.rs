//! Storage - persisting successful passwords

mod success_log;

pub use success_log::SuccessLog;
