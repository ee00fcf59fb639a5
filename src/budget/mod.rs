mod error;
mod lock;
mod window;

pub use window::CallBudgetManager;
