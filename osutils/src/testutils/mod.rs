pub mod executor;

pub use executor::MockExecutor;
