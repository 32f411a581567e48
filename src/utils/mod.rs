pub mod error;

pub use error::{AdapterError, AppError, CycleError, NotifierError, StoreError};
