pub mod notifiers;
pub mod sources;
pub mod traits;

pub use notifiers::{EmailNotifier, LogNotifier};
pub use sources::{build_sources, HttpJsonSource, RetryingSource};
pub use traits::{Notifier, SourceAdapter};
