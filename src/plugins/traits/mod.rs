pub mod notifier;
pub mod source;

pub use notifier::Notifier;
pub use source::SourceAdapter;
