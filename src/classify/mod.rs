mod adapter;
mod backend;
mod backends;
mod classes;
mod result;

pub use adapter::ClassifierAdapter;
pub use backend::ClassifierBackend;
pub use backends::StubClassifier;
#[cfg(feature = "backend-tract")]
pub use backends::TractClassifier;
pub use classes::{ClassSet, UNKNOWN_LABEL};
pub use result::ClassificationResult;
