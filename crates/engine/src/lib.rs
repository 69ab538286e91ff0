mod document_engine;
mod sequence;

pub use document_engine::{DocumentEngine, DocumentKind, ViewId};
pub use sequence::{EngineError, EngineSequence, Pending, ViewAccess};

#[cfg(test)]
mod tests;
