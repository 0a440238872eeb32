//! Model export and serialization module
//!
//! Fitted models are stored as JSON artifacts (portable, human-readable)
//! holding the coefficients together with the preprocessing state needed to
//! score new listings consistently.

mod artifact;

pub use artifact::{ArtifactMetrics, ModelArtifact, RawCoefficients, FORMAT_VERSION};
