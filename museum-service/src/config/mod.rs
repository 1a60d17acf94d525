//! Service configuration.

pub mod dependencies;
pub mod settings;

pub use dependencies::{EnricherDependencies, ParserDependencies};
pub use settings::Settings;
