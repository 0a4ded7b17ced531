mod builder;
mod compiled;
mod error;
mod spec;

pub use builder::PomdpBuilder;
pub use compiled::{CompiledPomdp, StateKey};
pub use error::PomdpError;
pub use spec::{ActionSpec, OutcomeSpec, PomdpSpec, StartSpec, StateSpec};
