pub mod stage;

pub use stage::{AsAny, Stage, Successor};
