//! Testing utilities and harness for relist

pub mod executor;
pub mod rendered;
pub mod test_rule;

pub use executor::{ManualExecutor, SettleSignal};
pub use rendered::{RenderStats, RenderedList};
pub use test_rule::*;

pub mod prelude {
    pub use crate::executor::*;
    pub use crate::rendered::*;
    pub use crate::test_rule::*;
}
