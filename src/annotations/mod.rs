pub mod arrow;
pub mod generators;

pub use arrow::{ArrowColor, StyledArrow};
pub use generators::{attackers_and_defenders, pin_annotation, threatened_targets};
