mod engine;
mod kind;
mod verdict;

pub use engine::{DecisionEngine, MetricCmp};
pub use kind::DetectionKind;
pub use verdict::{Verdict, VerdictLabel};
