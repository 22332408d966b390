/// Requirement model and normalization
mod course;
mod normalize;
mod types;

pub use course::*;
pub use normalize::{choose_count, classify, dept_prefix, normalize, parse_label};
pub use types::*;
