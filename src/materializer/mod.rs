pub mod report;
pub mod writer;

pub use report::{list_output_files, BuildReport, SectionOutcome, SkipReason};
pub use writer::{materialize, MaterializeStrategy, Materializer};
