pub mod assemble;
pub mod config;
pub mod error;
pub mod fragment;
pub mod identity;
pub mod normalize;
pub mod oracle;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod status;

pub use assemble::Assembler;
pub use config::SpiderConfig;
pub use error::{AssemblyError, FragmentError};
pub use fragment::{RawFragment, RawLink, RawLocation};
pub use oracle::{Check, Expectations, ValidationReport};
pub use pipeline::{ErrorPolicy, RunOutcome};
pub use schema::{Classification, Link, Location, Meeting, Status, Timestamp};
