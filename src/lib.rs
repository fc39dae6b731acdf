pub mod apply;
pub mod config;
pub mod diff;
pub mod error;
pub mod parse;
pub mod rebuild;
pub mod report;
pub mod rules;
pub mod scan;
pub mod synth;
pub mod verify;

pub use config::Config;
pub use error::{Result, TwingenError};
pub use parse::SourceTree;
pub use rebuild::rebuild;
pub use rules::RewriteRules;
pub use scan::{scan, ClassScan, MethodRecord};
pub use synth::Synthesizer;
pub use verify::{verify, Verification};
