pub mod package;
pub mod report;
pub mod run;

pub use package::*;
pub use report::*;
pub use run::*;
