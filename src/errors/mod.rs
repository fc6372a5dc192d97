pub mod types;

pub use types::GradeError;
