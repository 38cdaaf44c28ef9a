pub mod fieldtype;
pub mod filterquery;
pub mod package;
pub mod progress;
pub mod reason;
pub mod relation;
pub mod sortoption;
