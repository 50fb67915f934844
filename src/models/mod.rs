mod audit_log;
mod dispute;
mod merchant;
mod transaction;
mod webhook;

pub use audit_log::*;
pub use dispute::*;
pub use merchant::*;
pub use transaction::*;
pub use webhook::*;
