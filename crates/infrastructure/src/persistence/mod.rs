//! On-disk persistence.

mod token_file;

pub use token_file::FileTokenStore;
