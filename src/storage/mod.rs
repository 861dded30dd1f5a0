mod balance_file;

pub use balance_file::*;
