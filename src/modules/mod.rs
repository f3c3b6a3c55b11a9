pub mod config;
pub mod cterm;
pub mod error;
pub mod format;
pub mod jumpdests;
pub mod kast;
pub mod kevm;
pub mod prelude;
pub mod pretty;
pub mod semantics;
