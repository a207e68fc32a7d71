pub mod exec;
pub mod log;
pub mod minify;
pub mod token;
