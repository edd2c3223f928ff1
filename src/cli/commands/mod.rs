pub mod migrate;
pub mod secret;
pub mod serve;
