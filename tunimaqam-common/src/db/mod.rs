//! Database access: schema, corpus queries and seeding

pub mod init;
pub mod maqam;
pub mod seed;
pub mod settings;

pub use init::*;
pub use maqam::*;
pub use seed::*;
pub use settings::*;
