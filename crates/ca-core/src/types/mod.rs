mod certificate;
mod client;
mod common;
mod user;

pub use certificate::*;
pub use client::*;
pub use common::*;
pub use user::*;
