pub mod auth;
pub mod core;
pub mod curriculum;
pub mod demo;
pub mod guard;
pub mod launch;
pub mod lens;
pub mod portal;
