pub mod balancer;
pub mod entities;
pub mod error;
pub mod journal;
pub mod registry;
