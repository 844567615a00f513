#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use traffic_block_core as core;
pub use traffic_block_k8s_api as k8s;

mod api;
mod args;
mod serve;

pub use self::{
    api::{Api, BlockBody},
    args::Args,
};
