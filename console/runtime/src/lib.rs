#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use gloo_console_core as core;
pub use gloo_console_k8s_api as k8s;
pub use gloo_console_k8s_index as index;

mod apply;
mod args;
mod catalog;
mod form;
mod output;

pub use self::{args::Args, catalog::KubeCatalog};
