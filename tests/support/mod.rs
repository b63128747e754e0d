#![allow(dead_code)]

pub mod mcstat_env;
pub mod runs;
