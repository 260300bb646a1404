#![allow(dead_code)]

pub mod fake_tools;
pub mod fixtures;
