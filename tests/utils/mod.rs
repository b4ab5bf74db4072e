#![allow(dead_code)]

pub mod factories;
pub mod fake_advisor;
pub mod fake_generator;
pub mod helpers;
