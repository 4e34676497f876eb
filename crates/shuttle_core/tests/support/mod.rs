#![allow(dead_code)]

pub mod snapshots;
