#![allow(dead_code)]

pub mod z80sim;
