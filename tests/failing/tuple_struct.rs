#![allow(dead_code)]
use passive::Model;

#[derive(Model)]
struct Task(#[pk] i64);

fn main() {}
