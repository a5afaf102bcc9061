#![allow(dead_code)]
use passive::Model;

#[derive(Model)]
struct Task {
    #[column]
    name: String,
}

fn main() {}
