#![allow(dead_code)]
use passive::Model;

#[derive(Model)]
struct Task {
    #[pk]
    id: i64,
    #[column(foo)]
    name: String,
}

fn main() {}
