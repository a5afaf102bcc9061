#![allow(dead_code)]
use passive::Model;

#[derive(Model)]
#[model(table = "tasks", cached = true)]
struct Task {
    #[pk]
    id: i64,
}

fn main() {}
