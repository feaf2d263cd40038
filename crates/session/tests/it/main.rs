mod lifecycle;
mod proposals;

fn main() {}
