//! Example: Pulling values from the lazy Fibonacci sequence

use strand::sequence::Fibonacci;

fn main() {
    for value in Fibonacci::new().take_while(|&v| v <= 10) {
        print!("{value} ");
    }
    println!();

    println!("last u64 value: {:?}", Fibonacci::new().last());
}
