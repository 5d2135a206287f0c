use strand::sequence::Fibonacci;

#[test]
fn fibonacci_starts_with_zero_and_one() {
    let first: Vec<u64> = Fibonacci::new().take(10).collect();

    assert_eq!(first, vec![0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
}

#[test]
fn fibonacci_ends_at_the_last_u64_value() {
    let mut sequence = Fibonacci::default();

    assert_eq!(sequence.by_ref().count(), 94);
    assert_eq!(sequence.next(), None);
    assert_eq!(Fibonacci::new().last(), Some(12_200_160_415_121_876_738));
}

#[strand::test]
fn fibonacci_values_can_be_computed_on_the_pool() {
    let task = executor.spawn(|| Fibonacci::new().nth(50));

    assert_eq!(task.wait().unwrap(), Some(12_586_269_025));
}
