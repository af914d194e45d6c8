use super::*;

#[test]
fn name_width_respects_minimum() {
    let names = ["a.rs", "b.rs"];
    assert_eq!(max_name_width(names.iter().copied(), 20), 20);
}

#[test]
fn name_width_grows_with_longest() {
    let names = ["src/very/long/path/to/module.rs", "b.rs"];
    assert_eq!(
        max_name_width(names.iter().copied(), 4),
        "src/very/long/path/to/module.rs".len()
    );
}

#[test]
fn name_width_empty_iterator() {
    assert_eq!(max_name_width(std::iter::empty(), 10), 10);
}

#[test]
fn separator_repeats() {
    assert_eq!(separator(3), "\u{2500}\u{2500}\u{2500}");
    assert_eq!(separator(0), "");
}

#[test]
fn json_printing_does_not_fail() {
    #[derive(serde::Serialize)]
    struct Sample {
        value: usize,
    }
    print_json_stdout(&Sample { value: 42 }).unwrap();
}
