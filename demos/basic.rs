//! cargo run --example basic
use linrex::Regex;

fn main() {
    let re = Regex::new(r"(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})").unwrap();
    let haystack = "shipped on 2024-03-07, received on 2024-03-12";

    for caps in re.captures_iter(haystack) {
        let whole = caps.get(0).unwrap();
        println!(
            "{} -> year={} month={} day={}",
            whole.as_str(haystack),
            caps.name("year").unwrap().as_str(haystack),
            caps.name("month").unwrap().as_str(haystack),
            caps.name("day").unwrap().as_str(haystack),
        );
    }

    let redos = Regex::new(r"(a+)+b").unwrap();
    let haystack = "a".repeat(50_000);
    println!(
        "(a+)+b against 50,000 a's with no trailing b: matched={}",
        redos.is_match(&haystack)
    );
}
