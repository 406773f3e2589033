use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    problemset::apps::run_union_corpus(std::env::args().skip(1))
}
