use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    problemset::apps::run_clean_split(std::env::args().skip(1))
}
