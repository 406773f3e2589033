use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    problemset::apps::run_map_source(std::env::args().skip(1))
}
