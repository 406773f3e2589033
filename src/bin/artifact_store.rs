use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    problemset::apps::run_artifact_store(std::env::args().skip(1))
}
