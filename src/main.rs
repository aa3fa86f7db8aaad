fn main() {
    if let Err(err) = case_tally::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
