fn main() {
    if let Err(err) = annota::run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
