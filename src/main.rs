fn main() {
    if let Err(err) = datadict::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
