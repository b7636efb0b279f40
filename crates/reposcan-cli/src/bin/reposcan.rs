fn main() {
    if let Err(err) = reposcan_cli::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
