fn main() {
    if let Err(err) = clustercheck::cli::run() {
        if !clustercheck::exit::is_silent(&err) {
            clustercheck::ui::eprintln_error(&err);
        }
        std::process::exit(clustercheck::exit::exit_code(&err));
    }
}
