fn main() {
    if let Err(err) = pop_pyramid::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
