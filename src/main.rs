fn main() {
    if let Err(err) = plan_viz::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
