//! Command-line front end: statistics files, Monte Carlo charts, run
//! comparisons and confusion matrices.

mod commands;
mod options;

fn main() {
    if let Err(err) = commands::run(std::env::args().skip(1).collect()) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
