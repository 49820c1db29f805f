// src/main.rs

use pyxregen::{cli, logging, run};

fn main() {
    if let Err(err) = run_main() {
        eprintln!("pyxregen error: {err:#}");
        std::process::exit(1);
    }
}

fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging()?;
    run(args)?;
    Ok(())
}
