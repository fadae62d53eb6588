// src/main.rs

use tfengine::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("tfengine error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    let settings = logging::LogSettings::from_env(args.log_level);
    logging::init_logging(&settings)?;
    run(args).await
}
