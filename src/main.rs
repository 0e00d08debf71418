use article_shorts::pipeline::run_generation;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run_generation().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            tracing::error!("{:#}", anyhow::Error::from(err));
            ExitCode::from(code)
        }
    }
}
