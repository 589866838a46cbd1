use sleowl_lib::error::AppError;

#[tokio::main]
async fn main() {
  match sleowl_lib::run().await {
    Ok(()) => {}
    // clap prints help/version to stdout and usage errors to stderr
    Err(AppError::Usage(err)) => err.exit(),
    Err(err) => {
      eprintln!("application error: {err}");
      std::process::exit(1);
    }
  }
}
