use autolease_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("autolease: {err}");
        std::process::exit(1);
    }
}
