#[tokio::main]
async fn main() {
    if let Err(e) = ghosttag::cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
