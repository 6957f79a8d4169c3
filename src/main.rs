#[tokio::main]
async fn main() {
    if let Err(e) = lca::run().await {
        eprintln!("fatal: {}", e);
        std::process::exit(1);
    }
}
