#[tokio::main]
async fn main() -> std::io::Result<()> {
    account_server::run_with_config().await
}
