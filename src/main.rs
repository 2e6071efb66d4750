#[tokio::main]
async fn main() -> anyhow::Result<()> {
    focuscycle_lib::cli::run().await
}
