#[tokio::main]
async fn main() -> anyhow::Result<()> {
    studyflow_backend::run().await
}
