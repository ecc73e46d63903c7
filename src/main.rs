#[cfg(feature = "server")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    yoga_track::server::run().await
}
