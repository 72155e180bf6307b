#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    aircon_console::host::run().await
}
