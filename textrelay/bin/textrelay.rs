#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let textrelay = textrelay::controller::Textrelay::load()?;

    textrelay.run().await
}
