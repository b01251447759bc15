use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = annex_worker::Args::parse();

	annex_worker::run(args).await
}
