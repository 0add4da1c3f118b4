#[tokio::main]
async fn main() {
    if let Err(err) = darshan_cli::main_entry().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
