#[tokio::main]
async fn main() {
    if let Err(err) = dated_object_store::run().await {
        eprintln!("objctl: {err}");
        std::process::exit(1);
    }
}
