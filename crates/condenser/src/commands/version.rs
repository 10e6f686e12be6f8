pub fn run() -> anyhow::Result<()> {
    println!("condenser {}", env!("CARGO_PKG_VERSION"));
    println!("Asynchronous context compression for chat hosts");
    Ok(())
}
