use miette::Result;

pub fn exec() -> Result<()> {
    println!("dcm {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
