/// Display version information
pub fn execute() {
    println!("safeclub {}", env!("CARGO_PKG_VERSION"));
    println!("Membership-gated treasury governance");
}
