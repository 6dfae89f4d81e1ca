fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Semver build metadata, e.g. 0.1.0+20261014
    let version = env!("CARGO_PKG_VERSION");
    let date = chrono::Utc::now().format("%Y%m%d");
    println!("cargo:rustc-env=BUILD_VERSION={version}+{date}");
}
