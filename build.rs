use std::{env, fs, path::PathBuf};

use processor_config_compiler::generate_from_path;

fn main() {
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("missing CARGO_MANIFEST_DIR"));
    let config = manifest_dir.join("config").join("processors.toml");
    println!("cargo:rerun-if-changed={}", config.display());

    let generated = generate_from_path(&config).unwrap_or_else(|e| {
        panic!(
            "processor config compile failed for {}: {e}",
            config.display()
        )
    });

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("missing OUT_DIR"));
    let out_file = out_dir.join("processor_config.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", out_file.display()));
}
