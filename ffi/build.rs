use std::path::PathBuf;

/// Set to a directory to also copy the generated header there.
const HEADER_DIR_ENV: &str = "USERLIST_FFI_HEADER_DIR";
const HEADER_NAME: &str = "userlist.h";

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=cbindgen.toml");
    println!("cargo:rerun-if-env-changed={HEADER_DIR_ENV}");

    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let Some(out_dir) = std::env::var_os("OUT_DIR").map(PathBuf::from) else {
        println!("cargo:warning=OUT_DIR not set, header not generated");
        return;
    };

    let config = match cbindgen::Config::from_file(crate_dir.join("cbindgen.toml")) {
        Ok(config) => config,
        Err(err) => {
            println!("cargo:warning=cbindgen config unreadable, header not generated: {err}");
            return;
        }
    };

    let bindings = match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => bindings,
        Err(err) => {
            println!("cargo:warning=cbindgen failed, header not generated: {err}");
            return;
        }
    };

    bindings.write_to_file(out_dir.join(HEADER_NAME));
    if let Some(dir) = std::env::var_os(HEADER_DIR_ENV) {
        bindings.write_to_file(PathBuf::from(dir).join(HEADER_NAME));
    }
}
