//! Build script: compiles the jxrlib shim when the `jxrlib` feature is on.
//!
//! jxrlib itself is not built here. The system copy is located through
//! `JXRLIB_INCLUDE_DIR` (headers) and `JXRLIB_LIB_DIR` (libraries); set
//! `JXRLIB_STATIC` to link the static archives instead of shared objects.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=csrc/jxr_shim.c");
    println!("cargo:rerun-if-env-changed=JXRLIB_INCLUDE_DIR");
    println!("cargo:rerun-if-env-changed=JXRLIB_LIB_DIR");
    println!("cargo:rerun-if-env-changed=JXRLIB_STATIC");

    #[cfg(feature = "jxrlib")]
    build_shim();
}

#[cfg(feature = "jxrlib")]
fn build_shim() {
    use std::env;
    use std::path::PathBuf;

    let include = env::var_os("JXRLIB_INCLUDE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/usr/include/jxrlib"));

    let mut builder = cc::Build::new();
    builder
        .file("csrc/jxr_shim.c")
        .include(&include)
        .define("__ANSI__", None)
        .define("DISABLE_PERF_MEASUREMENT", None)
        // jxrlib headers are noisy under modern compilers
        .flag_if_supported("-Wno-unused-parameter")
        .flag_if_supported("-Wno-unknown-pragmas")
        .flag_if_supported("-Wno-missing-field-initializers")
        .flag_if_supported("-Wno-comment")
        .opt_level(2);

    if env::var("TARGET").map(|t| t == "wasm32-unknown-emscripten").unwrap_or(false) {
        builder.flag("-sDISABLE_EXCEPTION_CATCHING=1");
    }

    builder.compile("jxr_shim");

    if let Some(dir) = env::var_os("JXRLIB_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", PathBuf::from(dir).display());
    }
    let kind = if env::var_os("JXRLIB_STATIC").is_some() {
        "static"
    } else {
        "dylib"
    };
    // Glue first: it depends on the core codec.
    println!("cargo:rustc-link-lib={kind}=jxrglue");
    println!("cargo:rustc-link-lib={kind}=jpegxr");
}
