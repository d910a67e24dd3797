fn main() {
    use build_script_cfg::Cfg;
    use std::{env::var_os, path::Path};

    println!("cargo:rerun-if-env-changed=IREE_RUNTIME_LIB");

    let iree = Cfg::new("use_iree");
    let detected = Cfg::new("detected_iree");
    if cfg!(feature = "iree-runtime") {
        iree.define();
        if var_os("IREE_RUNTIME_LIB").is_some_and(|path| Path::new(&path).is_file()) {
            detected.define();
        }
    }
}
