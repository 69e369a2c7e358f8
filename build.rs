fn main() {
    println!("cargo:rerun-if-changed=proto/gnmi.proto");
    prost_build::compile_protos(&["proto/gnmi.proto"], &["proto/"])
        .expect("failed to compile gnmi.proto");
}
