use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protoc = protoc_bin_vendored::protoc_bin_path()?;
    let well_known = protoc_bin_vendored::include_path()?;

    // SAFETY: build scripts are single-threaded.
    unsafe {
        std::env::set_var("PROTOC", protoc);
    }

    println!("cargo:rerun-if-changed=proto");

    let protos = [PathBuf::from("proto/flagd/v1/features.proto")];
    let includes = [PathBuf::from("proto"), well_known];

    tonic_build::configure()
        .build_client(false)
        .build_server(true)
        .compile_protos(&protos, &includes)?;

    Ok(())
}
