fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Vendored protoc; no system install required.
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    println!("cargo:rerun-if-changed=proto/message_service.proto");
    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/message_service.proto"], &["proto"])?;
    Ok(())
}
