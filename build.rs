//! Compiles `proto/groupcache.proto` into the `transport::proto` module.
//!
//! The generated code is included via `include!` in `src/transport/proto.rs`
//! rather than written into `src/`, so `cargo build` stays the single source
//! of truth for the wire types.

fn main() {
    prost_build::Config::new()
        .bytes(["."])
        .compile_protos(&["proto/groupcache.proto"], &["proto"])
        .expect("failed to compile groupcache.proto");
}
