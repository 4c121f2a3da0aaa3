// build.rs

fn main() {
    // Generate build info (VERGEN_BUILD_TIMESTAMP, VERGEN_BUILD_DATE)
    vergen::EmitBuilder::builder()
        .all_build()
        .emit()
        .expect("Unable to generate build info");
}
