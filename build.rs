use anyhow::Result;
use vergen::EmitBuilder;

// GIT_REV and GIT_BRANCH in lib.rs are only set when building from a
// git checkout; tarball builds simply log the version number
fn main() -> Result<()> {
    let emitted = EmitBuilder::builder()
        .git_branch()
        .git_sha(true)
        .fail_on_error()
        .quiet()
        .emit();
    if emitted.is_err() {
        println!("cargo:warning=no git revision information available");
    }
    Ok(())
}
