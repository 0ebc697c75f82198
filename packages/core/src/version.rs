//! Version information for labhost

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Version plus build metadata when the build sets it
///
/// CI exports `LABHOST_GIT_HASH` and `LABHOST_BUILD_DATE`; local builds
/// show `unknown`.
pub fn get_version_long() -> String {
    let git_hash = option_env!("LABHOST_GIT_HASH").unwrap_or("unknown");
    let build_date = option_env!("LABHOST_BUILD_DATE").unwrap_or("unknown");
    format!("{} (git: {git_hash}, built: {build_date})", get_version())
}
