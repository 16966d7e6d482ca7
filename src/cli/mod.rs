//! Command implementations behind the `hys` binary. Each `run_*` takes a
//! plain config struct so the commands can be driven without clap.

pub mod compare;
pub mod download;
pub mod fetch;
pub mod organize;

pub use compare::{run_compare, CompareCommandConfig};
pub use download::{run_download, DownloadCommandConfig};
pub use fetch::{run_fetch, FetchCommandConfig};
pub use organize::{run_organize, OrganizeCommandConfig, OrganizeStrategy};

use hys_client::HysConfig;

/// Client settings from `HYS_*` env vars, with `--base-url` taking precedence.
pub fn client_config(base_url: Option<&str>) -> HysConfig {
    let cfg = HysConfig::from_env();
    match base_url {
        Some(base) => cfg.with_base_url(base),
        None => cfg,
    }
}
