//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `board`  | `Show`, `Move`   |
//! | `config` | `Config`         |

pub mod board;
pub mod config;

use std::path::{Path, PathBuf};

use anyhow::Result;
use taskboard::board_config::BoardToml;

pub use board::{cmd_move, cmd_show};
pub use config::cmd_config;

/// `--config` if given, else the per-user default location.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => BoardToml::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory; pass --config")),
    }
}
