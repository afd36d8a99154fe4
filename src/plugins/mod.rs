//! Built-in artifact plugins.
//!
//! Every plugin module exports `pub fn artifacts() -> Vec<ArtifactSpec>`
//! and nothing else is required of it. The module table below is the
//! registration contract: what it names is exactly what the registry
//! loads, and a new plugin ships by adding its module here.

pub mod bing;
pub mod chatgpt;
pub mod discord;
pub mod dropbox;
pub mod duckduckgo;
pub mod google;
mod helpers;
pub mod storage_dump;

use crate::registry::PluginModule;

/// Registration table for every plugin compiled into this build.
pub fn builtin_modules() -> Vec<PluginModule> {
    vec![
        PluginModule {
            path: "plugins/bing.rs",
            artifacts: bing::artifacts,
        },
        PluginModule {
            path: "plugins/chatgpt.rs",
            artifacts: chatgpt::artifacts,
        },
        PluginModule {
            path: "plugins/discord.rs",
            artifacts: discord::artifacts,
        },
        PluginModule {
            path: "plugins/dropbox.rs",
            artifacts: dropbox::artifacts,
        },
        PluginModule {
            path: "plugins/duckduckgo.rs",
            artifacts: duckduckgo::artifacts,
        },
        PluginModule {
            path: "plugins/google.rs",
            artifacts: google::artifacts,
        },
        PluginModule {
            path: "plugins/storage_dump.rs",
            artifacts: storage_dump::artifacts,
        },
    ]
}
