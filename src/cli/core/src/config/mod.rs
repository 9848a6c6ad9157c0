/* src/cli/core/src/config/mod.rs */

mod loader;
mod types;


pub use loader::{find_rola_config, load_rola_config, read_package_identity};
pub use types::{PresetSpec, RolaConfig};
