pub mod commands;
pub mod render;

use super::{Module, ModuleDefinition};

pub fn module() -> Module {
    Module {
        definition: ModuleDefinition {
            id: "pit",
            name_key: "module-pit-name",
            description_key: "module-pit-description",
        },
        commands: commands::commands(),
    }
}
