//! # Preprocessing Constants
//!
//! Named dataset classes, default worker counts and dataset config locations
//! used when no configuration file overrides them.

/// Default number of workers per dataset in parallel mode
pub const DEFAULT_WORKER_COUNT: usize = 8;

/// Prefix for environment variable overrides (`MINI_BATCH__MODE=serial`)
pub const ENV_PREFIX: &str = "MINI_BATCH";

/// Separator between nested keys in environment overrides
pub const ENV_SEPARATOR: &str = "__";

/// Environment variable selecting the logging environment
pub const ENV_VAR: &str = "MINI_BATCH_ENV";

/// Environment variables handed to preprocessing commands
pub mod command_env {
    pub const MINI_BATCH_DIR: &str = "MINI_BATCH_DIR";
    pub const MINI_BATCH_DATASET: &str = "MINI_BATCH_DATASET";
}

/// Flag appended to a preprocessing command when it receives a partition
pub const INDICES_FLAG: &str = "--indices";

/// Flag used instead of [`INDICES_FLAG`] when the partition is passed as a
/// file holding one index per line
pub const INDICES_FILE_FLAG: &str = "--indices-file";

/// Longest comma-separated index list passed inline on the command line.
/// Linux rejects any single argument over 128 KiB.
pub const MAX_INLINE_INDICES_LEN: usize = 32 * 1024;

/// Named dataset classes in the order they are processed
pub mod datasets {
    /// Cars
    pub const CARS: &str = "cars";
    /// Pedestrians
    pub const PEDESTRIANS: &str = "pedestrians";
    /// Cyclists
    pub const CYCLISTS: &str = "cyclists";
    /// People (pedestrians + cyclists)
    pub const PEOPLE: &str = "people";
    /// Cars + pedestrians + cyclists
    pub const ALL: &str = "all";
    /// Cars + pedestrians
    pub const CARPED: &str = "carped";
    /// Pedestrians + cyclists as one joint class
    pub const PERSON: &str = "person";

    /// Menu of named datasets with their default config path and default enabled flag
    pub const MENU: &[(&str, &str, bool)] = &[
        (CARS, "configs/mb_preprocessing/cars/cars.config", false),
        (
            PEDESTRIANS,
            "configs/mb_preprocessing/pedestrians/pedestrians_max_density.config",
            false,
        ),
        (CYCLISTS, "configs/mb_preprocessing/cyclists.config", false),
        (
            PEOPLE,
            "configs/mb_preprocessing/people/people_max_min_density.config",
            false,
        ),
        (ALL, "configs/mb_preprocessing/all.config", true),
        (CARPED, "configs/mb_preprocessing/carped/carped.config", false),
        (PERSON, "configs/mb_preprocessing/person.config", false),
    ];

    /// Position of a dataset name in the menu, used to order processing
    pub fn menu_position(name: &str) -> Option<usize> {
        MENU.iter().position(|(menu_name, _, _)| *menu_name == name)
    }
}
